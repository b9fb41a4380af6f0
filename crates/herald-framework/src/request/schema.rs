//! Parameter schemas.
//!
//! A [`Schema`] is the validated, ordinal-sorted list of [`ParamDescriptor`]s
//! for one request type. Validation happens once per type and the result is
//! memoized in a [`SchemaCache`].

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::trace;

use super::Request;

// =============================================================================
// Parameter Types
// =============================================================================

/// The type tag a parser dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 16-bit signed integer.
    Short,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// `true` or `false`.
    Bool,
    /// Free text: a quoted string or a single word.
    Text,
    /// One of a fixed set of names, matched case-insensitively.
    Enum {
        /// Type name shown in errors.
        name: &'static str,
        /// Canonical variant names.
        variants: &'static [&'static str],
    },
    /// A user mention.
    User,
    /// A role mention, or `@everyone`.
    Role,
    /// A channel mention.
    Channel,
    /// A custom emoji.
    Emoji,
    /// A type handled by a user-supplied parser.
    Custom(&'static str),
}

impl ParamType {
    /// Whether a parameter of this type may capture the remaining text.
    pub fn accepts_arbitrary_text(&self) -> bool {
        matches!(self, Self::Text)
    }

    /// Name with an indefinite article, used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Int => "an integer".into(),
            Self::Long => "a long".into(),
            Self::Short => "a short".into(),
            Self::Float => "a float".into(),
            Self::Double => "a double".into(),
            Self::Bool => "a boolean".into(),
            Self::Text => "a string".into(),
            Self::Enum { name, .. } => format!("an enum {name}"),
            Self::User => "a user mention".into(),
            Self::Role => "a role mention".into(),
            Self::Channel => "a channel mention".into(),
            Self::Emoji => "a custom emoji".into(),
            Self::Custom(name) => format!("a(n) {name}"),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum { name, .. } | Self::Custom(name) => f.write_str(name),
            other => write!(f, "{other:?}"),
        }
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// Metadata describing one positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    name: String,
    ordinal: usize,
    ty: ParamType,
    nullable: bool,
    capture_remaining: bool,
    description: String,
}

impl ParamDescriptor {
    /// Creates a required parameter.
    pub fn new(name: impl Into<String>, ordinal: usize, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ordinal,
            ty,
            nullable: false,
            capture_remaining: false,
            description: String::new(),
        }
    }

    /// Marks the parameter optional.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Makes the parameter take all remaining text verbatim.
    pub fn capture_remaining(mut self) -> Self {
        self.capture_remaining = true;
        self
    }

    /// Sets the human description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn ty(&self) -> ParamType {
        self.ty
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn captures_remaining(&self) -> bool {
        self.capture_remaining
    }

    pub fn describe(&self) -> &str {
        &self.description
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Schema defects, detected when a request type is first registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two parameters share an ordinal.
    #[error("parameters `{first}` and `{second}` share ordinal {ordinal}")]
    DuplicateOrdinal {
        ordinal: usize,
        first: String,
        second: String,
    },

    /// Ordinals do not form `0..n`.
    #[error("parameter ordinals must be contiguous from 0, but {0} is missing")]
    MissingOrdinal(usize),

    /// Only the last parameter may capture the remaining text.
    #[error("parameter `{0}` captures the remaining text but is not the last parameter")]
    CaptureNotLast(String),

    /// Only text parameters may capture the remaining text.
    #[error("parameter `{name}` captures the remaining text but has type {ty}")]
    CaptureNotText { name: String, ty: String },

    /// A bound value did not convert to the field type.
    #[error("parameter `{name}` could not be converted to {expected}")]
    TypeMismatch { name: String, expected: String },
}

/// A validated, ordinal-ordered parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    params: Vec<ParamDescriptor>,
}

impl Schema {
    /// Validates and orders `params`.
    pub fn new(mut params: Vec<ParamDescriptor>) -> Result<Self, SchemaError> {
        params.sort_by_key(ParamDescriptor::ordinal);

        for pair in params.windows(2) {
            if pair[0].ordinal == pair[1].ordinal {
                return Err(SchemaError::DuplicateOrdinal {
                    ordinal: pair[0].ordinal,
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }
        for (expected, param) in params.iter().enumerate() {
            if param.ordinal != expected {
                return Err(SchemaError::MissingOrdinal(expected));
            }
        }

        let last = params.len().saturating_sub(1);
        for (i, param) in params.iter().enumerate() {
            if !param.capture_remaining {
                continue;
            }
            if i != last {
                return Err(SchemaError::CaptureNotLast(param.name.clone()));
            }
            if !param.ty.accepts_arbitrary_text() {
                return Err(SchemaError::CaptureNotText {
                    name: param.name.clone(),
                    ty: param.ty.to_string(),
                });
            }
        }

        Ok(Self { params })
    }

    /// Parameters in ordinal order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Memoized schemas keyed by request type.
///
/// Concurrent first lookups may both compute the schema; the results are
/// identical, so whichever insert lands last is kept.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the validated schema of `R`, computing it on first use.
    pub fn get<R: Request>(&self) -> Result<Arc<Schema>, SchemaError> {
        let key = TypeId::of::<R>();
        if let Some(schema) = self.schemas.read().get(&key) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(Schema::new(R::params())?);
        trace!(request = std::any::type_name::<R>(), params = schema.len(), "Schema cached");
        self.schemas.write().insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{BindError, BoundArgs};

    fn text(name: &str, ordinal: usize) -> ParamDescriptor {
        ParamDescriptor::new(name, ordinal, ParamType::Text)
    }

    #[test]
    fn test_schema_sorts_by_ordinal() {
        let schema = Schema::new(vec![text("b", 1), text("a", 0)]).unwrap();
        let names: Vec<&str> = schema.params().iter().map(ParamDescriptor::name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_schema_rejects_bad_ordinals() {
        assert!(matches!(
            Schema::new(vec![text("a", 0), text("b", 0)]),
            Err(SchemaError::DuplicateOrdinal { ordinal: 0, .. })
        ));
        assert_eq!(
            Schema::new(vec![text("a", 0), text("b", 2)]),
            Err(SchemaError::MissingOrdinal(1))
        );
        assert_eq!(Schema::new(vec![text("a", 1)]), Err(SchemaError::MissingOrdinal(0)));
    }

    #[test]
    fn test_capture_remaining_must_be_last() {
        let result = Schema::new(vec![text("a", 0).capture_remaining(), text("b", 1)]);
        assert_eq!(result, Err(SchemaError::CaptureNotLast("a".into())));
    }

    #[test]
    fn test_capture_remaining_must_be_text() {
        let result = Schema::new(vec![
            text("a", 0),
            ParamDescriptor::new("n", 1, ParamType::Int).capture_remaining(),
        ]);
        assert!(matches!(result, Err(SchemaError::CaptureNotText { .. })));

        assert!(Schema::new(vec![text("a", 0), text("rest", 1).capture_remaining()]).is_ok());
    }

    struct Broken;

    impl Request for Broken {
        fn params() -> Vec<ParamDescriptor> {
            vec![text("x", 0).capture_remaining(), text("y", 1)]
        }

        fn from_args(_args: BoundArgs) -> Result<Self, BindError> {
            Ok(Self)
        }
    }

    struct Fine;

    impl Request for Fine {
        fn params() -> Vec<ParamDescriptor> {
            vec![text("x", 0)]
        }

        fn from_args(_args: BoundArgs) -> Result<Self, BindError> {
            Ok(Self)
        }
    }

    #[test]
    fn test_cache_memoizes_valid_schemas_only() {
        let cache = SchemaCache::new();
        assert!(cache.get::<Broken>().is_err());
        assert!(cache.is_empty());

        let first = cache.get::<Fine>().unwrap();
        let second = cache.get::<Fine>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
