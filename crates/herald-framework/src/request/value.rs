//! Parsed argument values and their conversion into request fields.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use herald_core::{ChannelId, EmojiId, RoleId, UserId};

use super::binder::BindError;
use super::schema::{ParamType, Schema, SchemaError};

/// A custom emoji reference such as `<:party:1234>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomEmoji {
    pub id: EmojiId,
    pub name: String,
    pub animated: bool,
}

/// An opaque value produced by a user-supplied parser.
#[derive(Clone)]
pub struct CustomValue(Arc<dyn Any + Send + Sync>);

impl CustomValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValue(..)")
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A value produced by a parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Short(i16),
    Float(f32),
    Double(f64),
    Bool(bool),
    Text(String),
    /// Canonical variant name.
    Enum(&'static str),
    User(UserId),
    Role(RoleId),
    Channel(ChannelId),
    Emoji(CustomEmoji),
    Custom(CustomValue),
}

// =============================================================================
// Field Conversion
// =============================================================================

/// Types that can be the field type of a request parameter.
pub trait FromParam: Sized {
    /// The tag the parser chain dispatches on.
    const TYPE: ParamType;

    /// Extracts the field value, `None` on a type mismatch.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_from_param {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl FromParam for $ty {
                const TYPE: ParamType = ParamType::$tag;

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$tag(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_param! {
    i32 => Int,
    i64 => Long,
    i16 => Short,
    f32 => Float,
    f64 => Double,
    bool => Bool,
    String => Text,
    UserId => User,
    RoleId => Role,
    ChannelId => Channel,
    CustomEmoji => Emoji,
}

/// Enumerations selectable by case-insensitive variant name.
///
/// Usually derived with `#[derive(ParamEnum)]`.
pub trait ParamEnum: Sized + 'static {
    /// Type name shown in parse errors.
    const NAME: &'static str;
    /// Canonical variant names.
    const VARIANTS: &'static [&'static str];

    /// Maps a canonical variant name back to the value.
    fn from_variant(name: &str) -> Option<Self>;

    /// Canonical name of this value.
    fn variant_name(&self) -> &'static str;
}

impl<T: ParamEnum> FromParam for T {
    const TYPE: ParamType = ParamType::Enum {
        name: T::NAME,
        variants: T::VARIANTS,
    };

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Enum(name) => T::from_variant(name),
            _ => None,
        }
    }
}

// =============================================================================
// Bound Arguments
// =============================================================================

/// The values bound for one request, indexed by ordinal.
#[derive(Debug, Clone)]
pub struct BoundArgs {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
}

impl BoundArgs {
    pub(crate) fn new(schema: Arc<Schema>, values: Vec<Option<Value>>) -> Self {
        Self { schema, values }
    }

    /// The raw value at `ordinal`, if any was bound.
    pub fn get(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal).and_then(Option::as_ref)
    }

    /// Takes a required value.
    pub fn take<T: FromParam>(&mut self, ordinal: usize) -> Result<T, BindError> {
        match self.take_optional(ordinal)? {
            Some(v) => Ok(v),
            None => {
                let param = self.schema.params().get(ordinal);
                Err(BindError::missing(
                    param.map_or("?", |p| p.name()),
                    param.map_or("", |p| p.describe()),
                ))
            }
        }
    }

    /// Takes an optional value.
    pub fn take_optional<T: FromParam>(&mut self, ordinal: usize) -> Result<Option<T>, BindError> {
        let Some(value) = self.values.get_mut(ordinal).and_then(Option::take) else {
            return Ok(None);
        };
        T::from_value(value).map(Some).ok_or_else(|| {
            let name = self
                .schema
                .params()
                .get(ordinal)
                .map_or_else(|| ordinal.to_string(), |p| p.name().to_string());
            SchemaError::TypeMismatch {
                name,
                expected: T::TYPE.describe(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ParamDescriptor;

    #[derive(Debug, PartialEq)]
    enum Mode {
        Allow,
        Deny,
    }

    impl ParamEnum for Mode {
        const NAME: &'static str = "Mode";
        const VARIANTS: &'static [&'static str] = &["ALLOW", "DENY"];

        fn from_variant(name: &str) -> Option<Self> {
            match name {
                "ALLOW" => Some(Self::Allow),
                "DENY" => Some(Self::Deny),
                _ => None,
            }
        }

        fn variant_name(&self) -> &'static str {
            match self {
                Self::Allow => "ALLOW",
                Self::Deny => "DENY",
            }
        }
    }

    fn args(values: Vec<Option<Value>>) -> BoundArgs {
        let schema = Schema::new(vec![
            ParamDescriptor::new("n", 0, ParamType::Int),
            ParamDescriptor::new("mode", 1, Mode::TYPE).nullable(),
        ])
        .unwrap();
        BoundArgs::new(Arc::new(schema), values)
    }

    #[test]
    fn test_take_converts_values() {
        let mut bound = args(vec![Some(Value::Int(3)), Some(Value::Enum("DENY"))]);
        assert_eq!(bound.take::<i32>(0).unwrap(), 3);
        assert_eq!(bound.take_optional::<Mode>(1).unwrap(), Some(Mode::Deny));
        assert_eq!(bound.take_optional::<Mode>(1).unwrap(), None);
    }

    #[test]
    fn test_take_reports_mismatch() {
        let mut bound = args(vec![Some(Value::Text("x".into())), None]);
        assert!(matches!(
            bound.take::<i32>(0),
            Err(BindError::Schema(SchemaError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_take_missing_required() {
        let mut bound = args(vec![None, None]);
        assert!(matches!(
            bound.take::<i32>(0),
            Err(BindError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_custom_value_downcast() {
        let value = CustomValue::new(42u8);
        assert_eq!(value.downcast_ref::<u8>(), Some(&42));
        assert!(value.downcast_ref::<u16>().is_none());
        assert_eq!(value.clone(), value);
    }
}
