//! Binding argument text to a request.
//!
//! Parameters are filled left to right in ordinal order. Binding stops as soon
//! as the input runs out; any required parameter left empty at that point is
//! reported as missing. Text left over after the last parameter is ignored.

use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use super::Request;
use super::parser::{ParseContext, ParseError, ParserChain};
use super::schema::{Schema, SchemaCache, SchemaError};
use super::value::{BoundArgs, Value};

/// Errors raised while binding arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A parser rejected the input.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A required parameter was not supplied.
    #[error("{message}")]
    MissingArgument {
        /// Name of the parameter.
        name: String,
        /// Text shown to the user.
        message: String,
    },

    /// The request type itself is defective.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl BindError {
    /// Creates a missing-argument error with an optional description.
    pub fn missing(name: impl Into<String>, description: &str) -> Self {
        let name = name.into();
        let message = if description.is_empty() {
            format!("Missing argument `{name}`.")
        } else {
            format!("Missing argument `{name}`: {description}")
        };
        Self::MissingArgument { name, message }
    }
}

/// Binds argument text using a parser chain and a schema cache.
#[derive(Default)]
pub struct RequestBinder {
    chain: ParserChain,
    cache: SchemaCache,
}

impl RequestBinder {
    pub fn new(chain: ParserChain) -> Self {
        Self {
            chain,
            cache: SchemaCache::new(),
        }
    }

    /// The parser chain in use.
    pub fn chain(&self) -> &ParserChain {
        &self.chain
    }

    /// The cached schema of `R`.
    pub fn schema<R: Request>(&self) -> Result<Arc<Schema>, SchemaError> {
        self.cache.get::<R>()
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Binds `args` against `schema` without constructing a request.
    pub fn bind_args(
        &self,
        schema: &Arc<Schema>,
        args: &str,
        ctx: &ParseContext<'_>,
    ) -> Result<BoundArgs, BindError> {
        let mut values: Vec<Option<Value>> = vec![None; schema.len()];
        let mut rest = args.trim();

        for param in schema.params() {
            if rest.is_empty() {
                break;
            }
            if param.captures_remaining() {
                values[param.ordinal()] = Some(Value::Text(rest.to_string()));
                rest = "";
                break;
            }
            let parsed = self.chain.parse(rest, &param.ty(), ctx)?;
            trace!(param = param.name(), value = ?parsed.value, "Bound parameter");
            values[param.ordinal()] = Some(parsed.value);
            rest = parsed.remaining.trim_start();
        }

        if let Some(param) = schema
            .params()
            .iter()
            .find(|p| !p.is_nullable() && values[p.ordinal()].is_none())
        {
            return Err(BindError::missing(param.name(), param.describe()));
        }

        if !rest.is_empty() {
            trace!(leftover = rest, "Ignoring trailing arguments");
        }
        Ok(BoundArgs::new(Arc::clone(schema), values))
    }

    /// Binds `args` and builds the request.
    pub fn bind<R: Request>(&self, args: &str, ctx: &ParseContext<'_>) -> Result<R, BindError> {
        let schema = self.schema::<R>()?;
        let bound = self.bind_args(&schema, args, ctx)?;
        R::from_args(bound)
    }
}
