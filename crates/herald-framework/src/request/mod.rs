//! Typed command arguments.
//!
//! A [`Request`] is a plain struct whose fields are positional parameters.
//! Most requests derive the trait:
//!
//! ```rust,ignore
//! #[derive(Request)]
//! struct AddRule {
//!     #[param(ordinal = 0, description = "Position of the new rule.")]
//!     index: i32,
//!     #[param(ordinal = 1)]
//!     role: RoleId,
//!     #[param(ordinal = 2, capture_remaining)]
//!     path: Option<String>,
//! }
//! ```
//!
//! The [`RequestBinder`] walks the argument text with a [`ParserChain`] and
//! fills the parameters in ordinal order.

mod binder;
mod parser;
pub mod parsers;
mod schema;
mod value;

pub use binder::{BindError, RequestBinder};
pub use parser::{ParseContext, ParseError, ParseResult, Parser, ParserChain};
pub use schema::{ParamDescriptor, ParamType, Schema, SchemaCache, SchemaError};
pub use value::{BoundArgs, CustomEmoji, CustomValue, FromParam, ParamEnum, Value};

/// A structured set of positional arguments.
pub trait Request: Sized + Send + 'static {
    /// Parameter metadata. Validated once per type.
    fn params() -> Vec<ParamDescriptor>;

    /// Builds the request from bound values.
    fn from_args(args: BoundArgs) -> Result<Self, BindError>;
}
