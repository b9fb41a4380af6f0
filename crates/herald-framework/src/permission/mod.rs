//! Rule-based access control.
//!
//! Every guild owns an ordered list of [`Rule`]s plus a fallback decision.
//! The first rule whose [`PathExpression`](crate::path::PathExpression)
//! matches the activity route and whose [`Subject`] covers the member decides;
//! the guild owner and administrators always pass.

mod printer;
mod rule;
mod store;

pub use printer::render_rules;
pub use rule::{GuildConfiguration, Rule, Subject};
pub use store::RuleStore;
