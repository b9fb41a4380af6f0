//! Activities shipped with the framework.
//!
//! - `permissions add|delete|setdefault|list`: rule administration,
//!   restricted by default
//! - `help [command]`: registered late so it can list everything else

mod help;
mod permissions;

pub use help::help_activity;
pub use permissions::{Allowability, permission_activities};
