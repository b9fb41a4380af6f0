//! Usage strings.

use herald_core::Route;

use crate::activity::Activity;
use crate::request::Schema;

/// `<prefix><route> <required> [optional]`, without a trailing space.
///
/// Parameters come from the request schema when there is one, else from the
/// activity's display names (all shown as required).
pub fn basic_usage(
    prefix: &str,
    route: &Route,
    activity: &Activity,
    schema: Option<&Schema>,
) -> String {
    let params: Vec<String> = match schema {
        Some(schema) if !schema.is_empty() => schema
            .params()
            .iter()
            .map(|p| {
                if p.is_nullable() {
                    format!("[{}]", p.name())
                } else {
                    format!("<{}>", p.name())
                }
            })
            .collect(),
        _ => activity.parameters().iter().map(|p| format!("<{p}>")).collect(),
    };

    let mut usage = format!("{prefix}{route}");
    for param in params {
        usage.push(' ');
        usage.push_str(&param);
    }
    usage
}

/// A listing line: the quoted usage followed by the description.
pub fn help_line(usage: &str, description: &str) -> String {
    format!("``{usage}``    {description}")
}
