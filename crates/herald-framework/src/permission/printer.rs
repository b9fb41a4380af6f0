//! Text rendering of a guild's rule list.

use std::fmt::Write;

use herald_core::Directory;

use super::rule::Rule;

/// Renders rules as a numbered list followed by an explanation footer.
pub fn render_rules(rules: &[Rule], default_allow: bool, directory: &dyn Directory) -> String {
    let mut out = String::new();

    for (i, rule) in rules.iter().enumerate() {
        let path = rule.path_expression().to_string();
        let _ = writeln!(
            out,
            "[``{}``] ``{}`` **{}** be used by ``{}``",
            i + 1,
            if path.is_empty() { "<empty>" } else { &path },
            if rule.is_allow() { "CAN" } else { "CAN NOT" },
            rule.subject().display_name(directory),
        );
    }

    let _ = write!(
        out,
        "\nRules are evaluated from top to bottom. If none of the above rules match, \
         then the user **{}** be able to use the command.\n\
         The server owner and users in an Administrator role can always use any command.",
        if default_allow { "WILL" } else { "WILL NOT" },
    );

    out
}
