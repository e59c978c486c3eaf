//! `{{ placeholder }}` substitution.

/// Result of rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    pub text: String,
    /// Placeholder names the resolver did not know, in first-seen order.
    pub unresolved: Vec<String>,
}

/// Replace every `{{ name }}` in `template` with `resolve(name)`.
///
/// Whitespace around the name is ignored. Names the resolver rejects render
/// as nothing and are reported in [`Rendered::unresolved`]. A `{{` without a
/// closing `}}` is copied through unchanged, as is `{{}}`.
pub fn render<F>(template: &str, mut resolve: F) -> Rendered
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut unresolved: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let name = after_open[..close].trim();
        if name.is_empty() || name.contains("{{") {
            // Not a placeholder: emit the opening braces and rescan after them.
            out.push_str("{{");
            rest = after_open;
            continue;
        }

        match resolve(name) {
            Some(value) => out.push_str(&value),
            None => {
                if !unresolved.iter().any(|u| u == name) {
                    unresolved.push(name.to_string());
                }
            }
        }
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);

    Rendered {
        text: out,
        unresolved,
    }
}

/// Placeholder names used in `template`, in first-seen order.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    render(template, |name| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        Some(String::new())
    });
    names
}
