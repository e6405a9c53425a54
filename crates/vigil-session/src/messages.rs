//! Notice rendering: placeholder substitution and color codes.

/// Substitutes `{key}` placeholders and translates color codes.
///
/// `vars` pairs are applied in order; unknown placeholders in the template
/// are left as-is (a typo in a config template should be visible, not
/// silently eaten).
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    colorize(&out)
}

/// Translates `&`-prefixed color codes to `§` formatting codes.
///
/// Recognizes the standard set (`0-9`, `a-f`, `k-o`, `r`, either case);
/// any other `&` sequence passes through untouched so ampersands in
/// ordinary prose survive.
pub fn colorize(text: &str) -> String {
    const CODES: &str = "0123456789abcdefklmnor";

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            if let Some(&next) = chars.peek() {
                if CODES.contains(next.to_ascii_lowercase()) {
                    out.push('§');
                    out.push(next.to_ascii_lowercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let out = render(
            "{player} is on {server} with {online} others",
            &[("player", "steve"), ("server", "Hub"), ("online", "7")],
        );
        assert_eq!(out, "steve is on Hub with 7 others");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders_visible() {
        let out = render("hello {tpyo}", &[("typo", "x")]);
        assert_eq!(out, "hello {tpyo}");
    }

    #[test]
    fn test_colorize_translates_codes() {
        assert_eq!(colorize("&aWelcome &7back"), "§aWelcome §7back");
        // Uppercase codes are lowered, like the classic chat format.
        assert_eq!(colorize("&AWelcome"), "§aWelcome");
    }

    #[test]
    fn test_colorize_ignores_non_code_ampersands() {
        assert_eq!(colorize("salt & pepper"), "salt & pepper");
        assert_eq!(colorize("you &me"), "you &me".to_string());
        // Trailing ampersand survives.
        assert_eq!(colorize("end&"), "end&");
    }

    #[test]
    fn test_render_applies_colors_after_substitution() {
        // Placeholder values may themselves contain codes (server names
        // often do).
        let out = render("&e{server}", &[("server", "&cDoom")]);
        assert_eq!(out, "§e§cDoom");
    }
}
