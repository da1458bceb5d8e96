use std::{collections::HashMap, sync::OnceLock};

use regex::Regex;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A token is a '$' followed by an identifier. '$$' is not an escape; it is a '$' and a token.
    RE.get_or_init(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

/// Substitute `$token` placeholders in `template` from `params`.
///
/// Pure. Tokens with no entry in the map are left verbatim, so a half-filled template still shows where the
/// missing data would go rather than silently dropping it.
pub fn render_template(template: &str, params: &HashMap<String, String>) -> String {
    token_regex()
        .replace_all(template, |caps: &regex::Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_known_tokens() {
        let p = params(&[("name", "Asha"), ("order_id", "OD-1001")]);
        let out = render_template("Hi $name, your order $order_id is confirmed.", &p);
        assert_eq!(out, "Hi Asha, your order OD-1001 is confirmed.");
    }

    #[test]
    fn unresolved_tokens_stay_verbatim() {
        let p = params(&[("name", "Asha")]);
        let out = render_template("Hi $name, order $order_id, total $total.", &p);
        assert_eq!(out, "Hi Asha, order $order_id, total $total.");
    }

    #[test]
    fn token_at_string_edges() {
        let p = params(&[("a", "x"), ("b", "y")]);
        assert_eq!(render_template("$a mid $b", &p), "x mid y");
    }

    #[test]
    fn plain_text_is_untouched() {
        let p = params(&[("name", "Asha")]);
        assert_eq!(render_template("No tokens here. Price is 100% real.", &p), "No tokens here. Price is 100% real.");
    }

    #[test]
    fn adjacent_punctuation_does_not_extend_the_token() {
        let p = params(&[("amount", "₹200.00")]);
        assert_eq!(render_template("Credited $amount.", &p), "Credited ₹200.00.");
    }
}
