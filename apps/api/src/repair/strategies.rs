//! Individual repair transforms used by the cascade, mildest first.
//!
//! Each transform is total: it never fails, it only returns text that may or may not parse.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn bare_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""(\w+)":\s*([^"\[\]{},\n]+)([,}\]])"#).expect("valid bare value regex")
    })
}

fn json_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid number regex"))
}

fn missing_comma_res() -> &'static [(Regex, &'static str); 3] {
    static RES: OnceLock<[(Regex, &'static str); 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            (
                Regex::new(r#""\s*\n\s*""#).expect("valid string gap regex"),
                "\",\n\"",
            ),
            (
                Regex::new(r#"\}\s*\n\s*""#).expect("valid object gap regex"),
                "},\n\"",
            ),
            (
                Regex::new(r#"\]\s*\n\s*""#).expect("valid array gap regex"),
                "],\n\"",
            ),
        ]
    })
}

/// `"key": some words,` → `"key": "some words",`. Numbers, booleans and null stay bare.
pub fn quote_bare_values(text: &str) -> String {
    bare_value_re()
        .replace_all(text, |caps: &Captures| {
            let key = &caps[1];
            let value = caps[2].trim();
            let ending = &caps[3];

            if value.is_empty() {
                return caps[0].to_string();
            }
            if json_number_re().is_match(value) || matches!(value, "true" | "false" | "null") {
                format!("\"{key}\": {value}{ending}")
            } else {
                format!("\"{key}\": \"{value}\"{ending}")
            }
        })
        .into_owned()
}

/// Closes whatever a token limit left open: an unterminated string first, then every
/// open `[` / `{` in reverse nesting order. A dangling comma or colon is tidied first.
pub fn balance_brackets(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    if stack.is_empty() && !in_string {
        return text.to_string();
    }

    let mut repaired = text.to_string();
    if in_string {
        if escaped {
            repaired.pop();
        }
        repaired.push('"');
    }

    let trimmed_len = repaired.trim_end().len();
    repaired.truncate(trimmed_len);
    if repaired.ends_with(',') {
        repaired.pop();
    } else if repaired.ends_with(':') {
        repaired.push_str(" null");
    }

    repaired.extend(stack.iter().rev());
    repaired
}

/// Inserts the comma small models drop between a value and the next quoted key
/// when the two sit on separate lines.
pub fn insert_missing_commas(text: &str) -> String {
    missing_comma_res()
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

/// Escapes raw newlines, carriage returns and tabs that sit inside string literals.
/// Structural whitespace between tokens is left untouched.
pub fn escape_newlines_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }
        match c {
            _ if escaped => {
                escaped = false;
                out.push(c);
            }
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap_or_else(|e| panic!("{text:?} did not parse: {e}"))
    }

    #[test]
    fn test_quote_bare_values_quotes_words_only() {
        let input = r#"{"role": Senior Engineer, "score": 85, "ok": true, "gap": null, "delta": -2.5}"#;
        let out = quote_bare_values(input);
        assert_eq!(
            parse(&out),
            json!({ "role": "Senior Engineer", "score": 85, "ok": true, "gap": null, "delta": -2.5 })
        );
    }

    #[test]
    fn test_quote_bare_values_leaves_quoted_values_alone() {
        let input = r#"{"name": "Ada", "list": ["a", "b"]}"#;
        assert_eq!(quote_bare_values(input), input);
    }

    #[test]
    fn test_balance_appends_closers_in_nesting_order() {
        let out = balance_brackets(r#"{"a": 1, "b": ["x","y""#);
        assert_eq!(out, r#"{"a": 1, "b": ["x","y"]}"#);
        assert_eq!(parse(&out), json!({ "a": 1, "b": ["x", "y"] }));
    }

    #[test]
    fn test_balance_restores_any_number_of_missing_closers() {
        let complete = r#"{"a": {"b": [{"c": [1, 2, {"d": {"e": []}}]}]}, "z": [[[]]]}"#;
        let closers = complete.chars().rev().take_while(|c| matches!(c, '}' | ']')).count();
        for missing in 1..=closers {
            let truncated = &complete[..complete.len() - missing];
            let out = balance_brackets(truncated);
            assert_eq!(parse(&out), parse(complete), "missing {missing} closers");
        }
    }

    #[test]
    fn test_balance_closes_unterminated_string() {
        let out = balance_brackets(r#"{"summary": "Strong backend engi"#);
        assert_eq!(parse(&out), json!({ "summary": "Strong backend engi" }));
    }

    #[test]
    fn test_balance_drops_dangling_comma_and_fills_dangling_colon() {
        assert_eq!(parse(&balance_brackets(r#"{"a": [1, 2,"#)), json!({ "a": [1, 2] }));
        assert_eq!(parse(&balance_brackets(r#"{"a": 1, "b":"#)), json!({ "a": 1, "b": null }));
    }

    #[test]
    fn test_balance_ignores_brackets_inside_strings() {
        let input = r#"{"note": "use {braces} and [brackets]""#;
        assert_eq!(balance_brackets(input), format!("{input}}}"));
    }

    #[test]
    fn test_balance_is_noop_on_balanced_text() {
        let input = r#"{"a": [1, {"b": 2}]}"#;
        assert_eq!(balance_brackets(input), input);
    }

    #[test]
    fn test_insert_missing_commas_between_lines() {
        let input = "{\n  \"a\": \"x\"\n  \"b\": {\"c\": 1}\n  \"d\": [1]\n  \"e\": 2\n}";
        let out = insert_missing_commas(input);
        assert_eq!(
            parse(&out),
            json!({ "a": "x", "b": { "c": 1 }, "d": [1], "e": 2 })
        );
    }

    #[test]
    fn test_escape_newlines_only_inside_strings() {
        let input = "{\n  \"bio\": \"line one\nline two\"\n}";
        let out = escape_newlines_in_strings(input);
        assert_eq!(out, "{\n  \"bio\": \"line one\\nline two\"\n}");
        assert_eq!(parse(&out)["bio"], "line one\nline two");
    }

    #[test]
    fn test_escape_respects_existing_escapes() {
        let input = "{\"q\": \"say \\\"hi\\\"\nthen go\"}";
        let out = escape_newlines_in_strings(input);
        assert_eq!(parse(&out)["q"], "say \"hi\"\nthen go");
    }
}
