//! Output Sanitizer: best-effort cleanup of raw model text before the first parse.
//!
//! The steps run in a fixed order; later steps assume the earlier ones already ran
//! (the slice step relies on fences and comments being gone, the trailing-comma
//! step relies on control characters being stripped).

/// Runs every sanitizer step in order. The result may still be invalid JSON.
pub fn sanitize(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = strip_line_comments(text);
    let text = slice_to_object(&text);
    let text = strip_control_chars(text);
    strip_trailing_commas(&text)
}

/// Step 1: trim, then drop a leading fence (with or without a language tag) and a trailing fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Step 2: drop `//` comments. Quote state is tracked per line so URLs inside
/// string values survive; a JSON string cannot legally span lines.
pub fn strip_line_comments(text: &str) -> String {
    text.split('\n')
        .map(|line| match comment_start(line) {
            Some(idx) => line[..idx].trim_end(),
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn comment_start(line: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    let mut prev_slash = false;

    for (idx, c) in line.char_indices() {
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
            '"' => {
                in_string = true;
                prev_slash = false;
            }
            '/' if prev_slash => return Some(idx - 1),
            '/' => prev_slash = true,
            _ => prev_slash = false,
        }
    }
    None
}

/// Step 3: keep `{ .. }` from the first open brace to the last close brace.
/// With no closing brace after the first open one, keep everything from the open brace
/// and leave closing to the repair cascade.
pub fn slice_to_object(text: &str) -> String {
    match (text.find('{'), text.rfind('}')) {
        (Some(first), Some(last)) if last > first => text[first..=last].to_string(),
        (Some(first), _) => text[first..].to_string(),
        _ => text.to_string(),
    }
}

/// Step 4: remove bytes 0–31 and 127, keeping `\n`, `\r` and `\t`.
pub fn strip_control_chars(text: String) -> String {
    let is_disallowed =
        |c: char| (c < '\u{20}' && !matches!(c, '\n' | '\r' | '\t')) || c == '\u{7f}';
    if !text.chars().any(is_disallowed) {
        return text;
    }
    text.chars().filter(|c| !is_disallowed(*c)).collect()
}

/// Step 5: `,}` / `, ]` (any whitespace between) become `}` / ` ]`.
/// Commas inside string values are never touched; a run like `,,}` loses every comma.
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else {
            match c {
                '"' => in_string = true,
                ',' if closes_next(&chars[idx + 1..]) => continue,
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// True when the next character that is neither whitespace nor a comma closes a container.
fn closes_next(rest: &[char]) -> bool {
    rest.iter()
        .find(|c| !c.is_whitespace() && **c != ',')
        .is_some_and(|c| matches!(c, '}' | ']'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_fenced_json_with_trailing_comma_parses() {
        let input = "```json\n{\"a\":1,\"b\":2,}\n```";
        let out = sanitize(input);
        assert_eq!(out, r#"{"a":1,"b":2}"#);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn test_fence_without_language_tag() {
        assert_eq!(sanitize("```\n{\"k\": \"v\"}\n```"), r#"{"k": "v"}"#);
    }

    #[test]
    fn test_prose_around_fenced_json_is_discarded() {
        let input = "Sure! Here is your audit:\n```json\n{\"score\": {\"x\": 1}}\n```\nLet me know if you need more.";
        assert_eq!(sanitize(input), r#"{"score": {"x": 1}}"#);
    }

    #[test]
    fn test_truncated_output_keeps_tail_from_first_brace() {
        assert_eq!(sanitize("Result: {\"a\": [1, 2"), "{\"a\": [1, 2");
    }

    #[test]
    fn test_text_without_braces_is_left_alone() {
        assert_eq!(sanitize("  I cannot help with that.  "), "I cannot help with that.");
    }

    #[test]
    fn test_comments_removed_but_urls_kept() {
        let input = "{\n  \"site\": \"https://example.com\", // personal site\n  // a full-line comment\n  \"n\": 1\n}";
        let out = sanitize(input);
        assert!(out.contains("https://example.com"));
        assert!(!out.contains("personal site"));
        assert!(!out.contains("full-line"));
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["site"], "https://example.com");
    }

    #[test]
    fn test_control_chars_removed_except_whitespace() {
        let input = "{\"a\":\u{0}\u{7} \"x\u{1b}y\",\n\t\"b\": 2\r\n}";
        let out = sanitize(input);
        assert_eq!(out, "{\"a\": \"xy\",\n\t\"b\": 2\r\n}");
    }

    #[test]
    fn test_trailing_comma_removes_only_that_comma() {
        let input = r#"{"list": [1, 2, 3, ], "name": "a, b", "nested": {"k": "v",}}"#;
        assert_eq!(
            sanitize(input),
            r#"{"list": [1, 2, 3 ], "name": "a, b", "nested": {"k": "v"}}"#
        );
    }

    #[test]
    fn test_commas_inside_strings_are_kept() {
        let input = r#"{"tip": "List items like [a, b, ] or {x, }", "n": 1}"#;
        assert_eq!(sanitize(input), input);

        let escaped = r#"{"q": "say \"a, ]\" twice", "list": [1,,]}"#;
        assert_eq!(
            strip_trailing_commas(escaped),
            r#"{"q": "say \"a, ]\" twice", "list": [1]}"#
        );
    }

    #[test]
    fn test_idempotent_on_valid_json() {
        let inputs = [
            r#"{"a": 1}"#,
            "{\n  \"a\": [1, 2, {\"b\": null}],\n\t\"c\": \"// not a comment\"\n}",
            r#"{"nested": {"deep": {"list": ["x", "y"]}}, "ok": true}"#,
            r#"{"url": "http://a.b/c", "n": -1.5e3}"#,
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_comment_start_ignores_slashes_in_strings() {
        assert_eq!(comment_start(r#""a": "//x""#), None);
        assert_eq!(comment_start(r#""a": 1 // c"#), Some(7));
        assert_eq!(comment_start(r#""a\"//": 1"#), None);
    }
}
