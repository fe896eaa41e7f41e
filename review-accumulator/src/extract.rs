/// Finds the largest balanced `{...}` object anywhere in `text`, ignoring
/// braces that appear inside JSON string literals. Markdown code fences,
/// preambles and postambles never contain braces themselves, so this scan
/// finds the embedded object without needing to special-case them.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start: Option<usize> = None;
    let mut best: Option<(usize, usize)> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(s) = start {
                            let end = i + 1;
                            let is_larger = best.is_none_or(|(bs, be)| end - s > be - bs);
                            if is_larger {
                                best = Some((s, end));
                            }
                        }
                        start = None;
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(s, e)| &text[s..e])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_wrapped_in_code_fence() {
        let text = "preamble\n```json\n{\"a\":1}\n```\npostamble";
        assert_eq!(extract_json_object(text), Some(r#"{"a":1}"#));
    }

    #[test]
    fn picks_the_largest_candidate() {
        let text = r#"{"a":1} noise {"a":1,"b":{"c":2}}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a":1,"b":{"c":2}}"#));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"{"text":"a } b { c"}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn no_object_returns_none() {
        assert_eq!(extract_json_object("just plain text"), None);
    }
}
