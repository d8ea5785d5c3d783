//! Textual form of the `insurance_label` column
//!
//! Labels are written as a Python-style list literal, e.g. `['Auto', 'Home']`
//! or `[]`. Each string takes single quotes unless it contains `'` and no `"`,
//! in which case double quotes are used. Backslashes and the chosen quote are
//! escaped, so `parse_label_list` recovers the exact list.

/// Render labels as a list literal
pub fn format_label_list<S: AsRef<str>>(labels: &[S]) -> String {
    let mut out = String::from("[");
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_quoted(&mut out, label.as_ref());
    }
    out.push(']');
    out
}

fn push_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Parse a list literal produced by `format_label_list`.
///
/// Returns `None` for anything that is not a well-formed list of strings.
pub fn parse_label_list(text: &str) -> Option<Vec<String>> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    let mut chars = inner.chars().peekable();
    let mut labels = Vec::new();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let quote = match chars.next() {
            None => break,
            Some(q @ ('\'' | '"')) => q,
            Some(_) => return None,
        };

        let mut label = String::new();
        loop {
            match chars.next()? {
                '\\' => match chars.next()? {
                    'n' => label.push('\n'),
                    'r' => label.push('\r'),
                    't' => label.push('\t'),
                    other => label.push(other),
                },
                c if c == quote => break,
                c => label.push(c),
            }
        }
        labels.push(label);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }

    Some(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_empty_and_single() {
        let empty: [&str; 0] = [];
        assert_eq!(format_label_list(&empty), "[]");
        assert_eq!(format_label_list(&["Auto Insurance"]), "['Auto Insurance']");
    }

    #[test]
    fn test_format_multiple() {
        assert_eq!(
            format_label_list(&["Auto Insurance", "Life Insurance"]),
            "['Auto Insurance', 'Life Insurance']"
        );
    }

    #[test]
    fn test_format_quote_selection() {
        assert_eq!(format_label_list(&["Driver's Cover"]), r#"["Driver's Cover"]"#);
        assert_eq!(
            format_label_list(&[r#"It's "fine""#]),
            r#"['It\'s "fine"']"#
        );
        assert_eq!(format_label_list(&[r"a\b"]), r"['a\\b']");
    }

    #[test]
    fn test_parse_recovers_tricky_labels() {
        let labels = vec![
            "Driver's Cover".to_string(),
            r#"It's "fine""#.to_string(),
            r"back\slash".to_string(),
            "comma, inside".to_string(),
            String::new(),
        ];
        let text = format_label_list(&labels);
        assert_eq!(parse_label_list(&text), Some(labels));
    }

    #[test]
    fn test_parse_empty_list_differs_from_empty_string() {
        assert_eq!(parse_label_list("[]"), Some(vec![]));
        assert_eq!(parse_label_list("['']"), Some(vec![String::new()]));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_label_list(""), None);
        assert_eq!(parse_label_list("Auto"), None);
        assert_eq!(parse_label_list("['Auto'"), None);
        assert_eq!(parse_label_list("[Auto]"), None);
        assert_eq!(parse_label_list("['a' 'b']"), None);
    }
}
