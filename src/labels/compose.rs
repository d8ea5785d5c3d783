//! Query text composition and taxonomy vocabulary

use std::collections::HashSet;

/// Build the text embedded for one company.
///
/// Null inputs become empty strings, so two nulls give a single space and the
/// row is still scored.
pub fn compose_query(description: Option<&str>, business_tags: Option<&str>) -> String {
    let description = description.unwrap_or("");
    let business_tags = business_tags.unwrap_or("");

    let mut query = String::with_capacity(description.len() + business_tags.len() + 1);
    query.push_str(description);
    query.push(' ');
    query.push_str(business_tags);
    query
}

/// Distinct non-null labels in first-seen order
pub fn build_vocabulary<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut vocabulary = Vec::new();

    for label in labels.into_iter().flatten() {
        let label = label.as_ref();
        if seen.insert(label.to_string()) {
            vocabulary.push(label.to_string());
        }
    }

    vocabulary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_query() {
        assert_eq!(
            compose_query(Some("We sell cars"), Some("automotive")),
            "We sell cars automotive"
        );
        assert_eq!(compose_query(Some("Bakery"), None), "Bakery ");
        assert_eq!(compose_query(None, Some("['food']")), " ['food']");
    }

    #[test]
    fn test_compose_query_all_null_is_single_space() {
        assert_eq!(compose_query(None, None), " ");
        assert!(!compose_query(None, None).contains("None"));
    }

    #[test]
    fn test_build_vocabulary_dedupes_in_order() {
        let labels = vec![Some("Auto"), Some("Home"), Some("Auto"), None, Some("Home")];
        assert_eq!(build_vocabulary(labels), vec!["Auto", "Home"]);
    }

    #[test]
    fn test_build_vocabulary_is_case_sensitive() {
        let labels = vec![Some("auto".to_string()), Some("Auto".to_string())];
        assert_eq!(build_vocabulary(labels), vec!["auto", "Auto"]);
    }

    #[test]
    fn test_build_vocabulary_empty() {
        let labels: Vec<Option<&str>> = vec![None, None];
        assert!(build_vocabulary(labels).is_empty());
    }
}
