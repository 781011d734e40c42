//! Search query construction from free text and category chips.

/// Topics searched when the user has entered nothing.
pub const DEFAULT_TOPICS: &[&str] = &["artificial intelligence", "machine learning", "deep learning"];

/// A selectable category chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// arXiv category id.
    pub id: &'static str,
    /// Chip label.
    pub label: &'static str,
    /// Topic phrase searched for this category.
    pub phrase: &'static str,
}

/// Categories offered as filter chips, in display order.
pub const CATEGORIES: &[Category] = &[
    Category { id: "cs.AI", label: "AI", phrase: "artificial intelligence" },
    Category { id: "cs.LG", label: "Machine Learning", phrase: "machine learning" },
    Category { id: "cs.CL", label: "Computation & Language", phrase: "natural language processing" },
    Category { id: "cs.CV", label: "Computer Vision", phrase: "computer vision" },
    Category { id: "cs.RO", label: "Robotics", phrase: "robotics" },
    Category { id: "cs.NE", label: "Neural Networks", phrase: "neural networks" },
];

/// Topic phrase for a category id, if the id is known.
#[must_use]
pub fn category_phrase(id: &str) -> Option<&'static str> {
    CATEGORIES.iter().find(|c| c.id == id).map(|c| c.phrase)
}

/// Build the search-engine query for the given text and selected categories.
///
/// - nothing selected: the default topic disjunction
/// - text only: the text verbatim
/// - whitespace-only text counts as no text
/// - categories only: their phrases joined with `OR`
/// - both: `(text) AND (phrase1 OR phrase2 ...)`
///
/// Unknown category ids are dropped.
#[must_use]
pub fn build<S: AsRef<str>>(text: &str, selected_categories: &[S]) -> String {
    let phrases: Vec<&str> =
        selected_categories.iter().filter_map(|id| category_phrase(id.as_ref())).collect();

    match (text.trim().is_empty(), phrases.is_empty()) {
        (true, true) => DEFAULT_TOPICS.join(" OR "),
        (false, true) => text.to_string(),
        (true, false) => phrases.join(" OR "),
        (false, false) => format!("({text}) AND ({})", phrases.join(" OR ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_default_query() {
        assert_eq!(
            build("", NONE),
            "artificial intelligence OR machine learning OR deep learning"
        );
    }

    #[test]
    fn test_text_only_is_verbatim() {
        assert_eq!(build("graph neural networks", NONE), "graph neural networks");
        assert_eq!(build(" foo ", NONE), " foo ");
        assert_eq!(build("   ", NONE), build("", NONE));
    }

    #[test]
    fn test_categories_follow_input_order() {
        assert_eq!(build("", &["cs.AI", "cs.RO"]), "artificial intelligence OR robotics");
        assert_eq!(build("", &["cs.RO", "cs.AI"]), "robotics OR artificial intelligence");
    }

    #[test]
    fn test_text_and_category() {
        assert_eq!(
            build("transformers", &["cs.CL"]),
            "(transformers) AND (natural language processing)"
        );
    }

    #[test]
    fn test_unknown_category_dropped() {
        assert_eq!(build("", &["cs.XX", "cs.CV"]), "computer vision");
        assert_eq!(build("agents", &["math.CO"]), "agents");
    }

    #[test]
    fn test_every_category_has_a_phrase() {
        for category in CATEGORIES {
            assert_eq!(category_phrase(category.id), Some(category.phrase));
        }
    }
}
