use serde::{Deserialize, Serialize};

/// Closed set of message categories.
///
/// `Classifier` is internal plumbing (the category of the classification
/// handler itself) and is never produced as a dispatch destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Travel,
    Schedule,
    Family,
    Todo,
    Document,
    Email,
    ScheduleEmail,
    General,
    Classifier,
}

impl Category {
    /// Categories a message can be dispatched to.
    pub const DISPATCHABLE: &'static [Category] = &[
        Category::Travel,
        Category::Schedule,
        Category::Family,
        Category::Todo,
        Category::Document,
        Category::Email,
        Category::ScheduleEmail,
        Category::General,
    ];

    /// Parse a raw classifier label into a category.
    ///
    /// Total: lower-cases and trims the input, and coerces anything outside
    /// the known set (empty string, multi-word answers, hallucinated labels)
    /// to [`Category::General`]. `classifier` itself is not a valid
    /// destination and also coerces to `General`.
    #[must_use]
    pub fn parse(raw: &str) -> Category {
        match raw.trim().to_lowercase().as_str() {
            "travel" => Category::Travel,
            "schedule" => Category::Schedule,
            "family" => Category::Family,
            "todo" => Category::Todo,
            "document" => Category::Document,
            "email" => Category::Email,
            "scheduleemail" => Category::ScheduleEmail,
            "general" => Category::General,
            _ => Category::General,
        }
    }

    /// The wire label for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Travel => "travel",
            Category::Schedule => "schedule",
            Category::Family => "family",
            Category::Todo => "todo",
            Category::Document => "document",
            Category::Email => "email",
            Category::ScheduleEmail => "scheduleemail",
            Category::General => "general",
            Category::Classifier => "classifier",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_labels() {
        assert_eq!(Category::parse("travel"), Category::Travel);
        assert_eq!(Category::parse("scheduleemail"), Category::ScheduleEmail);
        assert_eq!(Category::parse("  Schedule \n"), Category::Schedule);
        assert_eq!(Category::parse("TODO"), Category::Todo);
    }

    #[test]
    fn parse_is_total() {
        // Anything out-of-set must coerce to General, never fail.
        for raw in ["", "  ", "flights please", "Travel.", "unknown", "classifier"] {
            assert_eq!(Category::parse(raw), Category::General, "input: {raw:?}");
        }
    }

    #[test]
    fn dispatchable_excludes_classifier() {
        assert!(!Category::DISPATCHABLE.contains(&Category::Classifier));
        assert_eq!(Category::DISPATCHABLE.len(), 8);
    }

    #[test]
    fn serde_round_trip_uses_wire_labels() {
        let json = serde_json::to_string(&Category::ScheduleEmail).unwrap();
        assert_eq!(json, "\"scheduleemail\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::ScheduleEmail);
    }
}
