use crate::errors::ValidationError;

/// Spending labels a transaction or bill may carry.
pub const CATEGORY_LABELS: &[&str] = &[
    "Food",
    "Transport",
    "Entertainment",
    "Health",
    "Shopping",
    "Utilities",
    "Education",
    "Storage",
    "Other",
];

/// Resolves user input to the canonical label, ignoring case and surrounding whitespace.
pub fn canonical_category(input: &str) -> Result<&'static str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingCategory);
    }
    CATEGORY_LABELS
        .iter()
        .copied()
        .find(|label| label.eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| ValidationError::UnknownCategory(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_category_ignores_case() {
        assert_eq!(canonical_category(" food "), Ok("Food"));
        assert_eq!(canonical_category("UTILITIES"), Ok("Utilities"));
    }

    #[test]
    fn canonical_category_rejects_blank_and_unknown() {
        assert_eq!(canonical_category("  "), Err(ValidationError::MissingCategory));
        assert_eq!(
            canonical_category("rent"),
            Err(ValidationError::UnknownCategory("rent".into()))
        );
    }
}
