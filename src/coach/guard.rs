//! Post-generation screen for arithmetic the model was told not to do.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    core::services::SpendingSnapshot,
    utils::money::{format_dollars, transactions_label},
};

/// `$400 x 3 = $1200` and its variants (`×`, `*`, `≈`, thousands separators, cents).
static MULTIPLICATION_CLAIM: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)\$[\d,]+(?:\.\d+)?\s*[×x*]\s*\d+(?:\.\d+)?\s*[=≈]\s*\$[\d,]+").ok()
});

/// True if `text` contains a dollar amount multiplied out to another dollar amount.
pub fn contains_arithmetic(text: &str) -> bool {
    MULTIPLICATION_CLAIM
        .as_ref()
        .map(|pattern| pattern.is_match(text))
        .unwrap_or(false)
}

/// What the guard decided about a finished generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    Accepted(String),
    /// Output was blank.
    Empty(String),
    /// Output contained model arithmetic.
    Replaced(String),
}

impl GuardVerdict {
    pub fn into_text(self) -> String {
        match self {
            GuardVerdict::Accepted(text)
            | GuardVerdict::Empty(text)
            | GuardVerdict::Replaced(text) => text,
        }
    }
}

/// Sentence used when the model produced nothing.
pub fn empty_fallback(snapshot: &SpendingSnapshot) -> String {
    let summary = &snapshot.last_30_days;
    format!(
        "Total spending for the last 30 days is {} across {} {}.",
        format_dollars(summary.total),
        summary.count,
        transactions_label(summary.count)
    )
}

/// Sentence substituted for output that did its own arithmetic.
pub fn arithmetic_fallback(snapshot: &SpendingSnapshot) -> String {
    let summary = &snapshot.last_30_days;
    format!(
        "Total spending for the last 30 days is {} across {} {}, with an average of {} per transaction.",
        format_dollars(summary.total),
        summary.count,
        transactions_label(summary.count),
        format_dollars(summary.avg)
    )
}

/// Screens the concatenated model output.
pub fn screen(raw: &str, snapshot: &SpendingSnapshot) -> GuardVerdict {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return GuardVerdict::Empty(empty_fallback(snapshot));
    }
    if contains_arithmetic(cleaned) {
        return GuardVerdict::Replaced(arithmetic_fallback(snapshot));
    }
    GuardVerdict::Accepted(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Summary;

    fn snapshot() -> SpendingSnapshot {
        SpendingSnapshot {
            last_30_days: Summary {
                total: 150.0,
                count: 3,
                avg: 50.0,
            },
            monthly_total: 150.0,
            categories: Vec::new(),
            recurring: Vec::new(),
            transaction_count: 3,
            recent_transactions: Vec::new(),
        }
    }

    #[test]
    fn detects_multiplication_claims() {
        for text in [
            "You spent $50 x 3 = $150 on food.",
            "That is $400 × 3 = $1200 a quarter",
            "$1,200 * 12 ≈ $14,400",
            "$12.50 X 2 = $25",
        ] {
            assert!(contains_arithmetic(text), "{text}");
        }
    }

    #[test]
    fn plain_amounts_pass() {
        for text in [
            "You spent $150 across 3 transactions.",
            "Food is 3x more than transport.",
            "50 x 3 = 150",
        ] {
            assert!(!contains_arithmetic(text), "{text}");
        }
    }

    #[test]
    fn hallucinated_output_is_replaced_verbatim() {
        let verdict = screen("Sure! $50 x 3 = $150 total.", &snapshot());
        assert_eq!(
            verdict,
            GuardVerdict::Replaced(
                "Total spending for the last 30 days is $150.00 across 3 transactions, with an average of $50.00 per transaction."
                    .into()
            )
        );
    }

    #[test]
    fn blank_output_falls_back_to_total() {
        let verdict = screen("  \n ", &snapshot());
        assert_eq!(
            verdict.into_text(),
            "Total spending for the last 30 days is $150.00 across 3 transactions."
        );
    }

    #[test]
    fn clean_output_is_trimmed_and_kept() {
        assert_eq!(
            screen("  You spent $150.00.  ", &snapshot()),
            GuardVerdict::Accepted("You spent $150.00.".into())
        );
    }

    #[test]
    fn fallback_uses_singular_for_one_transaction() {
        let mut single = snapshot();
        single.last_30_days = Summary {
            total: 9.99,
            count: 1,
            avg: 9.99,
        };
        assert_eq!(
            empty_fallback(&single),
            "Total spending for the last 30 days is $9.99 across 1 transaction."
        );
    }
}
