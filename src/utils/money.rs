//! Rounding and rendering for monetary values.
//!
//! Aggregations keep full `f64` precision; values are rounded here, at the
//! point they leave the crate for a user or a model.

/// Rounds to two decimal places, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Renders an amount as `$1234.50`.
pub fn format_dollars(value: f64) -> String {
    format!("${:.2}", round_cents(value))
}

/// Returns `"transaction"` or `"transactions"` for `count`.
pub fn transactions_label(count: usize) -> &'static str {
    if count == 1 {
        "transaction"
    } else {
        "transactions"
    }
}
