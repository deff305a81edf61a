//! Prompt text handed to the language model.

use super::intent::{category_lines, recurring_lines, DIRECT_ANSWER_MARKER};
use crate::{
    core::services::SpendingSnapshot,
    ledger::Transaction,
    utils::money::format_dollars,
};

/// Transactions listed in the spending-tip prompt.
pub const TIP_RECENT_LIMIT: usize = 5;
/// Categories listed in the spending-tip prompt.
pub const TIP_CATEGORY_LIMIT: usize = 3;

/// Fixed instruction sent with every question.
pub fn system_prompt() -> String {
    format!(
        "You are a precise financial assistant. Answer the user's question using ONLY the verified data provided.

RULES:
1. NEVER do arithmetic. All numbers are pre-calculated.
2. If a {DIRECT_ANSWER_MARKER} line is given, use those exact numbers in your reply.
3. Answer in 2-3 sentences maximum.
4. Do not speculate or add unsolicited advice.
5. Do not repeat the words \"{DIRECT_ANSWER_MARKER}\" in your response."
    )
}

/// `N. item[ at vendor] [category]: $amount`, one line per transaction.
pub fn transaction_lines(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "None".to_string();
    }
    transactions
        .iter()
        .enumerate()
        .map(|(index, txn)| {
            let vendor = txn
                .vendor_label()
                .map(|vendor| format!(" at {vendor}"))
                .unwrap_or_default();
            format!(
                "{}. {}{} [{}]: {}",
                index + 1,
                txn.item,
                vendor,
                txn.category,
                format_dollars(txn.amount)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Question prompt: the verified figures, the injected fact if any, then the question.
pub fn user_prompt(snapshot: &SpendingSnapshot, fact: Option<&str>, question: &str) -> String {
    let summary = &snapshot.last_30_days;
    let fact_block = fact
        .map(|fact| format!("\n{fact}\n"))
        .unwrap_or_default();
    format!(
        "VERIFIED FINANCIAL DATA - DO NOT RECALCULATE:

[ LAST 30 DAYS ]
Total spending: {total}
Transactions: {count}
Average per transaction: {avg}

[ THIS CALENDAR MONTH ]
Total: {month}

[ RECENT TRANSACTIONS ]
{recent}

[ BY CATEGORY ]
{categories}

[ RECURRING PURCHASES (90-day window) ]
{recurring}
{fact_block}
USER QUESTION: \"{question}\"

Answer using only the data above. 2-3 sentences max. No math.",
        total = format_dollars(summary.total),
        count = summary.count,
        avg = format_dollars(summary.avg),
        month = format_dollars(snapshot.monthly_total),
        recent = transaction_lines(&snapshot.recent_transactions),
        categories = category_lines(snapshot),
        recurring = recurring_lines(snapshot),
    )
}

/// One-sentence saving tip prompt.
pub fn tip_prompt(snapshot: &SpendingSnapshot) -> String {
    let recent_len = snapshot.recent_transactions.len().min(TIP_RECENT_LIMIT);
    let recent = transaction_lines(&snapshot.recent_transactions[..recent_len]);
    let (top_name, top_amount) = snapshot
        .categories
        .first()
        .map(|bucket| (bucket.category.as_str(), bucket.amount))
        .unwrap_or(("N/A", 0.0));
    let top_categories = snapshot
        .categories
        .iter()
        .take(TIP_CATEGORY_LIMIT)
        .map(|bucket| format!("  - {}: {}", bucket.category, format_dollars(bucket.amount)))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "FINANCIAL DATA (do not recalculate):

Total spending last 30 days: {total}
Highest category: {top_name} at {top_amount}

Recent transactions:
{recent}

Top categories:
{top_categories}

Give ONE specific, actionable money-saving tip using the exact dollar amounts above. One sentence only.",
        total = format_dollars(snapshot.last_30_days.total),
        top_amount = format_dollars(top_amount),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::ledger::{CategoryBucket, Summary};

    fn txn(id: u64, item: &str, vendor: Option<&str>, amount: f64) -> Transaction {
        Transaction {
            id,
            amount,
            category: "Food".into(),
            item: item.into(),
            vendor: vendor.map(str::to_string),
            date: NaiveDate::from_ymd_opt(2025, 6, 1),
            created_at: Utc::now(),
        }
    }

    fn snapshot() -> SpendingSnapshot {
        SpendingSnapshot {
            last_30_days: Summary {
                total: 42.5,
                count: 2,
                avg: 21.25,
            },
            monthly_total: 30.0,
            categories: vec![CategoryBucket {
                category: "Food".into(),
                amount: 42.5,
                count: 2,
            }],
            recurring: Vec::new(),
            transaction_count: 2,
            recent_transactions: vec![
                txn(2, "pizza", Some("Luigi's"), 30.0),
                txn(1, "lunch", None, 12.5),
            ],
        }
    }

    #[test]
    fn system_prompt_forbids_arithmetic_and_marker_echo() {
        let prompt = system_prompt();
        assert!(prompt.contains("NEVER do arithmetic"));
        assert!(prompt.contains("2-3 sentences"));
        assert!(prompt.contains("Do not repeat the words \"DIRECT ANSWER\""));
    }

    #[test]
    fn transaction_lines_format_vendor_and_category() {
        let lines = transaction_lines(&snapshot().recent_transactions);
        assert_eq!(
            lines,
            "1. pizza at Luigi's [Food]: $30.00\n2. lunch [Food]: $12.50"
        );
    }

    #[test]
    fn user_prompt_embeds_figures_fact_and_question() {
        let prompt = user_prompt(
            &snapshot(),
            Some("DIRECT ANSWER: Total spending in the last 30 days is $42.50."),
            "how much?",
        );
        assert!(prompt.contains("Total spending: $42.50"));
        assert!(prompt.contains("Transactions: 2"));
        assert!(prompt.contains("Average per transaction: $21.25"));
        assert!(prompt.contains("[ THIS CALENDAR MONTH ]\nTotal: $30.00"));
        assert!(prompt.contains("NONE - no repeated purchases detected"));
        assert!(prompt.contains("\nDIRECT ANSWER: Total spending in the last 30 days is $42.50.\n"));
        assert!(prompt.contains("USER QUESTION: \"how much?\""));
    }

    #[test]
    fn user_prompt_without_fact_has_no_marker() {
        let prompt = user_prompt(&snapshot(), None, "should I cook more?");
        assert!(!prompt.contains("DIRECT ANSWER"));
    }

    #[test]
    fn tip_prompt_names_top_category() {
        let prompt = tip_prompt(&snapshot());
        assert!(prompt.contains("Highest category: Food at $42.50"));
        assert!(prompt.contains("One sentence only."));
    }
}
