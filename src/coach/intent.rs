//! Question classification: small talk first, then an ordered table of keyword
//! rules that pick the pre-computed fact to hand the model.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::{
    core::services::SpendingSnapshot,
    utils::money::{format_dollars, transactions_label},
};

/// Marker prefixed to every injected fact. The model is told never to echo it.
pub const DIRECT_ANSWER_MARKER: &str = "DIRECT ANSWER";

static SMALL_TALK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^h+i+\s*$",
        r"(?i)^h+e+l+o+\s*$",
        r"(?i)^hey\s*$",
        r"(?i)^good\s*(morning|evening|afternoon|night)",
        r"(?i)^thanks?\s*(you)?\s*$",
        r"(?i)^thank\s+you\s*$",
        r"(?i)^ok\s*$",
        r"(?i)^okay\s*$",
        r"(?i)^bye\s*$",
        r"(?i)^how are you",
        r"(?i)^what('s| is) up",
        r"(?i)^sup\s*$",
        r"(?i)^yo\s*$",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

pub const SMALL_TALK_REPLIES: &[&str] = &[
    "Hey! Ask me anything about your spending, like totals, recurring purchases, or category breakdowns.",
    "Hi there! I'm your financial coach. Ask me about your expenses and I'll give you precise insights.",
    "Hello! I'm ready to help. Try asking: 'What did I spend this month?' or 'Do I have recurring purchases?'",
    "Hey! Ask me something like 'What's my total spending?' or 'Which category do I spend most on?'",
];

pub fn is_small_talk(question: &str) -> bool {
    let trimmed = question.trim();
    SMALL_TALK_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(trimmed))
}

/// One of [`SMALL_TALK_REPLIES`], chosen at random.
pub fn small_talk_reply() -> &'static str {
    SMALL_TALK_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(SMALL_TALK_REPLIES[0])
}

/// Which pre-computed figure answers the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    RollingTotalWithCount,
    RollingTotal,
    Recurring,
    Average,
    Categories,
    TransactionCount,
    CalendarMonth,
}

/// A keyword predicate over the lowercased question and the fact it selects.
pub struct FactRule {
    pub kind: FactKind,
    pub matches: fn(&str) -> bool,
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

fn asks_rolling_total_with_count(q: &str) -> bool {
    contains_any(q, &["total", "spent", "spend", "how much"])
        && contains_any(q, &["month", "30", "last", "overall"])
}

fn asks_rolling_total(q: &str) -> bool {
    q.contains("how much") && !q.contains("month")
}

fn asks_recurring(q: &str) -> bool {
    contains_any(q, &["recurring", "repeat", "regular", "again"])
}

fn asks_average(q: &str) -> bool {
    contains_any(q, &["average", "avg", "per transaction"])
}

fn asks_categories(q: &str) -> bool {
    contains_any(q, &["categor", "most", "top", "where", "breakdown"])
}

fn asks_transaction_count(q: &str) -> bool {
    q.contains("how many") && q.contains("transaction")
}

fn asks_calendar_month(q: &str) -> bool {
    contains_any(q, &["this month", "current month", "calendar"])
}

/// Evaluated top to bottom; the first match wins, so the order is the priority.
pub const FACT_RULES: &[FactRule] = &[
    FactRule {
        kind: FactKind::RollingTotalWithCount,
        matches: asks_rolling_total_with_count,
    },
    FactRule {
        kind: FactKind::RollingTotal,
        matches: asks_rolling_total,
    },
    FactRule {
        kind: FactKind::Recurring,
        matches: asks_recurring,
    },
    FactRule {
        kind: FactKind::Average,
        matches: asks_average,
    },
    FactRule {
        kind: FactKind::Categories,
        matches: asks_categories,
    },
    FactRule {
        kind: FactKind::TransactionCount,
        matches: asks_transaction_count,
    },
    FactRule {
        kind: FactKind::CalendarMonth,
        matches: asks_calendar_month,
    },
];

/// Result of classifying a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SmallTalk,
    Direct(FactKind),
    OpenEnded,
}

pub fn classify(question: &str) -> Intent {
    if is_small_talk(question) {
        return Intent::SmallTalk;
    }
    match match_fact_rule(question) {
        Some(kind) => Intent::Direct(kind),
        None => Intent::OpenEnded,
    }
}

/// First rule whose predicate accepts the lowercased question.
pub fn match_fact_rule(question: &str) -> Option<FactKind> {
    let lowered = question.to_lowercase();
    FACT_RULES
        .iter()
        .find(|rule| (rule.matches)(&lowered))
        .map(|rule| rule.kind)
}

/// Renders the recurring list the way both the fact and the prompt show it.
pub fn recurring_lines(snapshot: &SpendingSnapshot) -> String {
    if snapshot.recurring.is_empty() {
        return "NONE - no repeated purchases detected".to_string();
    }
    snapshot
        .recurring
        .iter()
        .map(|group| {
            format!(
                "  - \"{}\" [{}] - bought {} times, total {}, avg {} each",
                group.name,
                group.category,
                group.count,
                format_dollars(group.total),
                format_dollars(group.avg)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the category list the way both the fact and the prompt show it.
pub fn category_lines(snapshot: &SpendingSnapshot) -> String {
    if snapshot.categories.is_empty() {
        return "None".to_string();
    }
    snapshot
        .categories
        .iter()
        .map(|bucket| {
            format!(
                "  - {}: {} ({} {})",
                bucket.category,
                format_dollars(bucket.amount),
                bucket.count,
                transactions_label(bucket.count)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the direct-answer fact for `kind`, with every figure taken from the snapshot.
pub fn render_fact(kind: FactKind, snapshot: &SpendingSnapshot) -> String {
    let summary = &snapshot.last_30_days;
    let body = match kind {
        FactKind::RollingTotalWithCount => format!(
            "Total spending in the last 30 days is exactly {} across {} {}.",
            format_dollars(summary.total),
            summary.count,
            transactions_label(summary.count)
        ),
        FactKind::RollingTotal => format!(
            "Total spending in the last 30 days is {}.",
            format_dollars(summary.total)
        ),
        FactKind::Recurring if snapshot.recurring.is_empty() => {
            "There are NO recurring purchases in the last 90 days.".to_string()
        }
        FactKind::Recurring => format!(
            "Yes, recurring purchases were found:\n{}\nList all of them clearly.",
            recurring_lines(snapshot)
        ),
        FactKind::Average => format!(
            "The average spending per transaction is {}.",
            format_dollars(summary.avg)
        ),
        FactKind::Categories => format!("Spending by category:\n{}", category_lines(snapshot)),
        FactKind::TransactionCount => format!(
            "There are {} {} in the last 30 days.",
            summary.count,
            transactions_label(summary.count)
        ),
        FactKind::CalendarMonth => format!(
            "Spending this calendar month is {}.",
            format_dollars(snapshot.monthly_total)
        ),
    };
    format!("{DIRECT_ANSWER_MARKER}: {body}")
}

/// Fact to inject for `question`, or `None` for open-ended questions.
pub fn derive_fact(question: &str, snapshot: &SpendingSnapshot) -> Option<String> {
    match_fact_rule(question).map(|kind| render_fact(kind, snapshot))
}
