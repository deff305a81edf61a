//! Aggregations over the ledger. Every function takes the full transaction
//! slice in insertion order plus the evaluation date and rescans it; nothing
//! is cached, so equal inputs always give equal outputs.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::transaction::Transaction;
use crate::utils::money::round_cents;

/// Days covered by the rolling summary and the category breakdown.
pub const SUMMARY_WINDOW_DAYS: i64 = 30;
/// Days scanned for repeat purchases.
pub const RECURRING_WINDOW_DAYS: i64 = 90;
/// Occurrences needed before a grouping key counts as recurring.
pub const RECURRING_MIN_COUNT: usize = 2;

/// Trailing window of `days` ending at the evaluation date, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    pub days: i64,
}

impl RollingWindow {
    pub const fn days(days: i64) -> Self {
        Self { days }
    }

    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.days)
    }

    /// True when the transaction's date is on or after `today - days`.
    /// Records without a readable date are never inside a window.
    pub fn contains(&self, transaction: &Transaction, today: NaiveDate) -> bool {
        match transaction.date {
            Some(date) => date >= self.start(today),
            None => {
                debug!(id = transaction.id, "excluding transaction without a date");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: f64,
    pub count: usize,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub category: String,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringGroup {
    pub name: String,
    pub category: String,
    pub avg: f64,
    pub total: f64,
    pub count: usize,
}

/// Totals for the last 30 days.
pub fn rolling_summary(transactions: &[Transaction], today: NaiveDate) -> Summary {
    let window = RollingWindow::days(SUMMARY_WINDOW_DAYS);
    let (total, count) = transactions
        .iter()
        .filter(|txn| window.contains(txn, today))
        .fold((0.0, 0usize), |(total, count), txn| {
            (total + txn.amount, count + 1)
        });
    let avg = if count > 0 { total / count as f64 } else { 0.0 };
    Summary {
        total: round_cents(total),
        count,
        avg: round_cents(avg),
    }
}

/// Per-category totals for the last 30 days, largest first. Ties keep the
/// order in which categories were first seen.
pub fn category_breakdown(transactions: &[Transaction], today: NaiveDate) -> Vec<CategoryBucket> {
    let window = RollingWindow::days(SUMMARY_WINDOW_DAYS);
    let groups = group_in_order(
        transactions.iter().filter(|txn| window.contains(txn, today)),
        |txn| txn.category.clone(),
    );

    let mut buckets: Vec<CategoryBucket> = groups
        .into_iter()
        .map(|(category, members)| CategoryBucket {
            category,
            amount: members.iter().map(|txn| txn.amount).sum(),
            count: members.len(),
        })
        .collect();
    buckets.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    for bucket in &mut buckets {
        bucket.amount = round_cents(bucket.amount);
    }
    buckets
}

/// Repeat purchases in the last 90 days, grouped by
/// [`Transaction::grouping_key`]. Only keys seen at least twice are reported,
/// most frequent first; ties keep first-seen order. A group's category is the
/// category of its earliest-inserted member.
pub fn detect_recurring(transactions: &[Transaction], today: NaiveDate) -> Vec<RecurringGroup> {
    let window = RollingWindow::days(RECURRING_WINDOW_DAYS);
    let groups = group_in_order(
        transactions.iter().filter(|txn| window.contains(txn, today)),
        Transaction::grouping_key,
    );

    let mut recurring: Vec<RecurringGroup> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= RECURRING_MIN_COUNT)
        .map(|(name, members)| {
            let total: f64 = members.iter().map(|txn| txn.amount).sum();
            let count = members.len();
            RecurringGroup {
                name,
                category: members[0].category.clone(),
                avg: round_cents(total / count as f64),
                total: round_cents(total),
                count,
            }
        })
        .collect();
    recurring.sort_by(|a, b| b.count.cmp(&a.count));
    recurring
}

/// Spending in the calendar month (and year) containing `today`.
pub fn calendar_month_total(transactions: &[Transaction], today: NaiveDate) -> f64 {
    let total: f64 = transactions
        .iter()
        .filter(|txn| {
            txn.date
                .map(|date| date.year() == today.year() && date.month() == today.month())
                .unwrap_or(false)
        })
        .map(|txn| txn.amount)
        .sum();
    round_cents(total)
}

/// Groups items by key, preserving the order keys were first encountered.
fn group_in_order<'a, I, F>(items: I, key_fn: F) -> Vec<(String, Vec<&'a Transaction>)>
where
    I: Iterator<Item = &'a Transaction>,
    F: Fn(&Transaction) -> String,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&'a Transaction>)> = Vec::new();
    for txn in items {
        let key = key_fn(txn);
        match positions.get(&key) {
            Some(&index) => groups[index].1.push(txn),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![txn]));
            }
        }
    }
    groups
}
