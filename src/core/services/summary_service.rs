use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::{
    analytics::{self, CategoryBucket, RecurringGroup, Summary},
    LedgerStore, Transaction,
};

/// Most recent transactions carried in a snapshot.
pub const RECENT_TRANSACTION_LIMIT: usize = 10;

/// Everything the coach knows about the ledger at the moment a question is asked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSnapshot {
    pub last_30_days: Summary,
    pub monthly_total: f64,
    pub categories: Vec<CategoryBucket>,
    pub recurring: Vec<RecurringGroup>,
    /// Size of the whole ledger, not of any window.
    pub transaction_count: usize,
    /// Newest first.
    pub recent_transactions: Vec<Transaction>,
}

pub struct SummaryService;

impl SummaryService {
    /// Recomputes every aggregate from the store's current contents, evaluated
    /// against the store's clock.
    pub fn snapshot(store: &LedgerStore) -> SpendingSnapshot {
        Self::snapshot_at(store, store.clock().today())
    }

    pub fn snapshot_at(store: &LedgerStore, today: NaiveDate) -> SpendingSnapshot {
        let transactions = store.transactions();
        SpendingSnapshot {
            last_30_days: analytics::rolling_summary(transactions, today),
            monthly_total: analytics::calendar_month_total(transactions, today),
            categories: analytics::category_breakdown(transactions, today),
            recurring: analytics::detect_recurring(transactions, today),
            transaction_count: store.len(),
            recent_transactions: store.recent(RECENT_TRANSACTION_LIMIT),
        }
    }

    pub fn summary(store: &LedgerStore) -> Summary {
        analytics::rolling_summary(store.transactions(), store.clock().today())
    }

    pub fn categories(store: &LedgerStore) -> Vec<CategoryBucket> {
        analytics::category_breakdown(store.transactions(), store.clock().today())
    }

    pub fn recurring(store: &LedgerStore) -> Vec<RecurringGroup> {
        analytics::detect_recurring(store.transactions(), store.clock().today())
    }

    pub fn calendar_month_total(store: &LedgerStore) -> f64 {
        analytics::calendar_month_total(store.transactions(), store.clock().today())
    }
}
