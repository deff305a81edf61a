//! Spending ledger: transaction records, the persisted store, analytics and manual bills.

pub mod analytics;
pub mod bills;
pub mod category;
pub mod store;
pub mod transaction;

pub use analytics::{
    calendar_month_total, category_breakdown, detect_recurring, rolling_summary, CategoryBucket,
    RecurringGroup, RollingWindow, Summary,
};
pub use bills::{total_monthly_commitment, BillBook, BillCycle, ManualBill, BILLS_KEY};
pub use category::{canonical_category, CATEGORY_LABELS};
pub use store::{LedgerStore, TRANSACTIONS_KEY};
pub use transaction::{Transaction, TransactionDraft};
