pub mod summary_service;

pub use summary_service::{SpendingSnapshot, SummaryService, RECENT_TRANSACTION_LIMIT};
