use std::sync::Arc;

use tracing::{debug, info, warn};

use super::transaction::{Transaction, TransactionDraft};
use crate::{core::time::Clock, errors::LedgerError, storage::KeyValueStore};

/// Key the transaction collection is persisted under.
pub const TRANSACTIONS_KEY: &str = "zenith-txns";

/// Owns the ordered transaction collection and keeps it mirrored in storage.
///
/// The in-memory order is insertion order; [`LedgerStore::get_all`] reverses it.
pub struct LedgerStore {
    transactions: Vec<Transaction>,
    next_id: u64,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl LedgerStore {
    /// Creates an empty store. Call [`LedgerStore::initialize`] to load persisted data.
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transactions: Vec::new(),
            next_id: 1,
            storage,
            clock,
        }
    }

    /// Loads persisted transactions. Any failure leaves an empty ledger behind
    /// and is only logged.
    pub fn initialize(&mut self) {
        match self.load_persisted() {
            Ok((transactions, next_id)) => {
                self.next_id = next_id;
                info!(
                    count = transactions.len(),
                    next_id = self.next_id,
                    "ledger loaded"
                );
                self.transactions = transactions;
            }
            Err(err) => {
                warn!(error = %err, "ledger load failed; starting empty");
                self.transactions.clear();
                self.next_id = 1;
            }
        }
    }

    fn load_persisted(&self) -> Result<(Vec<Transaction>, u64), LedgerError> {
        let transactions = match self.storage.get(TRANSACTIONS_KEY)? {
            Some(data) if !data.trim().is_empty() => {
                let parsed: Option<Vec<Transaction>> = serde_json::from_str(&data)?;
                parsed.unwrap_or_default()
            }
            _ => {
                debug!("no persisted ledger found");
                Vec::new()
            }
        };
        let highest = transactions.iter().map(|t| t.id).max().unwrap_or(0);
        let next_id = highest.checked_add(1).ok_or_else(ids_exhausted)?;
        Ok((transactions, next_id))
    }

    /// Validates `draft`, assigns the next id and a creation timestamp, appends
    /// it and writes the whole collection back before returning.
    ///
    /// On a failed write the append is undone; the id stays consumed.
    pub fn add(&mut self, draft: TransactionDraft) -> Result<Transaction, LedgerError> {
        let draft = draft.validate()?;
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or_else(ids_exhausted)?;

        let transaction = Transaction {
            id,
            amount: draft.amount,
            category: draft.category,
            item: draft.item,
            vendor: draft.vendor,
            date: Some(draft.date.unwrap_or_else(|| self.clock.today())),
            created_at: self.clock.now(),
        };
        self.transactions.push(transaction.clone());

        if let Err(err) = self.persist() {
            self.transactions.pop();
            warn!(id, error = %err, "failed to persist transaction");
            return Err(err);
        }

        info!(
            id,
            amount = transaction.amount,
            category = %transaction.category,
            "transaction added"
        );
        Ok(transaction)
    }

    fn persist(&self) -> Result<(), LedgerError> {
        let json = serde_json::to_string(&self.transactions)?;
        self.storage.set(TRANSACTIONS_KEY, &json)
    }

    /// Returns every transaction, most recent first.
    pub fn get_all(&self) -> Vec<Transaction> {
        self.transactions.iter().rev().cloned().collect()
    }

    /// The `limit` most recent transactions, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Transaction> {
        self.transactions.iter().rev().take(limit).cloned().collect()
    }

    /// Borrowed view in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Id the next successful [`LedgerStore::add`] will assign.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

fn ids_exhausted() -> LedgerError {
    LedgerError::Storage("transaction id space exhausted".to_string())
}
