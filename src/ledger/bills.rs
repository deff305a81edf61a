//! User-declared subscriptions and bills, kept apart from detected recurring spend.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{analytics::RecurringGroup, category::canonical_category};
use crate::{
    errors::{LedgerError, ValidationError},
    storage::KeyValueStore,
    utils::money::round_cents,
};

/// Key the bill list is persisted under.
pub const BILLS_KEY: &str = "zenith-manual-bills";

const WEEKS_PER_MONTH: f64 = 4.33;
const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillCycle {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BillCycle {
    pub fn suffix(self) -> &'static str {
        match self {
            BillCycle::Weekly => "/week",
            BillCycle::Monthly => "/month",
            BillCycle::Yearly => "/year",
        }
    }
}

impl fmt::Display for BillCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillCycle::Weekly => "weekly",
            BillCycle::Monthly => "monthly",
            BillCycle::Yearly => "yearly",
        };
        f.write_str(label)
    }
}

impl FromStr for BillCycle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Ok(BillCycle::Weekly),
            "monthly" | "month" => Ok(BillCycle::Monthly),
            "yearly" | "year" | "annual" => Ok(BillCycle::Yearly),
            other => Err(format!("unknown billing cycle `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualBill {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub cycle: BillCycle,
    pub category: String,
}

impl ManualBill {
    /// Builds a validated bill with a fresh id.
    pub fn new(
        name: &str,
        amount: f64,
        cycle: BillCycle,
        category: &str,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::InvalidAmount(amount));
        }
        let category = canonical_category(category)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            amount,
            cycle,
            category: category.to_string(),
        })
    }

    /// Cost normalized to one month.
    pub fn monthly_equivalent(&self) -> f64 {
        match self.cycle {
            BillCycle::Weekly => self.amount * WEEKS_PER_MONTH,
            BillCycle::Monthly => self.amount,
            BillCycle::Yearly => self.amount / MONTHS_PER_YEAR,
        }
    }
}

/// Monthly cost of declared bills plus the average of each detected recurring group.
pub fn total_monthly_commitment(bills: &[ManualBill], detected: &[RecurringGroup]) -> f64 {
    let manual: f64 = bills.iter().map(ManualBill::monthly_equivalent).sum();
    let detected: f64 = detected.iter().map(|group| group.avg).sum();
    round_cents(manual + detected)
}

fn sample_bills() -> Vec<ManualBill> {
    [
        ("Netflix", 15.0, "Entertainment"),
        ("Spotify", 9.0, "Entertainment"),
        ("Gym", 40.0, "Health"),
        ("iCloud", 3.0, "Storage"),
    ]
    .into_iter()
    .filter_map(|(name, amount, category)| {
        ManualBill::new(name, amount, BillCycle::Monthly, category).ok()
    })
    .collect()
}

/// Persisted list of manual bills.
pub struct BillBook {
    bills: Vec<ManualBill>,
    storage: Arc<dyn KeyValueStore>,
}

impl BillBook {
    /// Loads the stored list; unreadable data yields an empty book.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let bills = match read_bills(storage.as_ref()) {
            Ok(bills) => bills,
            Err(err) => {
                warn!(error = %err, "bill list load failed; starting empty");
                Vec::new()
            }
        };
        Self { bills, storage }
    }

    pub fn list(&self) -> &[ManualBill] {
        &self.bills
    }

    pub fn add(&mut self, bill: ManualBill) -> Result<(), LedgerError> {
        let mut bills = self.bills.clone();
        let (name, amount, cycle) = (bill.name.clone(), bill.amount, bill.cycle);
        bills.push(bill);
        self.commit(bills)?;
        info!(name = %name, amount, cycle = %cycle, "bill added");
        Ok(())
    }

    /// Removes the bill with `id`, returning whether one was found.
    pub fn remove(&mut self, id: Uuid) -> Result<bool, LedgerError> {
        let bills: Vec<ManualBill> = self
            .bills
            .iter()
            .filter(|bill| bill.id != id)
            .cloned()
            .collect();
        if bills.len() == self.bills.len() {
            return Ok(false);
        }
        self.commit(bills)?;
        Ok(true)
    }

    /// Adds the sample subscriptions whose names are not present yet; returns how many were added.
    pub fn add_samples(&mut self) -> Result<usize, LedgerError> {
        let mut bills = self.bills.clone();
        let mut added = 0;
        for sample in sample_bills() {
            if bills.iter().any(|bill| bill.name == sample.name) {
                continue;
            }
            bills.push(sample);
            added += 1;
        }
        if added > 0 {
            self.commit(bills)?;
        }
        Ok(added)
    }

    /// Writes `bills` and adopts them only once storage has accepted the write.
    fn commit(&mut self, bills: Vec<ManualBill>) -> Result<(), LedgerError> {
        let json = serde_json::to_string(&bills)?;
        if let Err(err) = self.storage.set(BILLS_KEY, &json) {
            warn!(error = %err, "failed to persist bill list");
            return Err(err);
        }
        self.bills = bills;
        Ok(())
    }
}

fn read_bills(storage: &dyn KeyValueStore) -> Result<Vec<ManualBill>, LedgerError> {
    match storage.get(BILLS_KEY)? {
        Some(data) if !data.trim().is_empty() => {
            let parsed: Option<Vec<ManualBill>> = serde_json::from_str(&data)?;
            Ok(parsed.unwrap_or_default())
        }
        _ => Ok(Vec::new()),
    }
}
