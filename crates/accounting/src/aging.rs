//! Receivables aging analysis.
//!
//! Open balances are bucketed by days past due as of a reporting date:
//! current (up to 30 days, including not yet due), 31-60, 61-90, 91-120 and
//! over 120.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use receivables_core::{CustomerId, Money};
use receivables_invoicing::Invoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgingBucket {
    Current,
    Days31To60,
    Days61To90,
    Days91To120,
    Over120,
}

impl AgingBucket {
    pub fn for_days_past_due(days: i64) -> Self {
        match days {
            d if d <= 30 => AgingBucket::Current,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            91..=120 => AgingBucket::Days91To120,
            _ => AgingBucket::Over120,
        }
    }
}

/// Amounts per bucket plus their total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingBuckets {
    pub current: Money,
    pub days30: Money,
    pub days60: Money,
    pub days90: Money,
    pub days120_plus: Money,
    pub total: Money,
}

impl AgingBuckets {
    pub fn add(&mut self, bucket: AgingBucket, amount: Money) {
        let slot = match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Days31To60 => &mut self.days30,
            AgingBucket::Days61To90 => &mut self.days60,
            AgingBucket::Days91To120 => &mut self.days90,
            AgingBucket::Over120 => &mut self.days120_plus,
        };
        *slot += amount;
        self.total += amount;
    }

    pub fn get(&self, bucket: AgingBucket) -> Money {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Days31To60 => self.days30,
            AgingBucket::Days61To90 => self.days60,
            AgingBucket::Days91To120 => self.days90,
            AgingBucket::Over120 => self.days120_plus,
        }
    }

    pub fn merge(&mut self, other: &AgingBuckets) {
        self.current += other.current;
        self.days30 += other.days30;
        self.days60 += other.days60;
        self.days90 += other.days90;
        self.days120_plus += other.days120_plus;
        self.total += other.total;
    }

    /// Amount more than 30 days past due.
    pub fn overdue(&self) -> Money {
        self.total - self.current
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAging {
    pub customer_id: CustomerId,
    pub customer_name: String,
    #[serde(default)]
    pub customer_code: Option<String>,
    pub aging: AgingBuckets,
}

impl CustomerAging {
    /// Age a customer's invoices. Only invoices that can still receive
    /// payment count; undated invoices are current.
    pub fn from_invoices<'a>(
        customer_id: CustomerId,
        customer_name: impl Into<String>,
        customer_code: Option<String>,
        invoices: impl IntoIterator<Item = &'a Invoice>,
        as_of: NaiveDate,
    ) -> Self {
        let mut aging = AgingBuckets::default();
        for inv in invoices.into_iter().filter(|i| i.can_accept_payment()) {
            let bucket = inv
                .days_past_due(as_of)
                .map(AgingBucket::for_days_past_due)
                .unwrap_or(AgingBucket::Current);
            aging.add(bucket, inv.balance);
        }

        Self {
            customer_id,
            customer_name: customer_name.into(),
            customer_code,
            aging,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    pub as_of_date: NaiveDate,
    pub customers: Vec<CustomerAging>,
    pub totals: AgingBuckets,
}

impl AgingReport {
    pub fn new(as_of_date: NaiveDate, customers: Vec<CustomerAging>) -> Self {
        let mut totals = AgingBuckets::default();
        for c in &customers {
            totals.merge(&c.aging);
        }
        Self {
            as_of_date,
            customers,
            totals,
        }
    }
}
