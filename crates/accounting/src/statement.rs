use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use receivables_core::{CustomerId, Money};

/// Kind of activity on a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[serde(alias = "Invoice")]
    Invoice,
    #[serde(alias = "Payment")]
    Payment,
    #[serde(alias = "Credit Note")]
    CreditNote,
    #[serde(alias = "Debit Note")]
    DebitNote,
    #[serde(alias = "Adjustment")]
    Adjustment,
}

/// One posting on the customer account.
///
/// Debits increase the receivable (invoices), credits decrease it (payments,
/// credit notes). Both sides are non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub reference: String,
    pub description: Option<String>,
    pub debit: Money,
    pub credit: Money,
}

impl StatementEntry {
    pub fn net(&self) -> Money {
        self.debit - self.credit
    }
}

/// A statement entry with the running balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub entry: StatementEntry,
    pub balance: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl StatementPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, StatementError> {
        if start > end {
            return Err(StatementError::InvertedPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("statement period starts {start} after it ends {end}")]
    InvertedPeriod { start: NaiveDate, end: NaiveDate },

    #[error("entry {reference} has a negative debit or credit")]
    NegativeAmount { reference: String },
}

/// Customer statement for a period with running balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerStatement {
    customer_id: CustomerId,
    period: StatementPeriod,
    opening_balance: Money,
    lines: Vec<StatementLine>,
    closing_balance: Money,
}

impl CustomerStatement {
    /// Build a statement from the balance brought forward and the account's
    /// entries.
    ///
    /// Entries dated before the period are folded into the opening balance;
    /// entries after it are left out. Same-day entries keep their input order.
    pub fn build(
        customer_id: CustomerId,
        period: StatementPeriod,
        brought_forward: Money,
        entries: impl IntoIterator<Item = StatementEntry>,
    ) -> Result<Self, StatementError> {
        let mut entries: Vec<StatementEntry> = entries.into_iter().collect();
        if let Some(bad) = entries
            .iter()
            .find(|e| e.debit.is_negative() || e.credit.is_negative())
        {
            return Err(StatementError::NegativeAmount {
                reference: bad.reference.clone(),
            });
        }
        entries.sort_by_key(|e| e.date);

        let mut opening_balance = brought_forward;
        let mut balance = brought_forward;
        let mut lines = Vec::new();

        for entry in entries {
            if entry.date < period.start() {
                opening_balance += entry.net();
                balance = opening_balance;
            } else if period.contains(entry.date) {
                balance += entry.net();
                lines.push(StatementLine { entry, balance });
            }
        }

        Ok(Self {
            customer_id,
            period,
            opening_balance,
            lines,
            closing_balance: balance,
        })
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn period(&self) -> StatementPeriod {
        self.period
    }

    pub fn opening_balance(&self) -> Money {
        self.opening_balance
    }

    pub fn closing_balance(&self) -> Money {
        self.closing_balance
    }

    pub fn lines(&self) -> &[StatementLine] {
        &self.lines
    }

    pub fn total_debits(&self) -> Money {
        self.lines.iter().map(|l| l.entry.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.lines.iter().map(|l| l.entry.credit).sum()
    }
}
