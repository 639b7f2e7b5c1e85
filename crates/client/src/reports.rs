use chrono::NaiveDate;
use serde::Deserialize;

use receivables_accounting::{
    AgingReport, CustomerStatement, EntryKind, StatementEntry, StatementPeriod,
};
use receivables_core::{CustomerId, Money};

use crate::envelope;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::wire::required_date;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementLineDto {
    #[serde(deserialize_with = "required_date")]
    date: NaiveDate,
    #[serde(rename = "type", alias = "kind")]
    kind: EntryKind,
    reference: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    debit: Money,
    #[serde(default)]
    credit: Money,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementDto {
    #[serde(default)]
    opening_balance: Money,
    #[serde(default)]
    closing_balance: Option<Money>,
    #[serde(default, alias = "lines")]
    line_items: Vec<StatementLineDto>,
}

/// Aging analysis and customer statements.
#[derive(Debug, Clone)]
pub struct HttpReportClient {
    api: ApiClient,
}

impl HttpReportClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Aging for all customers, or one when `customer_id` is given. The
    /// backend's reporting date applies when `as_of` is `None`.
    pub async fn aging(
        &self,
        as_of: Option<NaiveDate>,
        customer_id: Option<&CustomerId>,
    ) -> Result<AgingReport, ClientError> {
        let mut query = Vec::new();
        if let Some(date) = as_of {
            query.push(("as_of_date", date.to_string()));
        }
        if let Some(id) = customer_id {
            query.push(("customer_id", id.to_string()));
        }
        let body = self.api.get("reports/aging", &query).await?;
        envelope::decode(body)
    }

    /// Fetch a statement and rebuild its running balances locally.
    pub async fn statement(
        &self,
        customer_id: &CustomerId,
        period: StatementPeriod,
    ) -> Result<CustomerStatement, ClientError> {
        let query = [
            ("customer_id", customer_id.to_string()),
            ("start_date", period.start().to_string()),
            ("end_date", period.end().to_string()),
        ];
        let body = self.api.get("reports/statement", &query).await?;
        let dto: StatementDto = envelope::decode(body)?;

        let entries = dto.line_items.into_iter().map(|l| StatementEntry {
            date: l.date,
            kind: l.kind,
            reference: l.reference,
            description: l.description,
            debit: l.debit,
            credit: l.credit,
        });
        let statement =
            CustomerStatement::build(customer_id.clone(), period, dto.opening_balance, entries)
                .map_err(|e| ClientError::UnexpectedShape(e.to_string()))?;

        if let Some(reported) = dto.closing_balance.filter(|r| *r != statement.closing_balance()) {
            tracing::warn!(
                customer_id = %customer_id,
                reported = %reported,
                computed = %statement.closing_balance(),
                "statement closing balance differs from backend"
            );
        }

        Ok(statement)
    }
}
