//! Strongly-typed identifiers used across the domain.
//!
//! The AR backend hands out opaque identifiers, sometimes as JSON strings and
//! sometimes as integers (customers). Every id is normalized to a trimmed,
//! non-empty string at the boundary.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// Identifier of a customer (the AR party).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CustomerId(String);

/// Identifier of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InvoiceId(String);

/// Identifier of a receipt (a recorded customer payment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReceiptId(String);

/// Identifier of a workflow (refund/discount) request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WorkflowRequestId(String);

/// Wire representation accepted for identifiers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

macro_rules! impl_string_id {
    ($t:ident, $name:literal) => {
        impl $t {
            /// Create an identifier; surrounding whitespace is trimmed and the
            /// result must not be empty.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = RawId::deserialize(deserializer)?;
                Self::new(raw.into_string()).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_string_id!(CustomerId, "CustomerId");
impl_string_id!(InvoiceId, "InvoiceId");
impl_string_id!(ReceiptId, "ReceiptId");
impl_string_id!(WorkflowRequestId, "WorkflowRequestId");
