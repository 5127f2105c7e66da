use chrono::{SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::{
    convert::Infallible,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

/// Delivery status of a parcel.
///
/// Statuses are stored as text and never validated, so unknown values are
/// kept verbatim in [`ParcelStatus::Other`]. Equality and hashing go by the
/// stored text, so `Other("sent")` and `Sent` are the same status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParcelStatus {
    Registered,
    Sent,
    Delivered,
    Other(String),
}

impl ParcelStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ParcelStatus::Registered => "registered",
            ParcelStatus::Sent => "sent",
            ParcelStatus::Delivered => "delivered",
            ParcelStatus::Other(status) => status,
        }
    }

    /// Next step of the usual delivery lifecycle. The store itself does not
    /// enforce transitions; this is for callers that want to advance a parcel.
    pub fn next(&self) -> Option<ParcelStatus> {
        match self.as_str() {
            "registered" => Some(ParcelStatus::Sent),
            "sent" => Some(ParcelStatus::Delivered),
            _ => None,
        }
    }
}

impl PartialEq for ParcelStatus {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ParcelStatus {}

impl Hash for ParcelStatus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ParcelStatus {
    fn from(value: &str) -> Self {
        match value {
            "registered" => ParcelStatus::Registered,
            "sent" => ParcelStatus::Sent,
            "delivered" => ParcelStatus::Delivered,
            other => ParcelStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ParcelStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "registered" | "sent" | "delivered" => ParcelStatus::from(value.as_str()),
            _ => ParcelStatus::Other(value),
        }
    }
}

impl From<ParcelStatus> for String {
    fn from(status: ParcelStatus) -> Self {
        match status {
            ParcelStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ParcelStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ParcelStatus::from(s))
    }
}

impl ToSql for ParcelStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ParcelStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(ParcelStatus::from)
    }
}

/// A tracked delivery record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Assigned by storage on insert; ignored by `ParcelStore::add`
    pub number: i64,
    pub client: i64,
    pub status: ParcelStatus,
    pub address: String,
    /// RFC3339 timestamp
    pub created_at: String,
}

impl Parcel {
    /// A fresh `registered` parcel stamped with the current UTC time.
    pub fn new(client: i64, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
