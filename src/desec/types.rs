use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_ttl: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touched: Option<DateTime<Utc>>,
}

/// `records` is always sent, `[]` makes the provider drop the set.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RRSet {
    #[serde(default, skip_serializing)]
    pub domain: String,

    #[serde(default)]
    pub subname: String,

    #[serde(default, skip_serializing)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub records: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    #[serde(default, skip_serializing)]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing)]
    pub touched: Option<DateTime<Utc>>,
}

impl RRSet {
    pub fn new(
        domain: impl Into<String>,
        subname: impl Into<String>,
        kind: impl Into<String>,
        records: Vec<String>,
        ttl: Option<u32>,
    ) -> Self {
        Self {
            domain: domain.into(),
            subname: subname.into(),
            name: String::new(),
            kind: kind.into(),
            records,
            ttl,
            created: None,
            touched: None,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.records.iter().any(|record| record == value)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<String>,
}
