use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entry::AccountId;

/// Client record synced from the external billing source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalClient {
    pub id: String,
    pub account_id: AccountId,
    pub name: String,
}

/// Matter record owned by the external billing source, reachable from an
/// account through its client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMatter {
    pub id: String,
    pub client_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEntry {
    pub id: String,
    pub matter_id: String,
    pub created_at: DateTime<Utc>,
}
