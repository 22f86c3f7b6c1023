use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Time,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "TIME",
            Self::Expense => "EXPENSE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TIME" => Some(Self::Time),
            "EXPENSE" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// A billable time or expense record. Prices are integer cents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub matter_name: String,
    pub transaction_type: TransactionType,
    pub time_spent: Option<String>,
    pub price: Option<i64>,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub matter_name_in: Option<Vec<String>>,
    pub account_id: Option<AccountId>,
}

impl EntryFilter {
    pub fn for_account(account_id: AccountId) -> Self {
        Self { matter_name_in: None, account_id: Some(account_id) }
    }

    pub fn with_matter_names(mut self, names: Vec<String>) -> Self {
        self.matter_name_in = Some(names);
        self
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        let account_ok =
            self.account_id.as_ref().map_or(true, |account| &entry.account_id == account);
        let matter_ok = self
            .matter_name_in
            .as_ref()
            .map_or(true, |names| names.iter().any(|name| name == &entry.matter_name));
        account_ok && matter_ok
    }
}
