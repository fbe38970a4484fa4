//! Domain model for a savings account.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AccountStatus::Active),
            "INACTIVE" => Ok(AccountStatus::Inactive),
            other => Err(anyhow::anyhow!("Unknown account status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub owner_id: String,
    pub display_name: String,
    pub address: String,
    pub group_id: String,
    /// Maintained projection of accepted transactions; only the approval
    /// workflow writes it.
    pub balance: i64,
    pub target: i64,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Generate the human-readable account ID for a group.
    /// Format: KCLG-<group>-<sequence padded to 3 digits>
    /// Example: KCLG-0102-001
    pub fn generate_id(group_id: &str, sequence: u32) -> String {
        format!("KCLG-{}-{:03}", group_id, sequence)
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn has_reached_target(&self) -> bool {
        self.target > 0 && self.balance >= self.target
    }
}
