//! Caller identity as supplied by the session provider.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Resident,
    BlockOperator,
    Admin,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RESIDENT" => Ok(Role::Resident),
            "BLOCK_OPERATOR" => Ok(Role::BlockOperator),
            "ADMIN" => Ok(Role::Admin),
            other => Err(anyhow::anyhow!("Unknown role: {}", other)),
        }
    }
}

/// Who is performing an operation. Passed explicitly into every workflow call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.role, Role::BlockOperator | Role::Admin)
    }
}
