//! Account store: account metadata and the balance projection.
//!
//! Accounts are opened and toggled by operators. The balance is never
//! written here; see `approval_service` for the only writer.

use log::info;
use std::sync::Arc;

use crate::config::{LedgerPolicy, StorePolicy};
use crate::domain::commands::accounts::CreateAccountCommand;
use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::{
    account::{Account, AccountStatus},
    actor::Actor,
};
use crate::domain::timestamp_now;
use crate::storage::call_policy::{read_with_retry, write_once};
use crate::storage::{AccountStorage, Connection};

const MAX_DISPLAY_NAME_LENGTH: usize = 100;

#[derive(Clone)]
pub struct AccountService<C: Connection> {
    account_repository: C::AccountRepository,
    policy: LedgerPolicy,
    store_policy: StorePolicy,
}

impl<C: Connection> AccountService<C> {
    pub fn new(connection: Arc<C>, policy: LedgerPolicy, store_policy: StorePolicy) -> Self {
        Self {
            account_repository: connection.create_account_repository(),
            policy,
            store_policy,
        }
    }

    /// Open a new account with zero balance in ACTIVE state
    pub async fn create_account(
        &self,
        command: CreateAccountCommand,
        actor: &Actor,
    ) -> LedgerResult<Account> {
        require_operator(actor, "open accounts")?;
        self.validate_create_command(&command)?;

        let group_id = command.group_id.trim().to_string();
        let sequence = read_with_retry(&self.store_policy, "next_account_sequence", || {
            self.account_repository.next_account_sequence(&group_id)
        })
        .await?;

        let now = timestamp_now();
        let account = Account {
            id: Account::generate_id(&group_id, sequence),
            owner_id: command.owner_id.trim().to_string(),
            display_name: command.display_name.trim().to_string(),
            address: command.address.trim().to_string(),
            group_id,
            balance: 0,
            target: command.target,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };

        write_once(
            &self.store_policy,
            "store_account",
            self.account_repository.store_account(&account),
        )
        .await?;

        info!(
            "Account {} opened for {} by {} (target {})",
            account.id, account.owner_id, actor.id, account.target
        );
        Ok(account)
    }

    /// Activate or deactivate an account. Setting the current status again is a no-op.
    pub async fn set_status(
        &self,
        account_id: &str,
        status: AccountStatus,
        actor: &Actor,
    ) -> LedgerResult<Account> {
        require_operator(actor, "change account status")?;

        let account = self.get_account(account_id).await?;
        if account.status == status {
            return Ok(account);
        }

        let now = timestamp_now();
        let found = write_once(
            &self.store_policy,
            "update_account_status",
            self.account_repository
                .update_account_status(account_id, status, now),
        )
        .await?;
        if !found {
            return Err(LedgerError::account_not_found(account_id));
        }

        info!("Account {} set to {} by {}", account_id, status, actor.id);
        Ok(Account {
            status,
            updated_at: now,
            ..account
        })
    }

    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Account> {
        read_with_retry(&self.store_policy, "get_account", || {
            self.account_repository.get_account(account_id)
        })
        .await?
        .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    /// Current balance projection; may trail approvals still in flight
    pub async fn get_balance(&self, account_id: &str) -> LedgerResult<i64> {
        Ok(self.get_account(account_id).await?.balance)
    }

    pub async fn list_accounts(&self, group_id: &str) -> LedgerResult<Vec<Account>> {
        Ok(read_with_retry(&self.store_policy, "list_accounts", || {
            self.account_repository.list_accounts_by_group(group_id)
        })
        .await?)
    }

    fn validate_create_command(&self, command: &CreateAccountCommand) -> LedgerResult<()> {
        let display_name = command.display_name.trim();
        if display_name.is_empty() {
            return Err(LedgerError::validation("Display name cannot be empty"));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(LedgerError::validation(format!(
                "Display name cannot exceed {} characters",
                MAX_DISPLAY_NAME_LENGTH
            )));
        }
        if command.owner_id.trim().is_empty() {
            return Err(LedgerError::validation("Owner ID cannot be empty"));
        }
        let group_id = command.group_id.trim();
        if group_id.is_empty() || !group_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LedgerError::validation(
                "Group ID must be a non-empty alphanumeric code",
            ));
        }
        if command.target < self.policy.min_target {
            return Err(LedgerError::validation(format!(
                "Target must be at least {}",
                self.policy.min_target
            )));
        }
        Ok(())
    }
}

pub(crate) fn require_operator(actor: &Actor, action: &str) -> LedgerResult<()> {
    if actor.is_operator() {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(format!(
            "{} is not allowed to {}",
            actor.id, action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::actor::Role;
    use crate::domain::test_support::{operator, TestLedger};
    use crate::storage::scripted::ScriptedConnection;

    fn command(display_name: &str, target: i64) -> CreateAccountCommand {
        CreateAccountCommand {
            owner_id: "u-1".to_string(),
            display_name: display_name.to_string(),
            address: "Jl. Kenanga 5".to_string(),
            group_id: "0102".to_string(),
            target,
        }
    }

    #[tokio::test]
    async fn test_create_account_starts_active_with_zero_balance() {
        let ledger = TestLedger::new().await;
        let account = ledger
            .accounts
            .create_account(command("  Bu Siti  ", 500_000), &operator())
            .await
            .unwrap();

        assert_eq!(account.id, "KCLG-0102-001");
        assert_eq!(account.display_name, "Bu Siti");
        assert_eq!(account.balance, 0);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(ledger.accounts.get_balance(&account.id).await.unwrap(), 0);

        let second = ledger
            .accounts
            .create_account(command("Pak Budi", 500_000), &operator())
            .await
            .unwrap();
        assert_eq!(second.id, "KCLG-0102-002");
    }

    #[tokio::test]
    async fn test_sequence_read_is_retried_once() {
        let connection = Arc::new(ScriptedConnection::new_in_memory().await.unwrap());
        let ledger = TestLedger::over(connection.clone());

        connection.script.fail_sequence_reads(1);
        let account = ledger
            .accounts
            .create_account(command("Bu Siti", 500_000), &operator())
            .await
            .unwrap();
        assert_eq!(account.id, "KCLG-0102-001");

        connection.script.fail_sequence_reads(2);
        let result = ledger
            .accounts
            .create_account(command("Pak Budi", 500_000), &operator())
            .await;
        assert!(matches!(result, Err(LedgerError::Storage(_))));
        assert_eq!(ledger.accounts.list_accounts("0102").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_account_validation() {
        let ledger = TestLedger::new().await;
        let min_target = ledger.policy.min_target;

        let empty_name = ledger.accounts.create_account(command("   ", 500_000), &operator()).await;
        assert!(matches!(empty_name, Err(LedgerError::Validation(_))));

        let low_target = ledger
            .accounts
            .create_account(command("Bu Siti", min_target - 1), &operator())
            .await;
        assert!(matches!(low_target, Err(LedgerError::Validation(_))));

        let mut bad_group = command("Bu Siti", 500_000);
        bad_group.group_id = "01/02".to_string();
        let bad_group = ledger.accounts.create_account(bad_group, &operator()).await;
        assert!(matches!(bad_group, Err(LedgerError::Validation(_))));

        assert!(ledger
            .accounts
            .create_account(command("Bu Siti", min_target), &operator())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_residents_cannot_open_accounts() {
        let ledger = TestLedger::new().await;
        let resident = Actor::new("u-1", Role::Resident);
        let result = ledger.accounts.create_account(command("Bu Siti", 500_000), &resident).await;
        assert!(matches!(result, Err(LedgerError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_set_status_is_idempotent() {
        let ledger = TestLedger::new().await;
        let account = ledger.open_account("0102", 500_000).await;

        let inactive = ledger
            .accounts
            .set_status(&account.id, AccountStatus::Inactive, &operator())
            .await
            .unwrap();
        assert_eq!(inactive.status, AccountStatus::Inactive);

        let again = ledger
            .accounts
            .set_status(&account.id, AccountStatus::Inactive, &operator())
            .await
            .unwrap();
        assert_eq!(again.status, AccountStatus::Inactive);
        assert_eq!(again.updated_at, inactive.updated_at);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let ledger = TestLedger::new().await;
        let status = ledger
            .accounts
            .set_status("KCLG-9999-001", AccountStatus::Inactive, &operator())
            .await;
        assert!(matches!(status, Err(LedgerError::NotFound { .. })));
        assert!(matches!(
            ledger.accounts.get_balance("KCLG-9999-001").await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_accounts_is_scoped_to_group() {
        let ledger = TestLedger::new().await;
        ledger.open_account("0102", 500_000).await;
        ledger.open_account("0102", 500_000).await;
        ledger.open_account("0201", 500_000).await;

        let accounts = ledger.accounts.list_accounts("0102").await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.group_id == "0102"));
    }
}
