use crate::domain::commands::accounts::CreateAccountCommand;
use crate::domain::models::account::{
    Account as DomainAccount, AccountStatus as DomainAccountStatus,
};
use shared::{
    Account as SharedAccount, AccountStatus as SharedAccountStatus, CreateAccountRequest,
};

use super::format_timestamp;

pub struct AccountMapper;

impl AccountMapper {
    pub fn to_dto(domain: DomainAccount) -> SharedAccount {
        SharedAccount {
            created_at: format_timestamp(&domain.created_at),
            updated_at: format_timestamp(&domain.updated_at),
            id: domain.id,
            owner_id: domain.owner_id,
            display_name: domain.display_name,
            address: domain.address,
            group_id: domain.group_id,
            balance: domain.balance,
            target: domain.target,
            status: Self::to_dto_status(domain.status),
        }
    }

    pub fn to_create_command(request: CreateAccountRequest) -> CreateAccountCommand {
        CreateAccountCommand {
            owner_id: request.owner_id,
            display_name: request.display_name,
            address: request.address,
            group_id: request.group_id,
            target: request.target,
        }
    }

    pub fn to_domain_status(dto_status: SharedAccountStatus) -> DomainAccountStatus {
        match dto_status {
            SharedAccountStatus::Active => DomainAccountStatus::Active,
            SharedAccountStatus::Inactive => DomainAccountStatus::Inactive,
        }
    }

    fn to_dto_status(domain_status: DomainAccountStatus) -> SharedAccountStatus {
        match domain_status {
            DomainAccountStatus::Active => SharedAccountStatus::Active,
            DomainAccountStatus::Inactive => SharedAccountStatus::Inactive,
        }
    }
}
