use crate::domain::commands::transactions::{
    CreateTransactionCommand, TransactionListQuery, TransactionListResult,
};
use crate::domain::models::transaction::{
    Transaction as DomainTransaction, TransactionKind as DomainKind,
    TransactionState as DomainState, WithdrawalScope as DomainScope,
};
use shared::{
    CreateTransactionRequest, PaginationInfo, Transaction as SharedTransaction,
    TransactionKind as SharedKind, TransactionListRequest, TransactionListResponse,
    TransactionState as SharedState, WithdrawalScope as SharedScope,
};

use super::format_timestamp;

pub struct TransactionMapper;

impl TransactionMapper {
    pub fn to_dto(domain: DomainTransaction) -> SharedTransaction {
        SharedTransaction {
            created_at: format_timestamp(&domain.created_at),
            decided_at: domain.decided_at.as_ref().map(format_timestamp),
            id: domain.id,
            account_id: domain.account_id,
            kind: Self::to_dto_kind(domain.kind),
            nominal: domain.nominal,
            note: domain.note,
            withdrawal_scope: domain.withdrawal_scope.map(Self::to_dto_scope),
            state: Self::to_dto_state(domain.state),
            requested_by: domain.requested_by,
            decided_by: domain.decided_by,
            rejection_reason: domain.rejection_reason,
            client_token: domain.client_token,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainTransaction>) -> Vec<SharedTransaction> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_create_command(request: CreateTransactionRequest) -> CreateTransactionCommand {
        CreateTransactionCommand {
            account_id: request.account_id,
            kind: Self::to_domain_kind(request.kind),
            nominal: request.nominal,
            note: request.note,
            withdrawal_scope: request.withdrawal_scope.map(Self::to_domain_scope),
            client_token: request.client_token,
        }
    }

    pub fn to_list_query(request: TransactionListRequest) -> TransactionListQuery {
        TransactionListQuery {
            after: request.after,
            limit: request.limit,
        }
    }

    pub fn to_list_response(result: TransactionListResult) -> TransactionListResponse {
        TransactionListResponse {
            transactions: Self::to_dto_list(result.transactions),
            pagination: PaginationInfo {
                has_more: result.pagination.has_more,
                next_cursor: result.pagination.next_cursor,
            },
        }
    }

    fn to_domain_kind(dto_kind: SharedKind) -> DomainKind {
        match dto_kind {
            SharedKind::Deposit => DomainKind::Deposit,
            SharedKind::Withdrawal => DomainKind::Withdrawal,
        }
    }

    fn to_dto_kind(domain_kind: DomainKind) -> SharedKind {
        match domain_kind {
            DomainKind::Deposit => SharedKind::Deposit,
            DomainKind::Withdrawal => SharedKind::Withdrawal,
        }
    }

    fn to_domain_scope(dto_scope: SharedScope) -> DomainScope {
        match dto_scope {
            SharedScope::Partial => DomainScope::Partial,
            SharedScope::Full => DomainScope::Full,
        }
    }

    fn to_dto_scope(domain_scope: DomainScope) -> SharedScope {
        match domain_scope {
            DomainScope::Partial => SharedScope::Partial,
            DomainScope::Full => SharedScope::Full,
        }
    }

    fn to_dto_state(domain_state: DomainState) -> SharedState {
        match domain_state {
            DomainState::Pending => SharedState::Pending,
            DomainState::Accepted => SharedState::Accepted,
            DomainState::Rejected => SharedState::Rejected,
        }
    }
}
