//! Text payload printed as a QR code on an account's card.
//!
//! Rendering and scanning the image happen on the client; the ledger only
//! produces the payload and resolves a scanned one back to an account ID.

use shared::AccountCard;

use crate::domain::errors::{LedgerError, LedgerResult};
use crate::domain::models::account::Account;

pub fn card_for(account: &Account) -> AccountCard {
    AccountCard {
        account_id: account.id.clone(),
        owner_id: account.owner_id.clone(),
        display_name: account.display_name.clone(),
    }
}

pub fn encode_payload(card: &AccountCard) -> LedgerResult<String> {
    serde_json::to_string(card).map_err(|e| LedgerError::Storage(e.into()))
}

/// Parse a scanned payload. Anything that is not a card with an account ID
/// is a validation error.
pub fn decode_payload(payload: &str) -> LedgerResult<AccountCard> {
    let card: AccountCard = serde_json::from_str(payload.trim())
        .map_err(|e| LedgerError::validation(format!("Unreadable account card: {}", e)))?;
    if card.account_id.trim().is_empty() {
        return Err(LedgerError::validation("Account card has no account ID"));
    }
    Ok(card)
}
