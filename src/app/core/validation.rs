//! Ante handler: the checks and bookkeeping that run before a transaction's messages.

use crate::app::core::gas::GasMeter;
use crate::app::core::state::{ChainState, FEE_COLLECTOR};
use crate::crypto::{verify_signature, Address};
use crate::error::{codes, TxError};
use crate::transaction::{coins_to_string, Tx};

/// Runs the ante checks against `state` and returns the signer.
///
/// On success the fee has been moved to the fee collector and the signer's
/// sequence bumped; the caller decides whether those writes survive.
pub fn ante_handle(
    state: &mut ChainState,
    tx: &Tx,
    tx_len: usize,
    chain_id: &str,
    meter: &mut GasMeter,
    simulate: bool,
) -> Result<Address, TxError> {
    tx.validate_basic(tx_len, simulate)?;

    let params = state
        .auth_params()
        .map_err(|e| TxError::new(codes::INVALID_REQUEST, e.to_string()))?;

    meter.consume(
        params.tx_size_cost_per_byte.saturating_mul(tx_len as u64),
        "txSize",
    )?;

    let memo_len = tx.body.memo.chars().count() as u64;
    if memo_len > params.max_memo_characters {
        return Err(TxError::new(
            codes::MEMO_TOO_LARGE,
            format!(
                "maximum number of characters is {} but received {} characters",
                params.max_memo_characters, memo_len
            ),
        ));
    }

    if params.tx_sig_limit < 1 {
        return Err(TxError::new(
            codes::TOO_MANY_SIGNATURES,
            format!("signatures: 1, limit: {}", params.tx_sig_limit),
        ));
    }

    let signer = Address::from_public_key(&tx.auth_info.public_key);
    let account = state.account(&signer).cloned().ok_or_else(|| {
        TxError::new(
            codes::UNKNOWN_ADDRESS,
            format!("account {} does not exist", signer),
        )
    })?;

    if account.sequence != tx.auth_info.sequence {
        return Err(TxError::new(
            codes::INVALID_SEQUENCE,
            format!(
                "account sequence mismatch, expected {}, got {}",
                account.sequence, tx.auth_info.sequence
            ),
        ));
    }

    meter.consume(params.sig_verify_cost_secp256k1, "ante verify: secp256k1")?;
    if !simulate {
        let sign_bytes = Tx::sign_bytes(&tx.body, &tx.auth_info, chain_id, account.account_number)
            .map_err(|e| TxError::new(codes::TX_DECODE, e.to_string()))?;
        verify_signature(&tx.auth_info.public_key, &sign_bytes, &tx.signature).map_err(|_| {
            TxError::new(
                codes::UNAUTHORIZED,
                format!(
                    "signature verification failed; please verify account number ({}), sequence ({}) and chain-id ({})",
                    account.account_number, account.sequence, chain_id
                ),
            )
        })?;
    }

    let fee = &tx.auth_info.fee.amount;
    if !fee.is_empty() {
        let collector = Address::module(FEE_COLLECTOR);
        state.send_coins(&signer, &collector, fee).map_err(|e| {
            TxError::new(
                codes::INSUFFICIENT_FUNDS,
                format!("{}: insufficient funds to pay fee {}", e.log, coins_to_string(fee)),
            )
        })?;
    }

    if let Some(stored) = state.account_mut(&signer) {
        stored.public_key = Some(tx.auth_info.public_key.clone());
        stored.sequence += 1;
    }

    Ok(signer)
}
