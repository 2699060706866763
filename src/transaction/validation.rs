/// Stateless transaction checks, separated from the type definitions
use crate::error::{codes, TxError};
use crate::transaction::types::{validate_coins, Tx, MAX_TRANSACTION_SIZE};
use secp256k1::constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE};

impl Tx {
    /// Checks everything that does not need chain state.
    ///
    /// `simulate` relaxes the signature checks: simulated transactions may be unsigned.
    pub fn validate_basic(&self, encoded_len: usize, simulate: bool) -> Result<(), TxError> {
        if encoded_len > MAX_TRANSACTION_SIZE {
            return Err(TxError::new(
                codes::TX_DECODE,
                format!(
                    "Transaction too large: {} bytes (max: {})",
                    encoded_len, MAX_TRANSACTION_SIZE
                ),
            ));
        }

        if self.body.messages.is_empty() {
            return Err(TxError::new(
                codes::INVALID_REQUEST,
                "must contain at least one message",
            ));
        }

        if self.auth_info.public_key.len() != PUBLIC_KEY_SIZE {
            return Err(TxError::new(
                codes::INVALID_PUBKEY,
                format!(
                    "public key must be {} bytes, got {}",
                    PUBLIC_KEY_SIZE,
                    self.auth_info.public_key.len()
                ),
            ));
        }

        if !self.auth_info.fee.amount.is_empty() {
            validate_coins(&self.auth_info.fee.amount)
                .map_err(|e| TxError::new(codes::INSUFFICIENT_FEE, e.to_string()))?;
        }

        if simulate {
            return Ok(());
        }

        if self.signature.is_empty() {
            return Err(TxError::new(codes::NO_SIGNATURES, "no signatures supplied"));
        }
        if self.signature.len() != COMPACT_SIGNATURE_SIZE {
            return Err(TxError::new(
                codes::UNAUTHORIZED,
                format!(
                    "signature must be {} bytes, got {}",
                    COMPACT_SIGNATURE_SIZE,
                    self.signature.len()
                ),
            ));
        }
        Ok(())
    }
}
