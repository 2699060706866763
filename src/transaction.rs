//! Transaction module split into types and validation for better modularity

pub mod types;
pub mod validation;

pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::error::codes;

    fn unsigned_tx(keypair: &KeyPair) -> Tx {
        Tx {
            body: TxBody {
                messages: vec![Any {
                    type_url: "/test.Msg".to_string(),
                    value: vec![1, 2, 3],
                }],
                memo: String::new(),
            },
            auth_info: AuthInfo {
                public_key: keypair.public_key_bytes().to_vec(),
                sequence: 0,
                fee: Fee {
                    amount: vec![],
                    gas_limit: 200_000,
                },
            },
            signature: vec![],
        }
    }

    #[test]
    fn test_unsigned_tx_passes_only_in_simulation() {
        let keypair = KeyPair::generate();
        let tx = unsigned_tx(&keypair);
        let len = tx.encode().unwrap().len();

        assert!(tx.validate_basic(len, true).is_ok());
        let err = tx.validate_basic(len, false).unwrap_err();
        assert_eq!(err.code, codes::NO_SIGNATURES);
    }

    #[test]
    fn test_tx_without_messages_rejected() {
        let keypair = KeyPair::generate();
        let mut tx = unsigned_tx(&keypair);
        tx.body.messages.clear();
        let err = tx.validate_basic(0, true).unwrap_err();
        assert_eq!(err.code, codes::INVALID_REQUEST);
    }

    #[test]
    fn test_oversized_tx_rejected() {
        let keypair = KeyPair::generate();
        let tx = unsigned_tx(&keypair);
        let err = tx.validate_basic(MAX_TRANSACTION_SIZE + 1, true).unwrap_err();
        assert!(err.log.contains("Transaction too large"));
    }

    #[test]
    fn test_tx_encode_decode() {
        let keypair = KeyPair::generate();
        let tx = unsigned_tx(&keypair);
        let decoded = Tx::decode(&tx.encode().unwrap()).unwrap();
        assert_eq!(decoded, tx);
        assert!(Tx::decode(&[0xde, 0xad]).is_err());
    }

    #[test]
    fn test_sign_bytes_bind_account_number() {
        let keypair = KeyPair::generate();
        let tx = unsigned_tx(&keypair);
        let a = Tx::sign_bytes(&tx.body, &tx.auth_info, "chain", 1).unwrap();
        let b = Tx::sign_bytes(&tx.body, &tx.auth_info, "chain", 2).unwrap();
        assert_ne!(a, b);
    }
}
