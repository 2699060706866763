//! Error types for ChainTube

use thiserror::Error;

/// Domain errors raised by the harness and the reference application.
///
/// These are the failures a driver is expected to branch on; they travel
/// across the bridge through the result codec rather than aborting the call.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("No route found for `{0}`")]
    NoRoute(String),
    #[error("No subspace found for `{0}`")]
    SubspaceNotFound(String),
    #[error("No param set found for `{0}`")]
    ParamSetNotFound(String),
    #[error("Invalid param set: {0}")]
    InvalidParamSet(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Simulation failed: {0}")]
    SimulationFailed(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid coins: {0}")]
    InvalidCoins(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Missing signing info for validator {0}")]
    MissingSigningInfo(String),
    #[error("Invalid block time: {0}")]
    InvalidBlockTime(String),
    #[error("No block in progress")]
    NoBlockInProgress,
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Bincode error: {0}")]
    BincodeError(String),
    #[error("JSON error: {0}")]
    JsonError(String),
    #[error("Base64 error: {0}")]
    Base64Error(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for ChainError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        ChainError::BincodeError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::JsonError(err.to_string())
    }
}

impl From<base64::DecodeError> for ChainError {
    fn from(err: base64::DecodeError) -> Self {
        ChainError::Base64Error(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

/// Codespace shared by the built-in modules.
pub const ROOT_CODESPACE: &str = "sdk";

/// ABCI result codes, numbered the way cosmos-sdk numbers its root errors.
pub mod codes {
    pub const OK: u32 = 0;
    pub const TX_DECODE: u32 = 2;
    pub const INVALID_SEQUENCE: u32 = 3;
    pub const UNAUTHORIZED: u32 = 4;
    pub const INSUFFICIENT_FUNDS: u32 = 5;
    pub const UNKNOWN_REQUEST: u32 = 6;
    pub const INVALID_ADDRESS: u32 = 7;
    pub const INVALID_PUBKEY: u32 = 8;
    pub const UNKNOWN_ADDRESS: u32 = 9;
    pub const INVALID_COINS: u32 = 10;
    pub const OUT_OF_GAS: u32 = 11;
    pub const MEMO_TOO_LARGE: u32 = 12;
    pub const INSUFFICIENT_FEE: u32 = 13;
    pub const TOO_MANY_SIGNATURES: u32 = 14;
    pub const NO_SIGNATURES: u32 = 15;
    pub const INVALID_REQUEST: u32 = 18;
    pub const SEND_DISABLED: u32 = 19;
    pub const NO_BLOCK_IN_PROGRESS: u32 = 20;
}

/// A transaction that was run but rejected.
///
/// Never crosses the bridge as an error: the application folds it into a
/// failure-shaped `ResponseDeliverTx`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{log}")]
pub struct TxError {
    pub codespace: &'static str,
    pub code: u32,
    pub log: String,
}

impl TxError {
    pub fn new(code: u32, log: impl Into<String>) -> Self {
        Self {
            codespace: ROOT_CODESPACE,
            code,
            log: log.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_route_message_carries_path() {
        let err = ChainError::NoRoute("/foo.Query/Bar".to_string());
        assert_eq!(err.to_string(), "No route found for `/foo.Query/Bar`");
    }

    #[test]
    fn test_bincode_error_conversion() {
        let bad: std::result::Result<String, _> = bincode::deserialize(&[0xff]);
        let err: ChainError = bad.unwrap_err().into();
        assert!(matches!(err, ChainError::BincodeError(_)));
    }

    #[test]
    fn test_tx_error_displays_log() {
        let err = TxError::new(codes::INSUFFICIENT_FUNDS, "1inj is smaller than 2inj");
        assert_eq!(err.codespace, ROOT_CODESPACE);
        assert_eq!(err.to_string(), "1inj is smaller than 2inj");
    }
}
