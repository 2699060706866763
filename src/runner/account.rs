use crate::crypto::{Address, KeyPair};
use crate::error::ChainError;
use crate::transaction::Coin;

pub const DEFAULT_GAS_ADJUSTMENT: f64 = 1.2;

/// How a signer pays for its transactions.
#[derive(Debug, Clone, PartialEq)]
pub enum FeeSetting {
    /// Simulate first, then pay `gas_price` per unit of `gas_used * gas_adjustment`.
    Auto { gas_price: Coin, gas_adjustment: f64 },
    Custom { amount: Coin, gas_limit: u64 },
}

/// A key pair that can sign transactions, plus its fee policy.
#[derive(Debug, Clone)]
pub struct SigningAccount {
    key: KeyPair,
    fee_setting: FeeSetting,
}

impl SigningAccount {
    pub fn new(key: KeyPair, fee_setting: FeeSetting) -> Self {
        SigningAccount { key, fee_setting }
    }

    pub fn from_secret_bytes(bytes: &[u8], fee_setting: FeeSetting) -> Result<Self, ChainError> {
        Ok(Self::new(KeyPair::from_secret_bytes(bytes)?, fee_setting))
    }

    pub fn with_fee_setting(self, fee_setting: FeeSetting) -> Self {
        SigningAccount { fee_setting, ..self }
    }

    pub fn fee_setting(&self) -> &FeeSetting {
        &self.fee_setting
    }

    /// Account address in `inj1...` form.
    pub fn address(&self) -> String {
        self.key.address().to_string()
    }

    pub fn account_address(&self) -> Address {
        self.key.address()
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.key.public_key_bytes().to_vec()
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.key.secret_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ChainError> {
        Ok(self.key.sign(message)?.to_vec())
    }
}
