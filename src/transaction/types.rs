/// Transaction wire types for ChainTube
use crate::error::ChainError;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Maximum transaction size in bytes (100KB) to prevent DoS
pub const MAX_TRANSACTION_SIZE: usize = 100_000;

/// A message a typed value can be packed into an [`Any`] as.
pub trait TypeUrl {
    const TYPE_URL: &'static str;
}

/// A dynamically typed payload: a type url plus the bincode encoding of the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Any {
    pub type_url: String,
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

impl Any {
    pub fn pack<M: Serialize + TypeUrl>(msg: &M) -> Result<Self, ChainError> {
        Self::pack_as(msg, M::TYPE_URL)
    }

    pub fn pack_as<M: Serialize>(msg: &M, type_url: &str) -> Result<Self, ChainError> {
        Ok(Any {
            type_url: type_url.to_string(),
            value: bincode::serialize(msg)?,
        })
    }

    /// Decodes the value as `M`, checking the type url first.
    pub fn unpack<M: DeserializeOwned + TypeUrl>(&self) -> Result<M, ChainError> {
        if self.type_url != M::TYPE_URL {
            return Err(ChainError::InvalidTransaction(format!(
                "expected {}, got {}",
                M::TYPE_URL,
                self.type_url
            )));
        }
        Ok(bincode::deserialize(&self.value)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>, ChainError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ChainError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// A single denomination amount. JSON form is `{"denom": "inj", "amount": "100"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Coin {
            denom: denom.into(),
            amount,
        }
    }

    pub fn validate_denom(denom: &str) -> Result<(), ChainError> {
        let mut chars = denom.chars();
        let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
        if !starts_alpha || !rest_ok || denom.len() < 3 || denom.len() > 128 {
            return Err(ChainError::InvalidCoins(format!("invalid denom: {}", denom)));
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Checks a coin set is non-empty, positive, well-named and free of duplicate denoms.
pub fn validate_coins(coins: &[Coin]) -> Result<(), ChainError> {
    if coins.is_empty() {
        return Err(ChainError::InvalidCoins("empty coin set".to_string()));
    }
    let mut seen = BTreeSet::new();
    for coin in coins {
        Coin::validate_denom(&coin.denom)?;
        if coin.amount == 0 {
            return Err(ChainError::InvalidCoins(format!("coin {} amount is not positive", coin)));
        }
        if !seen.insert(coin.denom.as_str()) {
            return Err(ChainError::InvalidCoins(format!("duplicate denomination {}", coin.denom)));
        }
    }
    Ok(())
}

pub fn coins_to_string(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(Coin::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a JSON coin array such as `[{"denom":"inj","amount":"1000000"}]`.
pub fn parse_coins_json(json: &str) -> Result<Vec<Coin>, ChainError> {
    let coins: Vec<Coin> = serde_json::from_str(json)?;
    validate_coins(&coins)?;
    Ok(coins)
}

mod amount_string {
    use super::*;

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<Any>,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
}

/// Signer information. Single-signer transactions only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(with = "serde_bytes")]
    pub public_key: Vec<u8>,
    pub sequence: u64,
    pub fee: Fee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

/// The bytes a signer commits to.
#[derive(Debug, Clone, Serialize)]
pub struct SignDoc<'a> {
    pub chain_id: &'a str,
    pub account_number: u64,
    pub body: &'a TxBody,
    pub auth_info: &'a AuthInfo,
}

impl Tx {
    pub fn encode(&self) -> Result<Vec<u8>, ChainError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ChainError> {
        bincode::deserialize(bytes)
            .map_err(|e| ChainError::InvalidTransaction(format!("tx parse error: {}", e)))
    }

    pub fn sign_bytes(
        body: &TxBody,
        auth_info: &AuthInfo,
        chain_id: &str,
        account_number: u64,
    ) -> Result<Vec<u8>, ChainError> {
        let doc = SignDoc {
            chain_id,
            account_number,
            body,
            auth_info,
        };
        Ok(bincode::serialize(&doc)?)
    }
}
