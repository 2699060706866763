//! Module parameter sets and the subspaces that store them.
//!
//! A subspace is bound to exactly one parameter-set type (its key table) and
//! stores each field under its own key as JSON, the way the params keeper of a
//! cosmos chain does.

use crate::error::{ChainError, Result};
use crate::transaction::{Any, TypeUrl};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AUTH_SUBSPACE: &str = "auth";
pub const BANK_SUBSPACE: &str = "bank";
pub const SLASHING_SUBSPACE: &str = "slashing";

/// Field-level access to a parameter set, one store key per field.
pub trait ParamSetPairs: Default {
    const KEYS: &'static [&'static str];

    fn to_pairs(&self) -> Result<Vec<(&'static str, Vec<u8>)>>;

    fn load_pair(&mut self, key: &str, value: &[u8]) -> Result<()>;

    fn validate(&self) -> Result<()>;
}

macro_rules! param_pairs {
    ($ty:ty { $($key:literal => $field:ident),+ $(,)? }) => {
        impl ParamSetPairs for $ty {
            const KEYS: &'static [&'static str] = &[$($key),+];

            fn to_pairs(&self) -> Result<Vec<(&'static str, Vec<u8>)>> {
                Ok(vec![$(($key, serde_json::to_vec(&self.$field)?)),+])
            }

            fn load_pair(&mut self, key: &str, value: &[u8]) -> Result<()> {
                match key {
                    $($key => self.$field = serde_json::from_slice(value)?,)+
                    other => {
                        return Err(ChainError::InvalidParamSet(format!(
                            "unknown parameter key `{}`",
                            other
                        )))
                    }
                }
                Ok(())
            }

            fn validate(&self) -> Result<()> {
                self.validate_fields()
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    pub max_memo_characters: u64,
    pub tx_sig_limit: u64,
    pub tx_size_cost_per_byte: u64,
    pub sig_verify_cost_secp256k1: u64,
}

impl AuthParams {
    pub fn genesis() -> Self {
        AuthParams {
            max_memo_characters: 256,
            tx_sig_limit: 7,
            tx_size_cost_per_byte: 10,
            sig_verify_cost_secp256k1: 1000,
        }
    }

    fn validate_fields(&self) -> Result<()> {
        if self.max_memo_characters == 0 {
            return Err(ChainError::InvalidParamSet(
                "invalid max memo characters: 0".to_string(),
            ));
        }
        if self.tx_sig_limit == 0 {
            return Err(ChainError::InvalidParamSet("invalid tx signature limit: 0".to_string()));
        }
        if self.tx_size_cost_per_byte == 0 {
            return Err(ChainError::InvalidParamSet("invalid tx size cost per byte: 0".to_string()));
        }
        if self.sig_verify_cost_secp256k1 == 0 {
            return Err(ChainError::InvalidParamSet(
                "invalid SECK256k1 signature verification cost: 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl TypeUrl for AuthParams {
    const TYPE_URL: &'static str = "/cosmos.auth.v1beta1.Params";
}

param_pairs!(AuthParams {
    "MaxMemoCharacters" => max_memo_characters,
    "TxSigLimit" => tx_sig_limit,
    "TxSizeCostPerByte" => tx_size_cost_per_byte,
    "SigVerifyCostSecp256k1" => sig_verify_cost_secp256k1,
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEnabled {
    pub denom: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankParams {
    pub send_enabled: Vec<SendEnabled>,
    pub default_send_enabled: bool,
}

impl BankParams {
    pub fn genesis() -> Self {
        BankParams {
            send_enabled: Vec::new(),
            default_send_enabled: true,
        }
    }

    pub fn is_send_enabled(&self, denom: &str) -> bool {
        self.send_enabled
            .iter()
            .find(|s| s.denom == denom)
            .map_or(self.default_send_enabled, |s| s.enabled)
    }

    fn validate_fields(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.send_enabled {
            crate::transaction::Coin::validate_denom(&entry.denom)
                .map_err(|e| ChainError::InvalidParamSet(e.to_string()))?;
            if !seen.insert(entry.denom.as_str()) {
                return Err(ChainError::InvalidParamSet(format!(
                    "duplicate send enabled parameter found: '{}'",
                    entry.denom
                )));
            }
        }
        Ok(())
    }
}

impl TypeUrl for BankParams {
    const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.Params";
}

param_pairs!(BankParams {
    "SendEnabled" => send_enabled,
    "DefaultSendEnabled" => default_send_enabled,
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashingParams {
    pub signed_blocks_window: i64,
    /// Decimal fraction, e.g. `"0.500000000000000000"`.
    pub min_signed_per_window: String,
    pub downtime_jail_duration_secs: u64,
    pub slash_fraction_double_sign: String,
    pub slash_fraction_downtime: String,
}

impl SlashingParams {
    pub fn genesis() -> Self {
        SlashingParams {
            signed_blocks_window: 100,
            min_signed_per_window: "0.500000000000000000".to_string(),
            downtime_jail_duration_secs: 600,
            slash_fraction_double_sign: "0.050000000000000000".to_string(),
            slash_fraction_downtime: "0.010000000000000000".to_string(),
        }
    }

    fn validate_fields(&self) -> Result<()> {
        if self.signed_blocks_window <= 0 {
            return Err(ChainError::InvalidParamSet(format!(
                "signed blocks window must be positive: {}",
                self.signed_blocks_window
            )));
        }
        for (name, value) in [
            ("min signed per window", &self.min_signed_per_window),
            ("double sign slash fraction", &self.slash_fraction_double_sign),
            ("downtime slash fraction", &self.slash_fraction_downtime),
        ] {
            let fraction: f64 = value.parse().map_err(|_| {
                ChainError::InvalidParamSet(format!("{} is not a decimal: {}", name, value))
            })?;
            if !(0.0..=1.0).contains(&fraction) {
                return Err(ChainError::InvalidParamSet(format!(
                    "{} too large: {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl TypeUrl for SlashingParams {
    const TYPE_URL: &'static str = "/cosmos.slashing.v1beta1.Params";
}

param_pairs!(SlashingParams {
    "SignedBlocksWindow" => signed_blocks_window,
    "MinSignedPerWindow" => min_signed_per_window,
    "DowntimeJailDuration" => downtime_jail_duration_secs,
    "SlashFractionDoubleSign" => slash_fraction_double_sign,
    "SlashFractionDowntime" => slash_fraction_downtime,
});

/// The closed set of parameter-set types known to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSet {
    Auth(AuthParams),
    Bank(BankParams),
    Slashing(SlashingParams),
}

impl ParamSet {
    pub fn type_url(&self) -> &'static str {
        match self {
            ParamSet::Auth(_) => AuthParams::TYPE_URL,
            ParamSet::Bank(_) => BankParams::TYPE_URL,
            ParamSet::Slashing(_) => SlashingParams::TYPE_URL,
        }
    }

    /// A zero-valued instance of the same type, ready to be populated.
    pub fn empty(&self) -> ParamSet {
        match self {
            ParamSet::Auth(_) => ParamSet::Auth(AuthParams::default()),
            ParamSet::Bank(_) => ParamSet::Bank(BankParams::default()),
            ParamSet::Slashing(_) => ParamSet::Slashing(SlashingParams::default()),
        }
    }

    /// Decodes `bytes` as a value of the same type as `self`.
    pub fn decode_same(&self, bytes: &[u8]) -> Result<ParamSet> {
        Ok(match self {
            ParamSet::Auth(_) => ParamSet::Auth(bincode::deserialize(bytes)?),
            ParamSet::Bank(_) => ParamSet::Bank(bincode::deserialize(bytes)?),
            ParamSet::Slashing(_) => ParamSet::Slashing(bincode::deserialize(bytes)?),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(match self {
            ParamSet::Auth(p) => bincode::serialize(p)?,
            ParamSet::Bank(p) => bincode::serialize(p)?,
            ParamSet::Slashing(p) => bincode::serialize(p)?,
        })
    }

    pub fn to_any(&self) -> Result<Any> {
        Ok(Any {
            type_url: self.type_url().to_string(),
            value: self.encode()?,
        })
    }

    fn keys(&self) -> &'static [&'static str] {
        match self {
            ParamSet::Auth(_) => AuthParams::KEYS,
            ParamSet::Bank(_) => BankParams::KEYS,
            ParamSet::Slashing(_) => SlashingParams::KEYS,
        }
    }

    fn to_pairs(&self) -> Result<Vec<(&'static str, Vec<u8>)>> {
        match self {
            ParamSet::Auth(p) => p.to_pairs(),
            ParamSet::Bank(p) => p.to_pairs(),
            ParamSet::Slashing(p) => p.to_pairs(),
        }
    }

    fn load_pair(&mut self, key: &str, value: &[u8]) -> Result<()> {
        match self {
            ParamSet::Auth(p) => p.load_pair(key, value),
            ParamSet::Bank(p) => p.load_pair(key, value),
            ParamSet::Slashing(p) => p.load_pair(key, value),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ParamSet::Auth(p) => p.validate(),
            ParamSet::Bank(p) => p.validate(),
            ParamSet::Slashing(p) => p.validate(),
        }
    }
}

/// A named parameter store belonging to one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subspace {
    pub name: String,
    /// Type url of the only parameter set this subspace accepts.
    pub key_table: String,
    store: BTreeMap<String, Vec<u8>>,
}

impl Subspace {
    pub fn new(name: impl Into<String>, key_table: &str) -> Self {
        Subspace {
            name: name.into(),
            key_table: key_table.to_string(),
            store: BTreeMap::new(),
        }
    }

    fn check_key_table(&self, type_url: &str) -> Result<()> {
        if self.key_table != type_url {
            return Err(ChainError::InvalidParamSet(format!(
                "param set `{}` does not belong to subspace `{}` (expects `{}`)",
                type_url, self.name, self.key_table
            )));
        }
        Ok(())
    }

    /// Validates and stores every field of `set`. Leaves the store untouched on error.
    pub fn set_param_set(&mut self, set: &ParamSet) -> Result<()> {
        self.check_key_table(set.type_url())?;
        set.validate()?;
        for (key, value) in set.to_pairs()? {
            self.store.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Populates `set` from the stored fields.
    pub fn get_param_set(&self, set: &mut ParamSet) -> Result<()> {
        self.check_key_table(set.type_url())?;
        for key in set.keys() {
            let value = self.raw(key)?;
            set.load_pair(key, value)?;
        }
        Ok(())
    }

    /// Typed read used by the modules themselves.
    pub fn load<P: ParamSetPairs + TypeUrl>(&self) -> Result<P> {
        self.check_key_table(P::TYPE_URL)?;
        let mut params = P::default();
        for key in P::KEYS {
            params.load_pair(key, self.raw(key)?)?;
        }
        Ok(params)
    }

    fn raw(&self, key: &str) -> Result<&[u8]> {
        self.store.get(key).map(Vec::as_slice).ok_or_else(|| {
            ChainError::InvalidParamSet(format!(
                "parameter `{}` not set in subspace `{}`",
                key, self.name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subspace_round_trip() {
        let mut subspace = Subspace::new(AUTH_SUBSPACE, AuthParams::TYPE_URL);
        let mut params = AuthParams::genesis();
        params.max_memo_characters = 42;
        subspace.set_param_set(&ParamSet::Auth(params.clone())).unwrap();

        let mut out = ParamSet::Auth(AuthParams::default());
        subspace.get_param_set(&mut out).unwrap();
        assert_eq!(out, ParamSet::Auth(params.clone()));
        assert_eq!(subspace.load::<AuthParams>().unwrap(), params);
    }

    #[test]
    fn test_subspace_rejects_foreign_param_set() {
        let mut subspace = Subspace::new(BANK_SUBSPACE, BankParams::TYPE_URL);
        let err = subspace
            .set_param_set(&ParamSet::Auth(AuthParams::genesis()))
            .unwrap_err();
        assert!(err.to_string().contains("does not belong to subspace `bank`"));
    }

    #[test]
    fn test_invalid_values_leave_store_untouched() {
        let mut subspace = Subspace::new(SLASHING_SUBSPACE, SlashingParams::TYPE_URL);
        subspace.set_param_set(&ParamSet::Slashing(SlashingParams::genesis())).unwrap();

        let mut bad = SlashingParams::genesis();
        bad.signed_blocks_window = 0;
        assert!(subspace.set_param_set(&ParamSet::Slashing(bad)).is_err());
        assert_eq!(subspace.load::<SlashingParams>().unwrap(), SlashingParams::genesis());
    }

    #[test]
    fn test_get_from_empty_subspace_fails() {
        let subspace = Subspace::new(BANK_SUBSPACE, BankParams::TYPE_URL);
        let mut out = ParamSet::Bank(BankParams::default());
        let err = subspace.get_param_set(&mut out).unwrap_err();
        assert!(err.to_string().contains("not set in subspace `bank`"));
    }

    #[test]
    fn test_send_enabled_lookup() {
        let params = BankParams {
            send_enabled: vec![SendEnabled {
                denom: "usdt".to_string(),
                enabled: false,
            }],
            default_send_enabled: true,
        };
        assert!(!params.is_send_enabled("usdt"));
        assert!(params.is_send_enabled("inj"));
    }

    #[test]
    fn test_param_set_any_uses_type_url() {
        let set = ParamSet::Bank(BankParams::genesis());
        let any = set.to_any().unwrap();
        assert_eq!(any.type_url, "/cosmos.bank.v1beta1.Params");
        assert_eq!(set.empty().decode_same(&any.value).unwrap(), set);
    }
}
