//! Type-url to prototype table used to decode dynamically-typed parameter sets.

use crate::app::core::params::{AuthParams, BankParams, ParamSet, SlashingParams};
use crate::error::{ChainError, Result};
use crate::transaction::{Any, TypeUrl};
use std::collections::BTreeMap;

/// Maps a parameter-set type identifier to a prototype value of that type.
///
/// An environment takes a snapshot of the registry at creation and never
/// changes it afterwards.
#[derive(Debug, Clone, Default)]
pub struct ParamTypeRegistry {
    prototypes: BTreeMap<String, ParamSet>,
}

impl ParamTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the parameter sets of every built-in module.
    pub fn with_module_params() -> Self {
        let mut registry = Self::new();
        registry.register(AuthParams::TYPE_URL, ParamSet::Auth(AuthParams::default()));
        registry.register(BankParams::TYPE_URL, ParamSet::Bank(BankParams::default()));
        registry.register(
            SlashingParams::TYPE_URL,
            ParamSet::Slashing(SlashingParams::default()),
        );
        registry
    }

    pub fn register(&mut self, type_url: &str, prototype: ParamSet) {
        self.prototypes.insert(type_url.to_string(), prototype);
    }

    pub fn is_registered(&self, type_url: &str) -> bool {
        self.prototypes.contains_key(type_url)
    }

    /// A fresh, zero-valued instance of the type registered under `type_url`.
    pub fn empty_param_set(&self, type_url: &str) -> Result<ParamSet> {
        self.prototypes
            .get(type_url)
            .map(ParamSet::empty)
            .ok_or_else(|| ChainError::ParamSetNotFound(type_url.to_string()))
    }

    /// Decodes `any.value` as the type named by `any.type_url`.
    pub fn unpack_any(&self, any: &Any) -> Result<ParamSet> {
        let prototype = self
            .prototypes
            .get(&any.type_url)
            .ok_or_else(|| ChainError::ParamSetNotFound(any.type_url.clone()))?;
        prototype.decode_same(&any.value).map_err(|e| {
            ChainError::InvalidParamSet(format!("cannot decode {}: {}", any.type_url, e))
        })
    }

    pub fn type_urls(&self) -> Vec<&str> {
        self.prototypes.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_url() {
        let registry = ParamTypeRegistry::with_module_params();
        let err = registry.empty_param_set("/cosmos.mint.v1beta1.Params").unwrap_err();
        assert_eq!(
            err.to_string(),
            "No param set found for `/cosmos.mint.v1beta1.Params`"
        );
    }

    #[test]
    fn test_unpack_registered_any() {
        let registry = ParamTypeRegistry::with_module_params();
        let mut params = AuthParams::genesis();
        params.max_memo_characters = 512;
        let any = ParamSet::Auth(params.clone()).to_any().unwrap();

        assert_eq!(registry.unpack_any(&any).unwrap(), ParamSet::Auth(params));
    }

    #[test]
    fn test_unpack_garbage_is_typed_error() {
        let registry = ParamTypeRegistry::with_module_params();
        let any = Any {
            type_url: BankParams::TYPE_URL.to_string(),
            value: vec![0xff; 3],
        };
        assert!(matches!(
            registry.unpack_any(&any),
            Err(ChainError::InvalidParamSet(_))
        ));
    }

    #[test]
    fn test_empty_instance_is_default() {
        let registry = ParamTypeRegistry::with_module_params();
        assert!(registry.is_registered(SlashingParams::TYPE_URL));
        assert_eq!(
            registry.empty_param_set(SlashingParams::TYPE_URL).unwrap(),
            ParamSet::Slashing(SlashingParams::default())
        );
        assert_eq!(registry.type_urls().len(), 3);
    }
}
