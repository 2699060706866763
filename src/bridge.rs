//! The externally invocable operation surface.
//!
//! Every operation takes an environment id plus text arguments (base64 or
//! JSON) and returns text or plain integers, so it can be driven across a
//! process or language boundary. Domain failures travel inside result-codec
//! buffers; caller contract violations (bad base64, bad address text, unknown
//! id) panic through [`fatal`] before any state is touched.

use crate::abci::RequestDeliverTx;
use crate::config::{load_config, TubeConfig};
use crate::crypto::{Address, ACCOUNT_PREFIX};
use crate::env::Environment;
use crate::registry::EnvRegistry;
use crate::result::{encode_err_base64, encode_ok_base64, ErrorKind};
use crate::transaction::{parse_coins_json, Any};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

static GLOBAL_BRIDGE: Lazy<Arc<Bridge>> = Lazy::new(|| {
    let config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        TubeConfig::default()
    });
    Arc::new(Bridge::new(config))
});

/// Logs and aborts the current call. Reserved for caller contract violations.
#[track_caller]
pub fn fatal(msg: impl Display) -> ! {
    error!("fatal: {}", msg);
    panic!("{}", msg)
}

fn decode_base64(field: &str, text: &str) -> Vec<u8> {
    STANDARD
        .decode(text)
        .unwrap_or_else(|e| fatal(format!("invalid base64 in {}: {}", field, e)))
}

fn parse_account_address(text: &str) -> Address {
    Address::from_text(ACCOUNT_PREFIX, text)
        .unwrap_or_else(|e| fatal(format!("invalid account address `{}`: {}", text, e)))
}

pub struct Bridge {
    config: TubeConfig,
    registry: EnvRegistry,
}

impl Bridge {
    pub fn new(config: TubeConfig) -> Self {
        Bridge {
            config,
            registry: EnvRegistry::new(),
        }
    }

    /// Lazily created process singleton, configured from `load_config`.
    pub fn global() -> Arc<Bridge> {
        Arc::clone(&GLOBAL_BRIDGE)
    }

    pub fn config(&self) -> &TubeConfig {
        &self.config
    }

    pub fn registry(&self) -> &EnvRegistry {
        &self.registry
    }

    fn read<R>(&self, id: u64, f: impl FnOnce(&Environment) -> R) -> R {
        self.registry
            .read(id, f)
            .unwrap_or_else(|| fatal(format!("env not found: {}", id)))
    }

    fn mutate<R>(&self, id: u64, f: impl FnOnce(&mut Environment) -> R) -> R {
        self.registry
            .mutate(id, f)
            .unwrap_or_else(|| fatal(format!("env not found: {}", id)))
    }

    pub fn create_environment(&self) -> u64 {
        let id = self
            .registry
            .create(|| Environment::create(&self.config))
            .unwrap_or_else(|e| fatal(format!("failed to create environment: {}", e)));
        info!("Environment {} ready", id);
        id
    }

    /// Creates a funded account and returns its base64 private key.
    pub fn fund_account(&self, id: u64, coins_json: &str) -> String {
        let coins = parse_coins_json(coins_json)
            .unwrap_or_else(|e| fatal(format!("invalid coins `{}`: {}", coins_json, e)));
        let key = self
            .mutate(id, |env| env.fund_account(&coins))
            .unwrap_or_else(|e| fatal(format!("Failed to fund account: {}", e)));
        STANDARD.encode(key.secret_bytes())
    }

    pub fn advance_time(&self, id: u64, seconds: u64) {
        self.mutate(id, |env| env.advance_time(seconds))
            .unwrap_or_else(|e| fatal(format!("failed to advance time: {}", e)));
    }

    pub fn begin_block(&self, id: u64) {
        let secs = self.config.block_time_secs;
        self.mutate(id, |env| env.begin_block(secs))
            .unwrap_or_else(|e| fatal(format!("failed to begin block: {}", e)));
    }

    pub fn end_block(&self, id: u64) {
        self.mutate(id, |env| env.end_block())
            .unwrap_or_else(|e| fatal(format!("failed to end block: {}", e)));
    }

    /// Delivers a transaction. A failing transaction is still a successful outcome.
    pub fn execute(&self, id: u64, request_b64: &str) -> String {
        let bytes = decode_base64("request", request_b64);
        self.mutate(id, |env| {
            let req = match RequestDeliverTx::decode(&bytes) {
                Ok(req) => req,
                Err(e) => return encode_err_base64(ErrorKind::Execute, &e.to_string()),
            };
            let res = env.execute(req);
            let encoded = res
                .encode()
                .unwrap_or_else(|e| fatal(format!("failed to encode deliver response: {}", e)));
            encode_ok_base64(&encoded)
        })
    }

    pub fn query(&self, id: u64, path: &str, query_b64: &str) -> String {
        let data = decode_base64("query", query_b64);
        self.read(id, |env| match env.query(path, &data) {
            Ok(bytes) => encode_ok_base64(&bytes),
            Err(e) => {
                debug!("Query {} failed: {}", path, e);
                encode_err_base64(ErrorKind::Query, &e.to_string())
            }
        })
    }

    pub fn simulate(&self, id: u64, tx_b64: &str) -> String {
        let tx = decode_base64("tx", tx_b64);
        self.mutate(id, |env| match env.simulate(&tx) {
            Ok(gas) => {
                let encoded = gas
                    .encode()
                    .unwrap_or_else(|e| fatal(format!("failed to encode gas info: {}", e)));
                encode_ok_base64(&encoded)
            }
            Err(e) => encode_err_base64(ErrorKind::Execute, &e.to_string()),
        })
    }

    pub fn set_param_set(&self, id: u64, subspace: &str, any_b64: &str) -> String {
        let bytes = decode_base64("param set", any_b64);
        self.mutate(id, |env| {
            let outcome = Any::decode(&bytes).and_then(|any| env.set_param_set(subspace, &any));
            match outcome {
                Ok(()) => encode_ok_base64(&[]),
                Err(e) => encode_err_base64(ErrorKind::Execute, &e.to_string()),
            }
        })
    }

    pub fn get_param_set(&self, id: u64, subspace: &str, type_url: &str) -> String {
        self.read(id, |env| match env.get_param_set(subspace, type_url) {
            Ok(bytes) => encode_ok_base64(&bytes),
            Err(e) => encode_err_base64(ErrorKind::Execute, &e.to_string()),
        })
    }

    /// Block time in nanoseconds since the Unix epoch.
    pub fn get_block_time(&self, id: u64) -> i64 {
        self.read(id, |env| env.block_time_nanos())
    }

    pub fn get_block_height(&self, id: u64) -> i64 {
        self.read(id, |env| env.block_height())
    }

    pub fn account_sequence(&self, id: u64, address: &str) -> u64 {
        let address = parse_account_address(address);
        self.read(id, |env| env.account_sequence(&address))
            .unwrap_or_else(|e| fatal(e))
    }

    pub fn account_number(&self, id: u64, address: &str) -> u64 {
        let address = parse_account_address(address);
        self.read(id, |env| env.account_number(&address))
            .unwrap_or_else(|e| fatal(e))
    }

    pub fn get_validator_address(&self, id: u64, index: i32) -> String {
        let addresses = self.read(id, |env| env.validator_addresses());
        usize::try_from(index)
            .ok()
            .and_then(|i| addresses.get(i).cloned())
            .unwrap_or_else(|| {
                fatal(format!(
                    "validator index {} out of range ({} validators)",
                    index,
                    addresses.len()
                ))
            })
    }

    pub fn get_validator_private_key(&self, id: u64) -> String {
        let secret = self
            .read(id, |env| env.validator_private_key(0))
            .unwrap_or_else(|| fatal("environment has no validator key"));
        STANDARD.encode(secret)
    }
}
