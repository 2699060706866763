//! One isolated chain instance and its block-lifecycle state machine.

use crate::abci::{GasInfo, Header, RequestDeliverTx, ResponseDeliverTx};
use crate::app::core::SimApp;
use crate::app::{Application, ValidatorSigningInfo};
use crate::config::TubeConfig;
use crate::crypto::{Address, KeyPair, VALOPER_PREFIX};
use crate::error::{ChainError, Result};
use crate::param_registry::ParamTypeRegistry;
use crate::transaction::{Any, Coin};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPhase {
    BetweenBlocks,
    InBlock,
}

/// Height, time and chain id of the block the environment is at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub chain_id: String,
    pub height: i64,
    pub time: DateTime<Utc>,
}

impl Context {
    pub fn genesis(chain_id: impl Into<String>, time: DateTime<Utc>) -> Self {
        Context {
            chain_id: chain_id.into(),
            height: 0,
            time,
        }
    }

    /// The context of the following block, `secs` seconds later.
    ///
    /// The new time must stay representable as nanoseconds since the epoch.
    pub fn next_block(&self, secs: u64) -> Result<Self> {
        let out_of_range = || {
            ChainError::InvalidBlockTime(format!("{} + {}s is out of range", self.time, secs))
        };
        let delta = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(out_of_range)?;
        let time = self
            .time
            .checked_add_signed(delta)
            .filter(|t| t.timestamp_nanos_opt().is_some())
            .ok_or_else(out_of_range)?;
        let height = self.height.checked_add(1).ok_or_else(out_of_range)?;
        Ok(Context {
            chain_id: self.chain_id.clone(),
            height,
            time,
        })
    }

    pub fn header(&self) -> Header {
        Header {
            chain_id: self.chain_id.clone(),
            height: self.height,
            time: self.time,
        }
    }

    /// Nanoseconds since the Unix epoch.
    pub fn block_time_nanos(&self) -> i64 {
        self.time
            .timestamp_nanos_opt()
            .unwrap_or_else(|| self.time.timestamp().saturating_mul(1_000_000_000))
    }
}

pub struct Environment {
    app: Box<dyn Application>,
    ctx: Context,
    phase: BlockPhase,
    param_types: ParamTypeRegistry,
}

impl Environment {
    /// Bootstraps the reference application and commits its first block.
    pub fn create(config: &TubeConfig) -> Result<Self> {
        let app = SimApp::setup(config)?;
        Self::with_app(
            Box::new(app),
            config,
            ParamTypeRegistry::with_module_params(),
        )
    }

    /// Wraps an already-built application: seeds signing info for its
    /// validators and drives one full block so state is queryable.
    pub fn with_app(
        mut app: Box<dyn Application>,
        config: &TubeConfig,
        param_types: ParamTypeRegistry,
    ) -> Result<Self> {
        let ctx = Context::genesis(app.chain_id().to_string(), Utc::now());

        let epoch = DateTime::<Utc>::default();
        for validator in app.validators() {
            let info = ValidatorSigningInfo::new(
                validator.consensus_address,
                ctx.height,
                0,
                epoch,
                false,
                0,
            );
            app.set_validator_signing_info(info)?;
        }

        let mut env = Environment {
            app,
            ctx,
            phase: BlockPhase::BetweenBlocks,
            param_types,
        };
        env.advance_time(config.genesis_block_time_secs)?;

        info!(
            "Created environment for {} at height {}",
            env.ctx.chain_id, env.ctx.height
        );
        Ok(env)
    }

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    pub fn block_height(&self) -> i64 {
        self.ctx.height
    }

    pub fn block_time_nanos(&self) -> i64 {
        self.ctx.block_time_nanos()
    }

    /// Opens the next block `secs` seconds after the current one.
    ///
    /// Calling this while a block is already open advances height again and
    /// keeps working on the uncommitted block.
    pub fn begin_block(&mut self, secs: u64) -> Result<()> {
        let next = self.ctx.next_block(secs)?;
        self.app.begin_block(next.header())?;
        self.ctx = next;
        self.phase = BlockPhase::InBlock;
        debug!("Began block {} at {}", self.ctx.height, self.ctx.time);
        Ok(())
    }

    /// Finalizes and commits the open block. A no-op when no block is open.
    pub fn end_block(&mut self) -> Result<()> {
        if self.phase == BlockPhase::BetweenBlocks {
            warn!(
                "end_block called with no open block at height {}; ignoring",
                self.ctx.height
            );
            return Ok(());
        }
        self.app.end_block(self.ctx.height)?;
        let commit = self.app.commit()?;
        self.phase = BlockPhase::BetweenBlocks;
        debug!(
            "Committed block {} app_hash {}",
            commit.height,
            hex::encode(commit.app_hash)
        );
        Ok(())
    }

    pub fn advance_time(&mut self, secs: u64) -> Result<()> {
        self.begin_block(secs)?;
        self.end_block()
    }

    /// Generates a fresh key pair and mints `coins` to its address.
    pub fn fund_account(&mut self, coins: &[Coin]) -> Result<KeyPair> {
        let key = KeyPair::generate();
        self.app.fund_account(&key.address(), coins)?;
        debug!("Funded {} with {}", key.address(), crate::transaction::coins_to_string(coins));
        Ok(key)
    }

    pub fn execute(&mut self, req: RequestDeliverTx) -> ResponseDeliverTx {
        let res = self.app.deliver_tx(req);
        if res.is_ok() {
            debug!("Delivered tx at height {} (gas used {})", self.ctx.height, res.gas_used);
        } else {
            debug!("Delivered tx failed with code {}: {}", res.code, res.log);
        }
        res
    }

    pub fn simulate(&self, tx_bytes: &[u8]) -> Result<GasInfo> {
        self.app.simulate(tx_bytes)
    }

    pub fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        self.app.query(path, data)
    }

    fn require_subspace(&self, subspace: &str) -> Result<()> {
        if !self.app.has_subspace(subspace) {
            return Err(ChainError::SubspaceNotFound(subspace.to_string()));
        }
        Ok(())
    }

    pub fn set_param_set(&mut self, subspace: &str, any: &Any) -> Result<()> {
        self.require_subspace(subspace)?;
        let set = self.param_types.unpack_any(any)?;
        self.app.set_param_set(subspace, &set)?;
        info!("Updated {} params in subspace {}", any.type_url, subspace);
        Ok(())
    }

    /// Returns the subspace's current values, encoded as the type named by `type_url`.
    pub fn get_param_set(&self, subspace: &str, type_url: &str) -> Result<Vec<u8>> {
        self.require_subspace(subspace)?;
        let mut set = self.param_types.empty_param_set(type_url)?;
        self.app.get_param_set(subspace, &mut set)?;
        set.encode()
    }

    pub fn account_sequence(&self, address: &Address) -> Result<u64> {
        self.app.account_sequence(address)
    }

    pub fn account_number(&self, address: &Address) -> Result<u64> {
        self.app.account_number(address)
    }

    /// Operator addresses of the validator set, in genesis order.
    pub fn validator_addresses(&self) -> Vec<String> {
        self.app
            .validators()
            .iter()
            .map(|v| v.operator_address.to_text(VALOPER_PREFIX))
            .collect()
    }

    pub fn validator_private_key(&self, index: usize) -> Option<[u8; 32]> {
        self.app.validator_private_key(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::core::params::{AuthParams, ParamSet, AUTH_SUBSPACE};
    use crate::app::core::types::{paths, QueryBalanceRequest, QueryBalanceResponse};
    use crate::transaction::TypeUrl;

    fn env() -> Environment {
        Environment::create(&TubeConfig::default()).unwrap()
    }

    #[test]
    fn test_created_environment_is_committed() {
        let env = env();
        assert_eq!(env.block_height(), 1);
        assert_eq!(env.phase(), BlockPhase::BetweenBlocks);
        assert_eq!(env.validator_addresses().len(), 1);
        assert!(env.validator_addresses()[0].starts_with("injvaloper1"));
    }

    #[test]
    fn test_block_advances_height_and_time() {
        let mut env = env();
        let (height, time) = (env.block_height(), env.block_time_nanos());
        env.begin_block(7).unwrap();
        assert_eq!(env.phase(), BlockPhase::InBlock);
        env.end_block().unwrap();
        assert_eq!(env.block_height(), height + 1);
        assert_eq!(env.block_time_nanos(), time + 7_000_000_000);
    }

    #[test]
    fn test_zero_second_block_keeps_time() {
        let mut env = env();
        let (height, time) = (env.block_height(), env.block_time_nanos());
        env.advance_time(0).unwrap();
        assert_eq!(env.block_height(), height + 1);
        assert_eq!(env.block_time_nanos(), time);
    }

    #[test]
    fn test_unrepresentable_block_time_rejected() {
        let mut env = env();
        let (height, time) = (env.block_height(), env.block_time_nanos());
        for secs in [u64::MAX, i64::MAX as u64, 10_u64.pow(16), 10_u64.pow(12)] {
            let err = env.begin_block(secs).unwrap_err();
            assert!(matches!(err, ChainError::InvalidBlockTime(_)));
        }
        assert_eq!(env.phase(), BlockPhase::BetweenBlocks);
        assert_eq!(env.block_height(), height);
        assert_eq!(env.block_time_nanos(), time);

        env.advance_time(60).unwrap();
        assert_eq!(env.block_time_nanos(), time + 60_000_000_000);
    }

    #[test]
    fn test_end_block_without_begin_is_noop() {
        let mut env = env();
        let height = env.block_height();
        env.end_block().unwrap();
        env.end_block().unwrap();
        assert_eq!(env.block_height(), height);
        env.advance_time(1).unwrap();
        assert_eq!(env.block_height(), height + 1);
    }

    #[test]
    fn test_double_begin_advances_twice() {
        let mut env = env();
        let height = env.block_height();
        env.begin_block(5).unwrap();
        env.begin_block(5).unwrap();
        env.end_block().unwrap();
        assert_eq!(env.block_height(), height + 2);
    }

    #[test]
    fn test_fund_account_visible_to_query() {
        let mut env = env();
        let key = env.fund_account(&[Coin::new(1_000_000, "inj")]).unwrap();
        let req = bincode::serialize(&QueryBalanceRequest {
            address: key.address().to_string(),
            denom: "inj".to_string(),
        })
        .unwrap();
        let res: QueryBalanceResponse =
            bincode::deserialize(&env.query(paths::BANK_BALANCE, &req).unwrap()).unwrap();
        assert_eq!(res.balance, Some(Coin::new(1_000_000, "inj")));
        assert_eq!(env.account_sequence(&key.address()).unwrap(), 0);
    }

    #[test]
    fn test_param_set_round_trip() {
        let mut env = env();
        let mut params = AuthParams::genesis();
        params.tx_sig_limit = 3;
        let any = ParamSet::Auth(params.clone()).to_any().unwrap();
        env.set_param_set(AUTH_SUBSPACE, &any).unwrap();

        let bytes = env.get_param_set(AUTH_SUBSPACE, AuthParams::TYPE_URL).unwrap();
        let read: AuthParams = bincode::deserialize(&bytes).unwrap();
        assert_eq!(read, params);
    }

    #[test]
    fn test_param_errors() {
        let mut env = env();
        let any = ParamSet::Auth(AuthParams::genesis()).to_any().unwrap();
        let err = env.set_param_set("mint", &any).unwrap_err();
        assert_eq!(err.to_string(), "No subspace found for `mint`");

        let err = env.get_param_set(AUTH_SUBSPACE, "/unknown.Params").unwrap_err();
        assert_eq!(err.to_string(), "No param set found for `/unknown.Params`");
    }

    #[test]
    fn test_validator_private_key_matches_operator() {
        let env = env();
        let secret = env.validator_private_key(0).unwrap();
        let key = KeyPair::from_secret_bytes(&secret).unwrap();
        assert_eq!(
            key.address().to_text(VALOPER_PREFIX),
            env.validator_addresses()[0]
        );
        assert!(env.validator_private_key(1).is_none());
    }
}
