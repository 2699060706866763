// Thin re-export module: the reference application lives in `app/core.rs`,
// split into state, parameters, routing, gas and the ante handler.

pub mod core;
pub use self::core::*;

use crate::abci::{GasInfo, Header, RequestDeliverTx, ResponseCommit, ResponseDeliverTx};
use crate::crypto::Address;
use crate::error::Result;
use crate::transaction::Coin;

/// The chain application an environment drives.
///
/// Implementations are not expected to be safe for concurrent mutation; the
/// harness serializes every `&mut self` call.
pub trait Application: Send + Sync {
    fn chain_id(&self) -> &str;

    /// Opens a block. Fails if the block cannot be produced (e.g. missing signing info).
    fn begin_block(&mut self, header: Header) -> Result<()>;

    /// Runs a transaction inside the open block. Transaction failures are data.
    fn deliver_tx(&mut self, req: RequestDeliverTx) -> ResponseDeliverTx;

    fn end_block(&mut self, height: i64) -> Result<()>;

    /// Persists the open block and returns the new app hash.
    fn commit(&mut self) -> Result<ResponseCommit>;

    /// Runs a transaction against a throwaway copy of the latest state.
    fn simulate(&self, tx_bytes: &[u8]) -> Result<GasInfo>;

    /// Resolves `path` in the query router and runs it against committed state.
    fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>>;

    fn fund_account(&mut self, address: &Address, coins: &[Coin]) -> Result<()>;

    fn account_sequence(&self, address: &Address) -> Result<u64>;

    fn account_number(&self, address: &Address) -> Result<u64>;

    fn has_subspace(&self, name: &str) -> bool;

    fn set_param_set(&mut self, subspace: &str, params: &ParamSet) -> Result<()>;

    /// Populates `params` from the subspace's current values.
    fn get_param_set(&self, subspace: &str, params: &mut ParamSet) -> Result<()>;

    fn validators(&self) -> Vec<Validator>;

    fn validator_private_key(&self, index: usize) -> Option<[u8; 32]>;

    fn set_validator_signing_info(&mut self, info: ValidatorSigningInfo) -> Result<()>;
}
