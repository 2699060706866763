//! Driver-side client for the bridge.
//!
//! `TestApp` owns one environment and turns typed messages and queries into
//! bridge calls; `Module` wrappers built with [`fn_execute!`](crate::fn_execute)
//! and [`fn_query!`](crate::fn_query) give each chain module a typed API.

mod account;
mod app;
pub mod module;

pub use account::{FeeSetting, SigningAccount, DEFAULT_GAS_ADJUSTMENT};
pub use app::TestApp;
pub use module::Module;
pub use crate::result::RawResult;

use crate::abci::{Event, GasInfo, ResponseDeliverTx, TxMsgData};
use crate::result::ErrorKind;
use crate::transaction::Any;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    #[error("query error: {msg}")]
    QueryError { msg: String },
    #[error("execute error: {msg}")]
    ExecuteError { msg: String },
    #[error("decode error: {0}")]
    DecodeError(String),
    #[error("encode error: {0}")]
    EncodeError(String),
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Decodes a base64 result-codec buffer into its payload or the matching runner error.
pub fn decode_result(encoded: &str) -> RunnerResult<Vec<u8>> {
    let raw = RawResult::from_base64(encoded).map_err(|e| RunnerError::DecodeError(e.to_string()))?;
    match raw {
        RawResult::Ok(bytes) => Ok(bytes),
        RawResult::Err {
            kind: ErrorKind::Query,
            message,
        } => Err(RunnerError::QueryError { msg: message }),
        RawResult::Err {
            kind: ErrorKind::Execute,
            message,
        } => Err(RunnerError::ExecuteError { msg: message }),
    }
}

/// A successfully delivered transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteResponse<R> {
    /// First message response, decoded.
    pub data: R,
    pub raw_data: Vec<u8>,
    pub events: Vec<Event>,
    pub gas_info: GasInfo,
}

impl<R: DeserializeOwned> TryFrom<ResponseDeliverTx> for ExecuteResponse<R> {
    type Error = RunnerError;

    fn try_from(res: ResponseDeliverTx) -> Result<Self, Self::Error> {
        if !res.is_ok() {
            return Err(RunnerError::ExecuteError { msg: res.log });
        }

        let msg_data: TxMsgData =
            bincode::deserialize(&res.data).map_err(|e| RunnerError::DecodeError(e.to_string()))?;
        let first = msg_data
            .msg_responses
            .first()
            .ok_or_else(|| RunnerError::DecodeError("transaction returned no message responses".to_string()))?;
        let data = bincode::deserialize(&first.value)
            .map_err(|e| RunnerError::DecodeError(e.to_string()))?;

        Ok(ExecuteResponse {
            data,
            raw_data: res.data,
            events: res.events,
            gas_info: GasInfo {
                gas_wanted: res.gas_wanted,
                gas_used: res.gas_used,
            },
        })
    }
}

pub trait Runner<'a> {
    /// Signs `msgs` as one transaction and delivers it in its own block.
    fn execute_multiple_raw<R>(
        &self,
        msgs: Vec<Any>,
        signer: &SigningAccount,
    ) -> RunnerResult<ExecuteResponse<R>>
    where
        R: DeserializeOwned;

    fn execute_multiple<M, R>(
        &self,
        msgs: &[(M, &str)],
        signer: &SigningAccount,
    ) -> RunnerResult<ExecuteResponse<R>>
    where
        M: Serialize,
        R: DeserializeOwned,
    {
        let msgs = msgs
            .iter()
            .map(|(msg, type_url)| {
                Any::pack_as(msg, type_url).map_err(|e| RunnerError::EncodeError(e.to_string()))
            })
            .collect::<RunnerResult<Vec<_>>>()?;
        self.execute_multiple_raw(msgs, signer)
    }

    fn execute<M, R>(
        &self,
        msg: M,
        type_url: &str,
        signer: &SigningAccount,
    ) -> RunnerResult<ExecuteResponse<R>>
    where
        M: Serialize,
        R: DeserializeOwned,
    {
        self.execute_multiple(&[(msg, type_url)], signer)
    }

    fn query<Q, Res>(&self, path: &str, query: &Q) -> RunnerResult<Res>
    where
        Q: Serialize,
        Res: DeserializeOwned;
}
