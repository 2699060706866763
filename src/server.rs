//! JSON-lines front end for the bridge.
//!
//! One request object per line in, one reply object per line out:
//! `{"ok": <value>}`, `{"error": "<message>"}` for a line that is not a valid
//! command, or `{"fatal": "<message>"}` when the command violated the bridge
//! contract. A fatal command leaves every environment as it was.

use crate::bridge::Bridge;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateEnvironment,
    FundAccount { env_id: u64, coins: String },
    AdvanceTime { env_id: u64, seconds: u64 },
    BeginBlock { env_id: u64 },
    EndBlock { env_id: u64 },
    Execute { env_id: u64, request: String },
    Query { env_id: u64, path: String, query: String },
    Simulate { env_id: u64, tx: String },
    SetParamSet { env_id: u64, subspace: String, param_set: String },
    GetParamSet { env_id: u64, subspace: String, type_url: String },
    GetBlockTime { env_id: u64 },
    GetBlockHeight { env_id: u64 },
    AccountSequence { env_id: u64, address: String },
    AccountNumber { env_id: u64, address: String },
    GetValidatorAddress { env_id: u64, index: i32 },
    GetValidatorPrivateKey { env_id: u64 },
}

/// Runs one command and wraps its return value as `{"ok": ...}`.
pub fn dispatch(bridge: &Bridge, cmd: Command) -> Value {
    let value = match cmd {
        Command::CreateEnvironment => json!(bridge.create_environment()),
        Command::FundAccount { env_id, coins } => json!(bridge.fund_account(env_id, &coins)),
        Command::AdvanceTime { env_id, seconds } => {
            bridge.advance_time(env_id, seconds);
            Value::Null
        }
        Command::BeginBlock { env_id } => {
            bridge.begin_block(env_id);
            Value::Null
        }
        Command::EndBlock { env_id } => {
            bridge.end_block(env_id);
            Value::Null
        }
        Command::Execute { env_id, request } => json!(bridge.execute(env_id, &request)),
        Command::Query {
            env_id,
            path,
            query,
        } => json!(bridge.query(env_id, &path, &query)),
        Command::Simulate { env_id, tx } => json!(bridge.simulate(env_id, &tx)),
        Command::SetParamSet {
            env_id,
            subspace,
            param_set,
        } => json!(bridge.set_param_set(env_id, &subspace, &param_set)),
        Command::GetParamSet {
            env_id,
            subspace,
            type_url,
        } => json!(bridge.get_param_set(env_id, &subspace, &type_url)),
        Command::GetBlockTime { env_id } => json!(bridge.get_block_time(env_id)),
        Command::GetBlockHeight { env_id } => json!(bridge.get_block_height(env_id)),
        Command::AccountSequence { env_id, address } => {
            json!(bridge.account_sequence(env_id, &address))
        }
        Command::AccountNumber { env_id, address } => {
            json!(bridge.account_number(env_id, &address))
        }
        Command::GetValidatorAddress { env_id, index } => {
            json!(bridge.get_validator_address(env_id, index))
        }
        Command::GetValidatorPrivateKey { env_id } => {
            json!(bridge.get_validator_private_key(env_id))
        }
    };
    json!({ "ok": value })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Parses and runs one request line, catching contract-violation panics.
pub fn handle_line(bridge: &Bridge, line: &str) -> Value {
    let cmd: Command = match serde_json::from_str(line) {
        Ok(cmd) => cmd,
        Err(e) => return json!({ "error": format!("invalid command: {}", e) }),
    };
    match catch_unwind(AssertUnwindSafe(|| dispatch(bridge, cmd))) {
        Ok(reply) => reply,
        Err(payload) => json!({ "fatal": panic_message(payload.as_ref()) }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TubeConfig;

    #[test]
    fn test_command_wire_format() {
        let cmd: Command =
            serde_json::from_str(r#"{"op":"get_validator_address","env_id":3,"index":0}"#).unwrap();
        assert_eq!(cmd, Command::GetValidatorAddress { env_id: 3, index: 0 });
        let cmd: Command = serde_json::from_str(r#"{"op":"create_environment"}"#).unwrap();
        assert_eq!(cmd, Command::CreateEnvironment);
    }

    #[test]
    fn test_handle_line_replies() {
        let bridge = Bridge::new(TubeConfig::default());
        let reply = handle_line(&bridge, r#"{"op":"create_environment"}"#);
        let id = reply["ok"].as_u64().unwrap();

        let reply = handle_line(&bridge, &format!(r#"{{"op":"get_block_height","env_id":{}}}"#, id));
        assert_eq!(reply["ok"], json!(1));

        let reply = handle_line(&bridge, r#"{"op":"begin_block","env_id":999}"#);
        assert_eq!(reply["fatal"], json!("env not found: 999"));

        let reply = handle_line(&bridge, "not json");
        assert!(reply["error"].as_str().unwrap().starts_with("invalid command"));
    }
}
