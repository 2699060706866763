//! Query routing: a table from fully-qualified query path to handler.

use crate::app::core::state::ChainState;
use crate::app::core::types::*;
use crate::crypto::{Address, ACCOUNT_PREFIX, VALCONS_PREFIX};
use crate::error::{ChainError, Result};
use crate::transaction::Coin;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

/// Handlers read committed state only.
pub type QueryHandler = fn(&ChainState, &[u8]) -> Result<Vec<u8>>;

#[derive(Clone, Default)]
pub struct QueryRouter {
    routes: HashMap<String, QueryHandler>,
}

impl QueryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with every built-in module's query service registered.
    pub fn with_default_routes() -> Self {
        let mut router = Self::new();
        router.register(paths::AUTH_ACCOUNT, query_account);
        router.register(paths::AUTH_PARAMS, query_auth_params);
        router.register(paths::BANK_BALANCE, query_balance);
        router.register(paths::BANK_ALL_BALANCES, query_all_balances);
        router.register(paths::BANK_SUPPLY_OF, query_supply_of);
        router.register(paths::BANK_PARAMS, query_bank_params);
        router.register(paths::STAKING_VALIDATORS, query_validators);
        router.register(paths::SLASHING_SIGNING_INFO, query_signing_info);
        router.register(paths::SLASHING_PARAMS, query_slashing_params);
        router.register(paths::COUNTER_COUNT, query_count);
        router
    }

    pub fn register(&mut self, path: &str, handler: QueryHandler) {
        self.routes.insert(path.to_string(), handler);
    }

    pub fn route(&self, path: &str) -> Option<QueryHandler> {
        self.routes.get(path).copied()
    }

    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

fn decode_request<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    bincode::deserialize(data)
        .map_err(|e| ChainError::QueryFailed(format!("invalid request: {}", e)))
}

fn encode_response<T: Serialize>(response: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(response)?)
}

fn parse_address(text: &str) -> Result<Address> {
    Address::from_text(ACCOUNT_PREFIX, text)
        .map_err(|e| ChainError::QueryFailed(e.to_string()))
}

fn query_account(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let req: QueryAccountRequest = decode_request(data)?;
    let address = parse_address(&req.address)?;
    let account = state
        .account(&address)
        .cloned()
        .ok_or_else(|| ChainError::QueryFailed(format!("account {} not found", req.address)))?;
    encode_response(&QueryAccountResponse { account })
}

fn query_auth_params(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let _: QueryAuthParamsRequest = decode_request(data)?;
    encode_response(&QueryAuthParamsResponse {
        params: state.auth_params()?,
    })
}

fn query_balance(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let req: QueryBalanceRequest = decode_request(data)?;
    let address = parse_address(&req.address)?;
    Coin::validate_denom(&req.denom).map_err(|e| ChainError::QueryFailed(e.to_string()))?;
    let amount = state.balance(&address, &req.denom);
    encode_response(&QueryBalanceResponse {
        balance: Some(Coin::new(amount, req.denom)),
    })
}

fn query_all_balances(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let req: QueryAllBalancesRequest = decode_request(data)?;
    let address = parse_address(&req.address)?;
    encode_response(&QueryAllBalancesResponse {
        balances: state.all_balances(&address),
    })
}

fn query_supply_of(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let req: QuerySupplyOfRequest = decode_request(data)?;
    let amount = state.supply_of(&req.denom);
    encode_response(&QuerySupplyOfResponse {
        amount: Coin::new(amount, req.denom),
    })
}

fn query_bank_params(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let _: QueryBankParamsRequest = decode_request(data)?;
    encode_response(&QueryBankParamsResponse {
        params: state.bank_params()?,
    })
}

fn query_validators(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let _: QueryValidatorsRequest = decode_request(data)?;
    encode_response(&QueryValidatorsResponse {
        validators: state.validators.clone(),
    })
}

fn query_signing_info(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let req: QuerySigningInfoRequest = decode_request(data)?;
    let address = Address::from_text(VALCONS_PREFIX, &req.cons_address)
        .map_err(|e| ChainError::QueryFailed(e.to_string()))?;
    let info = state.signing_infos.get(&address).cloned().ok_or_else(|| {
        ChainError::QueryFailed(format!("SigningInfo not found for validator {}", req.cons_address))
    })?;
    encode_response(&QuerySigningInfoResponse { info })
}

fn query_slashing_params(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let _: QuerySlashingParamsRequest = decode_request(data)?;
    encode_response(&QuerySlashingParamsResponse {
        params: state.slashing_params()?,
    })
}

fn query_count(state: &ChainState, data: &[u8]) -> Result<Vec<u8>> {
    let _: QueryCountRequest = decode_request(data)?;
    encode_response(&QueryCountResponse {
        count: state.counter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_unknown_path_has_no_route() {
        let router = QueryRouter::with_default_routes();
        assert!(router.route("/cosmos.bank.v1beta1.Query/Nope").is_none());
        assert!(router.paths().contains(&paths::BANK_BALANCE));
    }

    #[test]
    fn test_balance_query() {
        let mut state = ChainState::new();
        let address = KeyPair::generate().address();
        state.mint_coins(&address, &[Coin::new(77, "inj")]).unwrap();

        let router = QueryRouter::with_default_routes();
        let handler = router.route(paths::BANK_BALANCE).unwrap();
        let req = bincode::serialize(&QueryBalanceRequest {
            address: address.to_string(),
            denom: "inj".to_string(),
        })
        .unwrap();
        let res: QueryBalanceResponse = bincode::deserialize(&handler(&state, &req).unwrap()).unwrap();
        assert_eq!(res.balance, Some(Coin::new(77, "inj")));
    }

    #[test]
    fn test_malformed_request_is_query_error() {
        let state = ChainState::new();
        let router = QueryRouter::with_default_routes();
        let handler = router.route(paths::BANK_BALANCE).unwrap();
        let err = handler(&state, &[0xff]).unwrap_err();
        assert!(matches!(err, ChainError::QueryFailed(_)));
    }

    #[test]
    fn test_missing_account_is_query_error() {
        let state = ChainState::new();
        let address = KeyPair::generate().address();
        let req = bincode::serialize(&QueryAccountRequest {
            address: address.to_string(),
        })
        .unwrap();
        let err = query_account(&state, &req).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
