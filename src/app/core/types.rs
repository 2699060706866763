//! Messages, stored records and query shapes of the built-in modules.

use crate::app::core::params::{AuthParams, BankParams, SlashingParams};
use crate::crypto::Address;
use crate::transaction::{Coin, TypeUrl};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! type_url {
    ($($ty:ty => $url:literal),+ $(,)?) => {
        $(impl TypeUrl for $ty {
            const TYPE_URL: &'static str = $url;
        })+
    };
}

// ---------------------------------------------------------------------------
// auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: Address,
    pub public_key: Option<Vec<u8>>,
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountRequest {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountResponse {
    pub account: BaseAccount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAuthParamsRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAuthParamsResponse {
    pub params: AuthParams,
}

// ---------------------------------------------------------------------------
// bank
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendResponse {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBalanceRequest {
    pub address: String,
    pub denom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBalanceResponse {
    pub balance: Option<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAllBalancesRequest {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAllBalancesResponse {
    pub balances: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySupplyOfRequest {
    pub denom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySupplyOfResponse {
    pub amount: Coin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBankParamsRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBankParamsResponse {
    pub params: BankParams,
}

// ---------------------------------------------------------------------------
// staking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator_address: Address,
    pub consensus_address: Address,
    pub consensus_pubkey: Vec<u8>,
    pub tokens: u128,
    pub jailed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorsRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryValidatorsResponse {
    pub validators: Vec<Validator>,
}

// ---------------------------------------------------------------------------
// slashing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSigningInfo {
    pub address: Address,
    pub start_height: i64,
    pub index_offset: i64,
    pub jailed_until: DateTime<Utc>,
    pub tombstoned: bool,
    pub missed_blocks_counter: i64,
}

impl ValidatorSigningInfo {
    pub fn new(
        address: Address,
        start_height: i64,
        index_offset: i64,
        jailed_until: DateTime<Utc>,
        tombstoned: bool,
        missed_blocks_counter: i64,
    ) -> Self {
        ValidatorSigningInfo {
            address,
            start_height,
            index_offset,
            jailed_until,
            tombstoned,
            missed_blocks_counter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySigningInfoRequest {
    pub cons_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySigningInfoResponse {
    pub info: ValidatorSigningInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySlashingParamsRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySlashingParamsResponse {
    pub params: SlashingParams,
}

// ---------------------------------------------------------------------------
// counter
// ---------------------------------------------------------------------------

/// Adds `amount` to the chain-wide counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgIncrement {
    pub sender: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgIncrementResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCountRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCountResponse {
    pub count: u64,
}

type_url! {
    MsgSend => "/cosmos.bank.v1beta1.MsgSend",
    MsgSendResponse => "/cosmos.bank.v1beta1.MsgSendResponse",
    MsgIncrement => "/chaintube.counter.v1.MsgIncrement",
    MsgIncrementResponse => "/chaintube.counter.v1.MsgIncrementResponse",
}

/// Query paths served by the default router.
pub mod paths {
    pub const AUTH_ACCOUNT: &str = "/cosmos.auth.v1beta1.Query/Account";
    pub const AUTH_PARAMS: &str = "/cosmos.auth.v1beta1.Query/Params";
    pub const BANK_BALANCE: &str = "/cosmos.bank.v1beta1.Query/Balance";
    pub const BANK_ALL_BALANCES: &str = "/cosmos.bank.v1beta1.Query/AllBalances";
    pub const BANK_SUPPLY_OF: &str = "/cosmos.bank.v1beta1.Query/SupplyOf";
    pub const BANK_PARAMS: &str = "/cosmos.bank.v1beta1.Query/Params";
    pub const STAKING_VALIDATORS: &str = "/cosmos.staking.v1beta1.Query/Validators";
    pub const SLASHING_SIGNING_INFO: &str = "/cosmos.slashing.v1beta1.Query/SigningInfo";
    pub const SLASHING_PARAMS: &str = "/cosmos.slashing.v1beta1.Query/Params";
    pub const COUNTER_COUNT: &str = "/chaintube.counter.v1.Query/Count";
}
