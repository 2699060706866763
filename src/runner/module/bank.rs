use crate::app::core::types::{
    paths, MsgSend, MsgSendResponse, QueryAllBalancesRequest, QueryAllBalancesResponse,
    QueryBalanceRequest, QueryBalanceResponse, QueryBankParamsRequest, QueryBankParamsResponse,
    QuerySupplyOfRequest, QuerySupplyOfResponse,
};
use crate::runner::{Module, Runner};
use crate::{fn_execute, fn_query};

pub struct Bank<'a, R: Runner<'a>> {
    runner: &'a R,
}

impl<'a, R: Runner<'a>> Module<'a, R> for Bank<'a, R> {
    fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<'a, R> Bank<'a, R>
where
    R: Runner<'a>,
{
    fn_execute! {
        pub send: MsgSend => MsgSendResponse
    }

    fn_query! {
        pub query_balance [paths::BANK_BALANCE]: QueryBalanceRequest => QueryBalanceResponse
    }

    fn_query! {
        pub query_all_balances [paths::BANK_ALL_BALANCES]: QueryAllBalancesRequest => QueryAllBalancesResponse
    }

    fn_query! {
        pub query_supply_of [paths::BANK_SUPPLY_OF]: QuerySupplyOfRequest => QuerySupplyOfResponse
    }

    fn_query! {
        pub query_params [paths::BANK_PARAMS]: QueryBankParamsRequest => QueryBankParamsResponse
    }
}
