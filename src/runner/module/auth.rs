use crate::app::core::types::{
    paths, QueryAccountRequest, QueryAccountResponse, QueryAuthParamsRequest,
    QueryAuthParamsResponse,
};
use crate::fn_query;
use crate::runner::{Module, Runner};

pub struct Auth<'a, R: Runner<'a>> {
    runner: &'a R,
}

impl<'a, R: Runner<'a>> Module<'a, R> for Auth<'a, R> {
    fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<'a, R> Auth<'a, R>
where
    R: Runner<'a>,
{
    fn_query! {
        pub query_account [paths::AUTH_ACCOUNT]: QueryAccountRequest => QueryAccountResponse
    }

    fn_query! {
        pub query_params [paths::AUTH_PARAMS]: QueryAuthParamsRequest => QueryAuthParamsResponse
    }
}
