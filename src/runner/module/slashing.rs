use crate::app::core::types::{
    paths, QuerySigningInfoRequest, QuerySigningInfoResponse, QuerySlashingParamsRequest,
    QuerySlashingParamsResponse,
};
use crate::fn_query;
use crate::runner::{Module, Runner};

pub struct Slashing<'a, R: Runner<'a>> {
    runner: &'a R,
}

impl<'a, R: Runner<'a>> Module<'a, R> for Slashing<'a, R> {
    fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<'a, R> Slashing<'a, R>
where
    R: Runner<'a>,
{
    fn_query! {
        pub query_signing_info [paths::SLASHING_SIGNING_INFO]: QuerySigningInfoRequest => QuerySigningInfoResponse
    }

    fn_query! {
        pub query_params [paths::SLASHING_PARAMS]: QuerySlashingParamsRequest => QuerySlashingParamsResponse
    }
}
