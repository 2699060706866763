use crate::app::core::types::{paths, QueryValidatorsRequest, QueryValidatorsResponse};
use crate::fn_query;
use crate::runner::{Module, Runner};

pub struct Staking<'a, R: Runner<'a>> {
    runner: &'a R,
}

impl<'a, R: Runner<'a>> Module<'a, R> for Staking<'a, R> {
    fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<'a, R> Staking<'a, R>
where
    R: Runner<'a>,
{
    fn_query! {
        pub query_validators [paths::STAKING_VALIDATORS]: QueryValidatorsRequest => QueryValidatorsResponse
    }
}
