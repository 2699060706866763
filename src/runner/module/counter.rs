use crate::app::core::types::{
    paths, MsgIncrement, MsgIncrementResponse, QueryCountRequest, QueryCountResponse,
};
use crate::runner::{Module, Runner};
use crate::{fn_execute, fn_query};

pub struct Counter<'a, R: Runner<'a>> {
    runner: &'a R,
}

impl<'a, R: Runner<'a>> Module<'a, R> for Counter<'a, R> {
    fn new(runner: &'a R) -> Self {
        Self { runner }
    }
}

impl<'a, R> Counter<'a, R>
where
    R: Runner<'a>,
{
    fn_execute! {
        pub increment: MsgIncrement => MsgIncrementResponse
    }

    fn_query! {
        pub query_count [paths::COUNTER_COUNT]: QueryCountRequest => QueryCountResponse
    }
}
