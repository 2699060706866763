//! Typed wrappers over a [`Runner`], one per chain module.

mod auth;
mod bank;
mod counter;
mod slashing;
mod staking;

pub use auth::Auth;
pub use bank::Bank;
pub use counter::Counter;
pub use slashing::Slashing;
pub use staking::Staking;

use crate::runner::Runner;

pub trait Module<'a, R: Runner<'a>> {
    fn new(runner: &'a R) -> Self;
}

/// Generates a method that signs and delivers one message.
///
/// `pub send: MsgSend => MsgSendResponse` uses the message's own type url;
/// `pub send: MsgSend["/custom.Url"] => MsgSendResponse` overrides it.
#[macro_export]
macro_rules! fn_execute {
    ($vis:vis $name:ident : $req:ty => $res:ty) => {
        $crate::fn_execute! {
            $vis $name: $req[<$req as $crate::transaction::TypeUrl>::TYPE_URL] => $res
        }
    };
    ($vis:vis $name:ident : $req:ty [$type_url:expr] => $res:ty) => {
        $vis fn $name(
            &self,
            msg: $req,
            signer: &$crate::runner::SigningAccount,
        ) -> $crate::runner::RunnerResult<$crate::runner::ExecuteResponse<$res>> {
            self.runner.execute(msg, $type_url, signer)
        }
    };
}

/// Generates a method that runs one query route.
#[macro_export]
macro_rules! fn_query {
    ($vis:vis $name:ident [$path:expr] : $req:ty => $res:ty) => {
        $vis fn $name(&self, req: &$req) -> $crate::runner::RunnerResult<$res> {
            self.runner.query($path, req)
        }
    };
}
