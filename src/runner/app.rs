use crate::abci::{GasInfo, RequestDeliverTx, ResponseDeliverTx};
use crate::bridge::Bridge;
use crate::runner::account::{FeeSetting, SigningAccount, DEFAULT_GAS_ADJUSTMENT};
use crate::runner::{decode_result, ExecuteResponse, Runner, RunnerError, RunnerResult};
use crate::transaction::{Any, AuthInfo, Coin, Fee, Tx, TxBody};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

fn encode_err(e: impl std::fmt::Display) -> RunnerError {
    RunnerError::EncodeError(e.to_string())
}

fn decode_err(e: impl std::fmt::Display) -> RunnerError {
    RunnerError::DecodeError(e.to_string())
}

/// One environment, driven through a [`Bridge`].
pub struct TestApp {
    bridge: Arc<Bridge>,
    id: u64,
    // Keeps one begin/deliver/end sequence from interleaving with another.
    block: Mutex<()>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Creates an environment on the process-wide bridge.
    pub fn new() -> Self {
        Self::with_bridge(Bridge::global())
    }

    pub fn with_bridge(bridge: Arc<Bridge>) -> Self {
        let id = bridge.create_environment();
        TestApp {
            bridge,
            id,
            block: Mutex::new(()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    fn default_fee_setting(&self) -> FeeSetting {
        FeeSetting::Auto {
            gas_price: Coin::new(0, self.bridge.config().bond_denom.clone()),
            gas_adjustment: DEFAULT_GAS_ADJUSTMENT,
        }
    }

    /// Creates an account holding `coins`.
    pub fn init_account(&self, coins: &[Coin]) -> RunnerResult<SigningAccount> {
        let coins_json = serde_json::to_string(coins).map_err(encode_err)?;
        let key_b64 = self.bridge.fund_account(self.id, &coins_json);
        let secret = STANDARD.decode(key_b64).map_err(decode_err)?;
        SigningAccount::from_secret_bytes(&secret, self.default_fee_setting()).map_err(decode_err)
    }

    pub fn init_accounts(&self, coins: &[Coin], count: usize) -> RunnerResult<Vec<SigningAccount>> {
        (0..count).map(|_| self.init_account(coins)).collect()
    }

    /// Signing account of the genesis validator's operator.
    pub fn get_first_validator_signing_account(
        &self,
        denom: String,
        gas_adjustment: f64,
    ) -> RunnerResult<SigningAccount> {
        let secret = STANDARD
            .decode(self.bridge.get_validator_private_key(self.id))
            .map_err(decode_err)?;
        SigningAccount::from_secret_bytes(
            &secret,
            FeeSetting::Auto {
                gas_price: Coin::new(0, denom),
                gas_adjustment,
            },
        )
        .map_err(decode_err)
    }

    /// Produces one block `seconds` after the current one.
    pub fn increase_time(&self, seconds: u64) {
        self.bridge.advance_time(self.id, seconds)
    }

    pub fn get_block_height(&self) -> i64 {
        self.bridge.get_block_height(self.id)
    }

    pub fn get_block_time_nanos(&self) -> i64 {
        self.bridge.get_block_time(self.id)
    }

    pub fn get_block_time_seconds(&self) -> i64 {
        self.get_block_time_nanos() / 1_000_000_000
    }

    pub fn get_validator_address(&self, index: i32) -> String {
        self.bridge.get_validator_address(self.id, index)
    }

    pub fn get_account_sequence(&self, address: &str) -> u64 {
        self.bridge.account_sequence(self.id, address)
    }

    pub fn get_account_number(&self, address: &str) -> u64 {
        self.bridge.account_number(self.id, address)
    }

    fn create_signed_tx(&self, msgs: Vec<Any>, signer: &SigningAccount, fee: Fee) -> RunnerResult<Vec<u8>> {
        let address = signer.address();
        let body = TxBody {
            messages: msgs,
            memo: String::new(),
        };
        let auth_info = AuthInfo {
            public_key: signer.public_key_bytes(),
            sequence: self.get_account_sequence(&address),
            fee,
        };
        let sign_bytes = Tx::sign_bytes(
            &body,
            &auth_info,
            &self.bridge.config().chain_id,
            self.get_account_number(&address),
        )
        .map_err(encode_err)?;
        let signature = signer.sign(&sign_bytes).map_err(encode_err)?;

        Tx {
            body,
            auth_info,
            signature,
        }
        .encode()
        .map_err(encode_err)
    }

    /// Estimates gas for `msgs` without delivering them.
    pub fn simulate_tx(&self, msgs: Vec<Any>, signer: &SigningAccount) -> RunnerResult<GasInfo> {
        let fee = Fee {
            amount: Vec::new(),
            gas_limit: 0,
        };
        let tx = self.create_signed_tx(msgs, signer, fee)?;
        let bytes = decode_result(&self.bridge.simulate(self.id, &STANDARD.encode(tx)))?;
        GasInfo::decode(&bytes).map_err(decode_err)
    }

    fn calculate_fee(&self, msgs: &[Any], signer: &SigningAccount) -> RunnerResult<Fee> {
        let (price, gas_limit) = match signer.fee_setting() {
            FeeSetting::Auto {
                gas_price,
                gas_adjustment,
            } => {
                let gas = self.simulate_tx(msgs.to_vec(), signer)?;
                let gas_limit = (gas.gas_used as f64 * gas_adjustment).ceil() as u64;
                let amount = gas_price.amount.saturating_mul(gas_limit as u128);
                (Coin::new(amount, gas_price.denom.clone()), gas_limit)
            }
            FeeSetting::Custom { amount, gas_limit } => (amount.clone(), *gas_limit),
        };

        let amount = if price.amount == 0 { Vec::new() } else { vec![price] };
        Ok(Fee { amount, gas_limit })
    }

    fn deliver(&self, msgs: Vec<Any>, signer: &SigningAccount) -> RunnerResult<ResponseDeliverTx> {
        let fee = self.calculate_fee(&msgs, signer)?;
        let tx = self.create_signed_tx(msgs, signer, fee)?;
        let req = RequestDeliverTx { tx }.encode().map_err(encode_err)?;
        let bytes = decode_result(&self.bridge.execute(self.id, &STANDARD.encode(req)))?;
        ResponseDeliverTx::decode(&bytes).map_err(decode_err)
    }

    pub fn set_param_set(&self, subspace: &str, params: Any) -> RunnerResult<()> {
        let bytes = params.encode().map_err(encode_err)?;
        decode_result(&self.bridge.set_param_set(self.id, subspace, &STANDARD.encode(bytes)))?;
        Ok(())
    }

    pub fn get_param_set<P: DeserializeOwned>(&self, subspace: &str, type_url: &str) -> RunnerResult<P> {
        let bytes = decode_result(&self.bridge.get_param_set(self.id, subspace, type_url))?;
        bincode::deserialize(&bytes).map_err(decode_err)
    }
}

impl<'a> Runner<'a> for TestApp {
    fn execute_multiple_raw<R>(
        &self,
        msgs: Vec<Any>,
        signer: &SigningAccount,
    ) -> RunnerResult<ExecuteResponse<R>>
    where
        R: DeserializeOwned,
    {
        let _block = self.block.lock();
        self.bridge.begin_block(self.id);
        let delivered = self.deliver(msgs, signer);
        self.bridge.end_block(self.id);
        ExecuteResponse::try_from(delivered?)
    }

    fn query<Q, Res>(&self, path: &str, query: &Q) -> RunnerResult<Res>
    where
        Q: Serialize,
        Res: DeserializeOwned,
    {
        let bytes = bincode::serialize(query).map_err(encode_err)?;
        let res = decode_result(&self.bridge.query(self.id, path, &STANDARD.encode(bytes)))?;
        bincode::deserialize(&res).map_err(decode_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::core::params::{BankParams, ParamSet, BANK_SUBSPACE};
    use crate::config::TubeConfig;
    use crate::transaction::TypeUrl;

    fn app() -> TestApp {
        TestApp::with_bridge(Arc::new(Bridge::new(TubeConfig::default())))
    }

    #[test]
    fn test_increase_time() {
        let app = app();
        let (height, secs) = (app.get_block_height(), app.get_block_time_seconds());
        app.increase_time(10);
        assert_eq!(app.get_block_height(), height + 1);
        assert_eq!(app.get_block_time_seconds(), secs + 10);
    }

    #[test]
    fn test_init_accounts_are_distinct() {
        let app = app();
        let accounts = app.init_accounts(&[Coin::new(10, "inj")], 3).unwrap();
        assert_eq!(accounts.len(), 3);
        assert_ne!(accounts[0].address(), accounts[1].address());
        let numbers: Vec<u64> = accounts
            .iter()
            .map(|a| app.get_account_number(&a.address()))
            .collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_param_set_via_runner() {
        let app = app();
        let mut params = BankParams::genesis();
        params.default_send_enabled = false;
        app.set_param_set(BANK_SUBSPACE, ParamSet::Bank(params.clone()).to_any().unwrap())
            .unwrap();
        let read: BankParams = app.get_param_set(BANK_SUBSPACE, BankParams::TYPE_URL).unwrap();
        assert_eq!(read, params);

        let err = app.get_param_set::<BankParams>("nope", BankParams::TYPE_URL).unwrap_err();
        assert_eq!(
            err,
            RunnerError::ExecuteError {
                msg: "No subspace found for `nope`".to_string()
            }
        );
    }

    #[test]
    fn test_validator_account_can_sign() {
        let app = app();
        let validator = app
            .get_first_validator_signing_account("inj".to_string(), 1.5)
            .unwrap();
        assert_eq!(app.get_account_sequence(&validator.address()), 0);
    }
}
