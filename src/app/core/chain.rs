use crate::abci::{
    Event, GasInfo, Header, RequestDeliverTx, ResponseCommit, ResponseDeliverTx, TxMsgData,
};
use crate::app::core::gas::GasMeter;
use crate::app::core::params::ParamSet;
use crate::app::core::router::QueryRouter;
use crate::app::core::state::{ChainState, BONDED_POOL};
use crate::app::core::types::*;
use crate::app::core::validation::ante_handle;
use crate::app::Application;
use crate::config::TubeConfig;
use crate::crypto::{Address, KeyPair, ACCOUNT_PREFIX, VALCONS_PREFIX};
use crate::error::{codes, ChainError, Result, TxError};
use crate::transaction::{coins_to_string, validate_coins, Any, Coin, Tx, TypeUrl};
use tracing::{debug, warn};

/// Outcome of running one transaction against a state branch.
struct TxRun {
    gas: GasInfo,
    outcome: std::result::Result<(TxMsgData, Vec<Event>), TxError>,
}

/// Deterministic in-process chain application with auth, bank, staking,
/// slashing and counter modules.
///
/// Committed state is only replaced on `commit`; an open block works on its
/// own branch (`deliver_state`), so queries never observe a half-applied block.
pub struct SimApp {
    chain_id: String,
    committed: ChainState,
    deliver_state: Option<ChainState>,
    header: Option<Header>,
    validator_keys: Vec<KeyPair>,
    router: QueryRouter,
}

impl SimApp {
    /// Builds the genesis state: module params, one funded operator account per validator, and the validator set.
    ///
    /// Signing infos are deliberately left empty; whoever drives the chain seeds them before the first block.
    pub fn setup(config: &TubeConfig) -> Result<Self> {
        let mut state = ChainState::new();
        state.init_params()?;

        let stake = Coin::new(config.validator_stake, config.bond_denom.clone());
        let mut validator_keys = Vec::with_capacity(config.validator_count);
        for _ in 0..config.validator_count {
            let operator = KeyPair::generate();
            let consensus = KeyPair::generate();

            state.mint_coins(&operator.address(), std::slice::from_ref(&stake))?;
            state.mint_coins(&Address::module(BONDED_POOL), std::slice::from_ref(&stake))?;
            state.validators.push(Validator {
                operator_address: operator.address(),
                consensus_address: consensus.address(),
                consensus_pubkey: consensus.public_key_bytes().to_vec(),
                tokens: config.validator_stake,
                jailed: false,
            });
            validator_keys.push(operator);
        }

        debug!(
            "Genesis state built for {} with {} validator(s)",
            config.chain_id,
            validator_keys.len()
        );

        Ok(SimApp {
            chain_id: config.chain_id.clone(),
            committed: state,
            deliver_state: None,
            header: None,
            validator_keys,
            router: QueryRouter::with_default_routes(),
        })
    }

    pub fn committed_state(&self) -> &ChainState {
        &self.committed
    }

    /// Applies `f` to committed state and, when a block is open, to its branch as well,
    /// so the next commit keeps the change. Either both succeed or nothing changes.
    fn write_through<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut ChainState) -> Result<()>,
    {
        let mut committed = self.committed.clone();
        f(&mut committed)?;
        let branch = match &self.deliver_state {
            Some(state) => {
                let mut state = state.clone();
                f(&mut state)?;
                Some(state)
            }
            None => None,
        };
        self.committed = committed;
        if branch.is_some() {
            self.deliver_state = branch;
        }
        Ok(())
    }
}

fn run_tx(chain_id: &str, state: &mut ChainState, tx_bytes: &[u8], simulate: bool) -> TxRun {
    let tx = match Tx::decode(tx_bytes) {
        Ok(tx) => tx,
        Err(e) => {
            return TxRun {
                gas: GasInfo::default(),
                outcome: Err(TxError::new(codes::TX_DECODE, e.to_string())),
            }
        }
    };

    let gas_wanted = tx.auth_info.fee.gas_limit;
    let mut meter = if simulate {
        GasMeter::infinite()
    } else {
        GasMeter::new(gas_wanted)
    };

    let fail = |err: TxError, meter: &GasMeter| TxRun {
        gas: GasInfo {
            gas_wanted,
            gas_used: meter.consumed(),
        },
        outcome: Err(err),
    };

    // Ante writes (fee, sequence) stick even when a message fails.
    let mut ante_state = state.clone();
    let signer = match ante_handle(&mut ante_state, &tx, tx_bytes.len(), chain_id, &mut meter, simulate) {
        Ok(signer) => signer,
        Err(err) => return fail(err, &meter),
    };
    *state = ante_state;

    let sequence = state.account(&signer).map_or(0, |a| a.sequence);
    let mut events = vec![Event::new("tx").attr("acc_seq", format!("{}/{}", signer, sequence - 1))];
    if !tx.auth_info.fee.amount.is_empty() {
        events.push(
            Event::new("tx")
                .attr("fee", coins_to_string(&tx.auth_info.fee.amount))
                .attr("fee_payer", signer.to_string()),
        );
    }

    let mut msg_state = state.clone();
    let mut msg_data = TxMsgData::default();
    for msg in &tx.body.messages {
        match handle_msg(&mut msg_state, &signer, msg, &mut meter) {
            Ok((response, msg_events)) => {
                msg_data.msg_responses.push(response);
                events.push(Event::new("message").attr("action", msg.type_url.clone()));
                events.extend(msg_events);
            }
            Err(err) => return fail(err, &meter),
        }
    }
    *state = msg_state;

    TxRun {
        gas: GasInfo {
            gas_wanted,
            gas_used: meter.consumed(),
        },
        outcome: Ok((msg_data, events)),
    }
}

fn handle_msg(
    state: &mut ChainState,
    signer: &Address,
    msg: &Any,
    meter: &mut GasMeter,
) -> std::result::Result<(Any, Vec<Event>), TxError> {
    let decode_err = |e: ChainError| TxError::new(codes::TX_DECODE, e.to_string());
    let response = |r: std::result::Result<Any, ChainError>| {
        r.map_err(|e| TxError::new(codes::TX_DECODE, e.to_string()))
    };

    match msg.type_url.as_str() {
        MsgSend::TYPE_URL => {
            let msg: MsgSend = msg.unpack().map_err(decode_err)?;
            let events = handle_send(state, signer, &msg, meter)?;
            Ok((response(Any::pack(&MsgSendResponse {}))?, events))
        }
        MsgIncrement::TYPE_URL => {
            let msg: MsgIncrement = msg.unpack().map_err(decode_err)?;
            let (count, events) = handle_increment(state, signer, &msg, meter)?;
            Ok((response(Any::pack(&MsgIncrementResponse { count }))?, events))
        }
        other => Err(TxError::new(
            codes::UNKNOWN_REQUEST,
            format!("unrecognized message type: {}", other),
        )),
    }
}

fn parse_msg_address(text: &str, field: &str) -> std::result::Result<Address, TxError> {
    Address::from_text(ACCOUNT_PREFIX, text).map_err(|e| {
        TxError::new(codes::INVALID_ADDRESS, format!("invalid {} address: {}", field, e))
    })
}

fn handle_send(
    state: &mut ChainState,
    signer: &Address,
    msg: &MsgSend,
    meter: &mut GasMeter,
) -> std::result::Result<Vec<Event>, TxError> {
    let from = parse_msg_address(&msg.from_address, "from")?;
    let to = parse_msg_address(&msg.to_address, "to")?;
    if from != *signer {
        return Err(TxError::new(
            codes::UNAUTHORIZED,
            format!("{} is not the signer of this transaction", msg.from_address),
        ));
    }
    validate_coins(&msg.amount).map_err(|e| TxError::new(codes::INVALID_COINS, e.to_string()))?;

    let params = state
        .bank_params()
        .map_err(|e| TxError::new(codes::INVALID_REQUEST, e.to_string()))?;
    for coin in &msg.amount {
        if !params.is_send_enabled(&coin.denom) {
            return Err(TxError::new(
                codes::SEND_DISABLED,
                format!("{} transfers are currently disabled", coin.denom),
            ));
        }
    }

    for coin in &msg.amount {
        meter.consume_read(coin.denom.len() + 16)?;
        meter.consume_write(coin.denom.len() + 16)?;
        meter.consume_write(coin.denom.len() + 16)?;
    }
    state.send_coins(&from, &to, &msg.amount)?;

    let amount = coins_to_string(&msg.amount);
    Ok(vec![
        Event::new("coin_spent")
            .attr("spender", msg.from_address.clone())
            .attr("amount", amount.clone()),
        Event::new("coin_received")
            .attr("receiver", msg.to_address.clone())
            .attr("amount", amount.clone()),
        Event::new("transfer")
            .attr("recipient", msg.to_address.clone())
            .attr("sender", msg.from_address.clone())
            .attr("amount", amount),
    ])
}

fn handle_increment(
    state: &mut ChainState,
    signer: &Address,
    msg: &MsgIncrement,
    meter: &mut GasMeter,
) -> std::result::Result<(u64, Vec<Event>), TxError> {
    let sender = parse_msg_address(&msg.sender, "sender")?;
    if sender != *signer {
        return Err(TxError::new(
            codes::UNAUTHORIZED,
            format!("{} is not the signer of this transaction", msg.sender),
        ));
    }
    if msg.amount == 0 {
        return Err(TxError::new(codes::INVALID_REQUEST, "increment amount must be positive"));
    }

    meter.consume_read(8)?;
    meter.consume_write(8)?;
    state.counter = state
        .counter
        .checked_add(msg.amount)
        .ok_or_else(|| TxError::new(codes::INVALID_REQUEST, "counter overflow"))?;

    let event = Event::new("increment")
        .attr("sender", msg.sender.clone())
        .attr("count", state.counter.to_string());
    Ok((state.counter, vec![event]))
}

impl Application for SimApp {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn begin_block(&mut self, header: Header) -> Result<()> {
        let mut branch = match self.deliver_state.take() {
            Some(open) => {
                warn!(
                    "begin_block at height {} while block {:?} is still open; continuing on the uncommitted branch",
                    header.height,
                    self.header.as_ref().map(|h| h.height)
                );
                open
            }
            None => self.committed.clone(),
        };

        // Every bonded validator must have signing info to record its liveness.
        let missing = branch
            .validators
            .iter()
            .find(|v| !branch.signing_infos.contains_key(&v.consensus_address))
            .map(|v| v.consensus_address);
        if let Some(address) = missing {
            if self.header.is_some() {
                self.deliver_state = Some(branch);
            }
            return Err(ChainError::MissingSigningInfo(address.to_text(VALCONS_PREFIX)));
        }

        let consensus: Vec<Address> = branch.validators.iter().map(|v| v.consensus_address).collect();
        for address in consensus {
            if let Some(info) = branch.signing_infos.get_mut(&address) {
                info.index_offset += 1;
            }
        }
        self.deliver_state = Some(branch);
        self.header = Some(header);
        Ok(())
    }

    fn deliver_tx(&mut self, req: RequestDeliverTx) -> ResponseDeliverTx {
        let Some(state) = self.deliver_state.as_mut() else {
            let err = TxError::new(
                codes::NO_BLOCK_IN_PROGRESS,
                "no block in progress; begin a block before delivering transactions",
            );
            return ResponseDeliverTx::failure(&err, 0, 0);
        };

        let run = run_tx(&self.chain_id, state, &req.tx, false);
        match run.outcome {
            Ok((msg_data, events)) => {
                let data = match bincode::serialize(&msg_data) {
                    Ok(data) => data,
                    Err(e) => {
                        let err = TxError::new(codes::TX_DECODE, e.to_string());
                        return ResponseDeliverTx::failure(&err, run.gas.gas_wanted, run.gas.gas_used);
                    }
                };
                ResponseDeliverTx {
                    code: codes::OK,
                    data,
                    log: String::new(),
                    gas_wanted: run.gas.gas_wanted,
                    gas_used: run.gas.gas_used,
                    events,
                    codespace: String::new(),
                }
            }
            Err(err) => {
                debug!("Transaction failed with code {}: {}", err.code, err.log);
                ResponseDeliverTx::failure(&err, run.gas.gas_wanted, run.gas.gas_used)
            }
        }
    }

    fn end_block(&mut self, height: i64) -> Result<()> {
        let header = self.header.as_ref().ok_or(ChainError::NoBlockInProgress)?;
        if header.height != height {
            return Err(ChainError::InvalidTransaction(format!(
                "end_block height {} does not match open block {}",
                height, header.height
            )));
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<ResponseCommit> {
        let header = self.header.take().ok_or(ChainError::NoBlockInProgress)?;
        let state = self
            .deliver_state
            .take()
            .ok_or(ChainError::NoBlockInProgress)?;
        let app_hash = state.app_hash()?;
        self.committed = state;

        let commit = ResponseCommit {
            height: header.height,
            app_hash,
        };
        debug!("Committed height {} app_hash {}", commit.height, hex::encode(app_hash));
        Ok(commit)
    }

    fn simulate(&self, tx_bytes: &[u8]) -> Result<GasInfo> {
        let mut scratch = self
            .deliver_state
            .as_ref()
            .unwrap_or(&self.committed)
            .clone();
        let run = run_tx(&self.chain_id, &mut scratch, tx_bytes, true);
        match run.outcome {
            Ok(_) => Ok(run.gas),
            Err(err) => Err(ChainError::SimulationFailed(err.log)),
        }
    }

    fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let handler = self
            .router
            .route(path)
            .ok_or_else(|| ChainError::NoRoute(path.to_string()))?;
        handler(&self.committed, data)
    }

    fn fund_account(&mut self, address: &Address, coins: &[Coin]) -> Result<()> {
        self.write_through(|state| state.mint_coins(address, coins))?;
        // The open block may already have handed out account numbers; its numbering wins.
        if let Some(branch) = &self.deliver_state {
            if let (Some(open), Some(account)) = (
                branch.account(address),
                self.committed.accounts.get_mut(address),
            ) {
                account.account_number = open.account_number;
            }
            self.committed.next_account_number = self
                .committed
                .next_account_number
                .max(branch.next_account_number);
        }
        Ok(())
    }

    fn account_sequence(&self, address: &Address) -> Result<u64> {
        self.committed
            .account(address)
            .map(|a| a.sequence)
            .ok_or_else(|| ChainError::AccountNotFound(address.to_string()))
    }

    fn account_number(&self, address: &Address) -> Result<u64> {
        self.committed
            .account(address)
            .map(|a| a.account_number)
            .ok_or_else(|| ChainError::AccountNotFound(address.to_string()))
    }

    fn has_subspace(&self, name: &str) -> bool {
        self.committed.subspace(name).is_some()
    }

    fn set_param_set(&mut self, subspace: &str, params: &ParamSet) -> Result<()> {
        self.write_through(|state| {
            state
                .subspace_mut(subspace)
                .ok_or_else(|| ChainError::SubspaceNotFound(subspace.to_string()))?
                .set_param_set(params)
        })
    }

    fn get_param_set(&self, subspace: &str, params: &mut ParamSet) -> Result<()> {
        self.committed
            .subspace(subspace)
            .ok_or_else(|| ChainError::SubspaceNotFound(subspace.to_string()))?
            .get_param_set(params)
    }

    fn validators(&self) -> Vec<Validator> {
        self.committed.validators.clone()
    }

    fn validator_private_key(&self, index: usize) -> Option<[u8; 32]> {
        self.validator_keys.get(index).map(KeyPair::secret_bytes)
    }

    fn set_validator_signing_info(&mut self, info: ValidatorSigningInfo) -> Result<()> {
        self.write_through(|state| {
            state.signing_infos.insert(info.address, info.clone());
            Ok(())
        })
    }
}
