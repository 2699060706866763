//! Integration tests driving the bridge surface with raw base64 payloads

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chaintube::abci::{GasInfo, RequestDeliverTx, ResponseDeliverTx};
use chaintube::app::core::params::{ParamSet, SlashingParams, SLASHING_SUBSPACE};
use chaintube::app::core::types::{
    paths, MsgIncrement, MsgSend, QueryBalanceRequest, QueryBalanceResponse, QueryCountRequest,
    QueryCountResponse,
};
use chaintube::bridge::Bridge;
use chaintube::config::TubeConfig;
use chaintube::crypto::KeyPair;
use chaintube::error::codes;
use chaintube::result::{ErrorKind, RawResult};
use chaintube::transaction::{Any, AuthInfo, Coin, Fee, Tx, TxBody, TypeUrl};
use std::sync::Arc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn new_bridge() -> Arc<Bridge> {
    Arc::new(Bridge::new(TubeConfig::default()))
}

/// Funds a fresh account through the bridge and returns its key.
fn funded_key(bridge: &Bridge, id: u64, coins_json: &str) -> Result<KeyPair, Box<dyn std::error::Error>> {
    let secret = STANDARD.decode(bridge.fund_account(id, coins_json))?;
    Ok(KeyPair::from_secret_bytes(&secret)?)
}

fn signed_tx(bridge: &Bridge, id: u64, key: &KeyPair, msg: Any, gas_limit: u64) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let address = key.address().to_string();
    let body = TxBody {
        messages: vec![msg],
        memo: String::new(),
    };
    let auth_info = AuthInfo {
        public_key: key.public_key_bytes().to_vec(),
        sequence: bridge.account_sequence(id, &address),
        fee: Fee {
            amount: vec![],
            gas_limit,
        },
    };
    let sign_bytes = Tx::sign_bytes(&body, &auth_info, &bridge.config().chain_id, bridge.account_number(id, &address))?;
    let signature = key.sign(&sign_bytes)?.to_vec();
    Ok(Tx {
        body,
        auth_info,
        signature,
    }
    .encode()?)
}

fn execute(bridge: &Bridge, id: u64, tx: Vec<u8>) -> Result<ResponseDeliverTx, Box<dyn std::error::Error>> {
    let req = RequestDeliverTx { tx }.encode()?;
    match RawResult::from_base64(&bridge.execute(id, &STANDARD.encode(req)))? {
        RawResult::Ok(bytes) => Ok(ResponseDeliverTx::decode(&bytes)?),
        RawResult::Err { message, .. } => Err(message.into()),
    }
}

fn balance(bridge: &Bridge, id: u64, address: &str, denom: &str) -> Result<u128, Box<dyn std::error::Error>> {
    let req = bincode::serialize(&QueryBalanceRequest {
        address: address.to_string(),
        denom: denom.to_string(),
    })?;
    match RawResult::from_base64(&bridge.query(id, paths::BANK_BALANCE, &STANDARD.encode(req)))? {
        RawResult::Ok(bytes) => {
            let res: QueryBalanceResponse = bincode::deserialize(&bytes)?;
            Ok(res.balance.map_or(0, |c| c.amount))
        }
        RawResult::Err { message, .. } => Err(message.into()),
    }
}

fn send_msg(from: &KeyPair, to: &KeyPair, amount: u128) -> Result<Any, Box<dyn std::error::Error>> {
    Ok(Any::pack(&MsgSend {
        from_address: from.address().to_string(),
        to_address: to.address().to_string(),
        amount: vec![Coin::new(amount, "inj")],
    })?)
}

#[test]
fn test_fund_then_send_scenario() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    let alice = funded_key(&bridge, id, r#"[{"denom":"inj","amount":"1000000"}]"#)?;
    let bob = KeyPair::generate();

    assert_eq!(balance(&bridge, id, &alice.address().to_string(), "inj")?, 1_000_000);

    bridge.begin_block(id);
    let tx = signed_tx(&bridge, id, &alice, send_msg(&alice, &bob, 100)?, 200_000)?;
    let res = execute(&bridge, id, tx)?;
    assert!(res.is_ok(), "send failed: {}", res.log);
    bridge.end_block(id);

    assert_eq!(balance(&bridge, id, &bob.address().to_string(), "inj")?, 100);
    assert_eq!(balance(&bridge, id, &alice.address().to_string(), "inj")?, 999_900);
    Ok(())
}

#[test]
fn test_block_advances_height_and_time() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    assert_eq!(bridge.get_block_height(id), 1);

    let (height, time) = (bridge.get_block_height(id), bridge.get_block_time(id));
    bridge.begin_block(id);
    bridge.end_block(id);
    assert_eq!(bridge.get_block_height(id), height + 1);
    assert_eq!(bridge.get_block_time(id), time + 5_000_000_000);

    bridge.advance_time(id, 60);
    assert_eq!(bridge.get_block_height(id), height + 2);
    assert_eq!(bridge.get_block_time(id), time + 65_000_000_000);
    Ok(())
}

#[test]
fn test_advance_time_bounds() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    let (height, time) = (bridge.get_block_height(id), bridge.get_block_time(id));

    bridge.advance_time(id, 0);
    assert_eq!(bridge.get_block_height(id), height + 1);
    assert_eq!(bridge.get_block_time(id), time);

    // A time nanoseconds cannot express is refused without touching the chain.
    for secs in [u64::MAX, 10_u64.pow(16)] {
        let refused = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| bridge.advance_time(id, secs)));
        assert!(refused.is_err());
    }
    assert_eq!(bridge.get_block_height(id), height + 1);
    assert_eq!(bridge.get_block_time(id), time);

    bridge.advance_time(id, 3_600);
    assert_eq!(bridge.get_block_time(id), time + 3_600_000_000_000);
    Ok(())
}

#[test]
fn test_end_block_without_begin_keeps_height() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    let height = bridge.get_block_height(id);

    bridge.end_block(id);
    assert_eq!(bridge.get_block_height(id), height);

    bridge.begin_block(id);
    bridge.end_block(id);
    bridge.end_block(id);
    assert_eq!(bridge.get_block_height(id), height + 1);
    Ok(())
}

#[test]
fn test_failing_tx_is_successful_outcome() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    let alice = funded_key(&bridge, id, r#"[{"denom":"inj","amount":"50"}]"#)?;
    let bob = KeyPair::generate();

    bridge.begin_block(id);
    let tx = signed_tx(&bridge, id, &alice, send_msg(&alice, &bob, 500)?, 200_000)?;
    let res = execute(&bridge, id, tx)?;
    bridge.end_block(id);

    assert_eq!(res.code, codes::INSUFFICIENT_FUNDS);
    assert_eq!(res.codespace, "sdk");
    assert_eq!(balance(&bridge, id, &alice.address().to_string(), "inj")?, 50);
    // The ante handler still bumped the sequence.
    assert_eq!(bridge.account_sequence(id, &alice.address().to_string()), 1);
    Ok(())
}

#[test]
fn test_simulate_failure_is_execute_error() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    let alice = funded_key(&bridge, id, r#"[{"denom":"inj","amount":"50"}]"#)?;
    let bob = KeyPair::generate();

    let ok_tx = signed_tx(&bridge, id, &alice, send_msg(&alice, &bob, 10)?, 0)?;
    match RawResult::from_base64(&bridge.simulate(id, &STANDARD.encode(ok_tx)))? {
        RawResult::Ok(bytes) => assert!(GasInfo::decode(&bytes)?.gas_used > 0),
        other => panic!("unexpected {:?}", other),
    }

    let bad_tx = signed_tx(&bridge, id, &alice, send_msg(&alice, &bob, 500)?, 0)?;
    match RawResult::from_base64(&bridge.simulate(id, &STANDARD.encode(bad_tx)))? {
        RawResult::Err { kind, message } => {
            assert_eq!(kind, ErrorKind::Execute);
            assert!(message.contains("smaller than 500inj"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(bridge.account_sequence(id, &alice.address().to_string()), 0);
    Ok(())
}

#[test]
fn test_unknown_query_path() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    match RawResult::from_base64(&bridge.query(id, "/injective.exchange.v1beta1.Query/Nope", ""))? {
        RawResult::Err { kind, message } => {
            assert_eq!(kind, ErrorKind::Query);
            assert!(message.contains("/injective.exchange.v1beta1.Query/Nope"));
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn test_param_set_round_trip_and_idempotence() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    let mut params = SlashingParams::genesis();
    params.signed_blocks_window = 42;
    let any = STANDARD.encode(ParamSet::Slashing(params.clone()).to_any()?.encode()?);

    assert_eq!(RawResult::from_base64(&bridge.set_param_set(id, SLASHING_SUBSPACE, &any))?, RawResult::Ok(vec![]));
    let first = bridge.get_param_set(id, SLASHING_SUBSPACE, SlashingParams::TYPE_URL);
    assert_eq!(RawResult::from_base64(&bridge.set_param_set(id, SLASHING_SUBSPACE, &any))?, RawResult::Ok(vec![]));
    let second = bridge.get_param_set(id, SLASHING_SUBSPACE, SlashingParams::TYPE_URL);
    assert_eq!(first, second);

    match RawResult::from_base64(&first)? {
        RawResult::Ok(bytes) => assert_eq!(bincode::deserialize::<SlashingParams>(&bytes)?, params),
        other => panic!("unexpected {:?}", other),
    }

    let unknown = bridge.get_param_set(id, SLASHING_SUBSPACE, "/cosmos.gov.v1.Params");
    assert_eq!(
        RawResult::from_base64(&unknown)?,
        RawResult::Err {
            kind: ErrorKind::Execute,
            message: "No param set found for `/cosmos.gov.v1.Params`".to_string()
        }
    );
    Ok(())
}

#[test]
fn test_concurrent_executes_keep_every_increment() -> TestResult {
    const SIGNERS: usize = 8;
    let bridge = new_bridge();
    let id = bridge.create_environment();

    let keys = (0..SIGNERS)
        .map(|_| funded_key(&bridge, id, r#"[{"denom":"inj","amount":"1000"}]"#))
        .collect::<Result<Vec<_>, _>>()?;

    bridge.begin_block(id);
    let txs = keys
        .iter()
        .map(|key| {
            let msg = Any::pack(&MsgIncrement {
                sender: key.address().to_string(),
                amount: 1,
            })?;
            signed_tx(&bridge, id, key, msg, 200_000)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let results: Vec<u32> = std::thread::scope(|s| {
        let handles: Vec<_> = txs
            .into_iter()
            .map(|tx| {
                let bridge = Arc::clone(&bridge);
                s.spawn(move || {
                    let req = RequestDeliverTx { tx }.encode().unwrap();
                    let out = bridge.execute(id, &STANDARD.encode(req));
                    match RawResult::from_base64(&out).unwrap() {
                        RawResult::Ok(bytes) => ResponseDeliverTx::decode(&bytes).unwrap().code,
                        other => panic!("unexpected {:?}", other),
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    bridge.end_block(id);
    assert!(results.iter().all(|c| *c == codes::OK));

    let req = STANDARD.encode(bincode::serialize(&QueryCountRequest {})?);
    match RawResult::from_base64(&bridge.query(id, paths::COUNTER_COUNT, &req))? {
        RawResult::Ok(bytes) => {
            let res: QueryCountResponse = bincode::deserialize(&bytes)?;
            assert_eq!(res.count, SIGNERS as u64);
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn test_validator_address_and_key() -> TestResult {
    let bridge = new_bridge();
    let id = bridge.create_environment();
    let address = bridge.get_validator_address(id, 0);
    assert!(address.starts_with("injvaloper1"));
    bridge.advance_time(id, 5);
    assert_eq!(bridge.get_validator_address(id, 0), address);

    let secret = STANDARD.decode(bridge.get_validator_private_key(id))?;
    let key = KeyPair::from_secret_bytes(&secret)?;
    assert!(bridge.account_number(id, &key.address().to_string()) < 2);
    Ok(())
}

#[test]
fn test_environments_are_isolated() -> TestResult {
    let bridge = new_bridge();
    let a = bridge.create_environment();
    let b = bridge.create_environment();
    assert!(b > a);

    bridge.advance_time(a, 5);
    bridge.advance_time(a, 5);
    assert_eq!(bridge.get_block_height(a), 3);
    assert_eq!(bridge.get_block_height(b), 1);
    assert_ne!(bridge.get_validator_address(a, 0), bridge.get_validator_address(b, 0));
    Ok(())
}
