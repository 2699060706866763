use crate::app::core::params::{
    AuthParams, BankParams, ParamSet, SlashingParams, Subspace, AUTH_SUBSPACE, BANK_SUBSPACE,
    SLASHING_SUBSPACE,
};
use crate::app::core::types::{BaseAccount, Validator, ValidatorSigningInfo};
use crate::crypto::Address;
use crate::error::{codes, ChainError, Result, TxError};
use crate::transaction::{validate_coins, Coin, TypeUrl};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const FEE_COLLECTOR: &str = "fee_collector";
pub const BONDED_POOL: &str = "bonded_tokens_pool";

/// The whole application store. Ordered maps keep the encoding, and so the app hash, deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChainState {
    pub accounts: BTreeMap<Address, BaseAccount>,
    pub next_account_number: u64,
    pub balances: BTreeMap<Address, BTreeMap<String, u128>>,
    pub supply: BTreeMap<String, u128>,
    pub validators: Vec<Validator>,
    pub signing_infos: BTreeMap<Address, ValidatorSigningInfo>,
    pub subspaces: BTreeMap<String, Subspace>,
    pub counter: u64,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the module subspaces and stores their genesis parameters.
    pub fn init_params(&mut self) -> Result<()> {
        let genesis = [
            (AUTH_SUBSPACE, ParamSet::Auth(AuthParams::genesis())),
            (BANK_SUBSPACE, ParamSet::Bank(BankParams::genesis())),
            (SLASHING_SUBSPACE, ParamSet::Slashing(SlashingParams::genesis())),
        ];
        for (name, set) in genesis {
            let mut subspace = Subspace::new(name, set.type_url());
            subspace.set_param_set(&set)?;
            self.subspaces.insert(name.to_string(), subspace);
        }
        Ok(())
    }

    pub fn app_hash(&self) -> Result<[u8; 32]> {
        let encoded = bincode::serialize(self)?;
        Ok(Sha256::digest(encoded).into())
    }

    // -- auth ---------------------------------------------------------------

    pub fn account(&self, address: &Address) -> Option<&BaseAccount> {
        self.accounts.get(address)
    }

    pub fn account_mut(&mut self, address: &Address) -> Option<&mut BaseAccount> {
        self.accounts.get_mut(address)
    }

    /// Returns the account, creating it with the next account number when missing.
    pub fn ensure_account(&mut self, address: &Address) -> &mut BaseAccount {
        let next_number = &mut self.next_account_number;
        self.accounts.entry(*address).or_insert_with(|| {
            let account = BaseAccount {
                address: *address,
                public_key: None,
                account_number: *next_number,
                sequence: 0,
            };
            *next_number += 1;
            account
        })
    }

    // -- bank ---------------------------------------------------------------

    pub fn balance(&self, address: &Address, denom: &str) -> u128 {
        self.balances
            .get(address)
            .and_then(|b| b.get(denom))
            .copied()
            .unwrap_or(0)
    }

    pub fn all_balances(&self, address: &Address) -> Vec<Coin> {
        self.balances
            .get(address)
            .map(|b| {
                b.iter()
                    .filter(|(_, amount)| **amount > 0)
                    .map(|(denom, amount)| Coin::new(*amount, denom.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn supply_of(&self, denom: &str) -> u128 {
        self.supply.get(denom).copied().unwrap_or(0)
    }

    /// Creates `coins` out of thin air and credits them to `to`.
    pub fn mint_coins(&mut self, to: &Address, coins: &[Coin]) -> Result<()> {
        validate_coins(coins)?;
        for coin in coins {
            let supply = self.supply.entry(coin.denom.clone()).or_insert(0);
            *supply = supply.checked_add(coin.amount).ok_or_else(|| {
                ChainError::InvalidCoins(format!("supply of {} overflows", coin.denom))
            })?;
        }
        self.ensure_account(to);
        let balances = self.balances.entry(*to).or_default();
        for coin in coins {
            let balance = balances.entry(coin.denom.clone()).or_insert(0);
            *balance = balance.checked_add(coin.amount).ok_or_else(|| {
                ChainError::InvalidCoins(format!("balance of {} overflows", coin.denom))
            })?;
        }
        Ok(())
    }

    /// Moves `coins` from `from` to `to`, creating the recipient account if needed.
    ///
    /// Checks every denomination before touching any balance.
    pub fn send_coins(&mut self, from: &Address, to: &Address, coins: &[Coin]) -> std::result::Result<(), TxError> {
        for coin in coins {
            let available = self.balance(from, &coin.denom);
            if available < coin.amount {
                return Err(TxError::new(
                    codes::INSUFFICIENT_FUNDS,
                    format!(
                        "spendable balance {}{} is smaller than {}",
                        available, coin.denom, coin
                    ),
                ));
            }
        }

        self.ensure_account(to);
        for coin in coins {
            if let Some(balance) = self
                .balances
                .get_mut(from)
                .and_then(|b| b.get_mut(&coin.denom))
            {
                *balance -= coin.amount;
            }
            let credit = self
                .balances
                .entry(*to)
                .or_default()
                .entry(coin.denom.clone())
                .or_insert(0);
            *credit = credit.checked_add(coin.amount).ok_or_else(|| {
                TxError::new(codes::INVALID_COINS, format!("balance of {} overflows", coin.denom))
            })?;
        }
        Ok(())
    }

    // -- params -------------------------------------------------------------

    pub fn subspace(&self, name: &str) -> Option<&Subspace> {
        self.subspaces.get(name)
    }

    pub fn subspace_mut(&mut self, name: &str) -> Option<&mut Subspace> {
        self.subspaces.get_mut(name)
    }

    fn module_params<P>(&self, subspace: &str) -> Result<P>
    where
        P: crate::app::core::params::ParamSetPairs + TypeUrl,
    {
        self.subspace(subspace)
            .ok_or_else(|| ChainError::SubspaceNotFound(subspace.to_string()))?
            .load::<P>()
    }

    pub fn auth_params(&self) -> Result<AuthParams> {
        self.module_params(AUTH_SUBSPACE)
    }

    pub fn bank_params(&self) -> Result<BankParams> {
        self.module_params(BANK_SUBSPACE)
    }

    pub fn slashing_params(&self) -> Result<SlashingParams> {
        self.module_params(SLASHING_SUBSPACE)
    }
}
