//! Nullable stake-weight token: an in-memory ERC-20 with allowances.
//!
//! Stands in for the AMM pool token. Only balances, allowances and supply
//! are modelled; no pool math.

use prime_token::{StakeToken, SupplyReference, TokenError};
use prime_types::{AccountId, TokenAmount};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct TokenState {
    balances: HashMap<AccountId, TokenAmount>,
    allowances: HashMap<(AccountId, AccountId), TokenAmount>,
    total_supply: TokenAmount,
}

/// An in-memory token ledger for testing.
/// Thread-safe; every transfer applies fully or not at all.
pub struct NullToken {
    address: AccountId,
    state: Mutex<TokenState>,
}

impl NullToken {
    pub fn new(address: AccountId) -> Self {
        Self {
            address,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// A token whose whole initial supply is held by `holder`, as after the
    /// pool creator seeds the pool.
    pub fn with_supply(address: AccountId, holder: AccountId, supply: TokenAmount) -> Self {
        let token = Self::new(address);
        {
            let mut state = token.lock();
            state.balances.insert(holder, supply);
            state.total_supply = supply;
        }
        token
    }

    fn lock(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&self, to: &AccountId, amount: TokenAmount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let mut state = self.lock();
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = state
            .balances
            .get(to)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        state.total_supply = supply;
        state.balances.insert(*to, balance);
        Ok(())
    }

    /// Allow `spender` to pull up to `amount` from `owner`. Replaces any
    /// previous allowance.
    pub fn approve(&self, owner: &AccountId, spender: &AccountId, amount: TokenAmount) {
        self.lock().allowances.insert((*owner, *spender), amount);
    }

    /// Move tokens between two holders without touching allowances.
    fn move_balance(
        state: &mut TokenState,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let available = state.balances.get(from).copied().unwrap_or_default();
        let debited = available
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = state
            .balances
            .get(to)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        state.balances.insert(*from, debited);
        state.balances.insert(*to, credited);
        Ok(())
    }
}

impl StakeToken for NullToken {
    fn address(&self) -> AccountId {
        self.address
    }

    fn balance_of(&self, owner: &AccountId) -> TokenAmount {
        self.lock().balances.get(owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> TokenAmount {
        self.lock()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        let mut state = self.lock();
        let key = (*from, *spender);
        let approved = state.allowances.get(&key).copied().unwrap_or_default();
        let remaining = approved
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance {
                needed: amount,
                approved,
            })?;
        Self::move_balance(&mut state, from, to, amount)?;
        state.allowances.insert(key, remaining);
        Ok(())
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), TokenError> {
        Self::move_balance(&mut self.lock(), from, to, amount)
    }
}

impl SupplyReference for NullToken {
    fn total_supply(&self) -> TokenAmount {
        self.lock().total_supply
    }
}
