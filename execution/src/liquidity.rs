//! Liquidity pool ledger.
//!
//! Providers back every payout. Each bet's signed pool delta is split across
//! providers in proportion to their balances, and every state change ends with
//! [`LiquidityPool::recompute_shares`], which snaps the bank's recorded
//! liquidity to the true sum of provider balances.
//!
//! When tokenization is enabled, deposits mint pool tokens at the current
//! price (`liquidity / supply`) and withdrawals burn them. Token amounts are
//! computed from the pre-operation state so the price a provider sees is the
//! price they get.

use fairstake_types::money::{mul_div_round, signed_mul_div_round};
use fairstake_types::{
    Amount, Bank, Delta, LiquidityDrift, LiquidityProvider, LpId, Player, Rejection,
};
use fairstake_types::constants::SHARE_SCALE;
use tracing::{debug, warn};

/// Provider positions plus the aggregate bank.
#[derive(Clone, Debug)]
pub struct LiquidityPool {
    providers: Vec<LiquidityProvider>,
    bank: Bank,
    tokenize: bool,
    min_lock_ms: u64,
}

impl LiquidityPool {
    pub fn new(tokenize: bool, min_lock_ms: u64) -> Self {
        Self {
            providers: Vec::new(),
            bank: Bank::default(),
            tokenize,
            min_lock_ms,
        }
    }

    /// Rebuild a pool from persisted state. Shares and liquidity are re-derived.
    pub fn restore(
        providers: Vec<LiquidityProvider>,
        bank: Bank,
        tokenize: bool,
        min_lock_ms: u64,
    ) -> (Self, Option<LiquidityDrift>) {
        let mut pool = Self {
            providers,
            bank,
            tokenize,
            min_lock_ms,
        };
        let drift = pool.recompute_shares();
        (pool, drift)
    }

    pub fn providers(&self) -> &[LiquidityProvider] {
        &self.providers
    }

    pub fn provider(&self, id: LpId) -> Option<&LiquidityProvider> {
        self.providers.iter().find(|lp| lp.id == id)
    }

    fn provider_mut(&mut self, id: LpId) -> Result<&mut LiquidityProvider, Rejection> {
        self.providers
            .iter_mut()
            .find(|lp| lp.id == id)
            .ok_or(Rejection::ProviderNotFound(id))
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    /// Recorded liquidity available to cover payouts.
    pub fn liquidity(&self) -> Amount {
        self.bank.liquidity
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Sum of provider balances.
    pub fn total_balance(&self) -> Amount {
        self.providers.iter().map(|lp| lp.balance).sum()
    }

    /// Sum of withdrawn-but-unclaimed cash.
    pub fn total_available_cash(&self) -> Amount {
        self.providers.iter().map(|lp| lp.available_cash).sum()
    }

    pub fn next_id(&self) -> LpId {
        LpId(
            self.providers
                .iter()
                .map(|lp| lp.id.0 + 1)
                .max()
                .unwrap_or(0),
        )
    }

    /// Admit a provider with its opening balance.
    pub fn add_provider(&mut self, mut lp: LiquidityProvider) -> LpId {
        let id = lp.id;
        lp.tokens = self.mint(lp.balance);
        self.bank.total_token_supply = self.bank.total_token_supply.saturating_add(lp.tokens);
        self.bank.liquidity = self.bank.liquidity.saturating_add(lp.balance);
        self.providers.push(lp);
        self.recompute_shares();
        id
    }

    /// Tokens minted for `amount` at the current price.
    fn mint(&self, amount: Amount) -> u64 {
        if !self.tokenize {
            return 0;
        }
        let supply = self.bank.total_token_supply;
        if supply == 0 || self.bank.liquidity == 0 {
            return amount;
        }
        (amount as u128 * supply as u128 / self.bank.liquidity as u128) as u64
    }

    /// Tokens burned for `amount`, rounded up so withdrawals never dilute others.
    fn burn(&self, amount: Amount, held: u64) -> u64 {
        if !self.tokenize {
            return 0;
        }
        let supply = self.bank.total_token_supply;
        if supply == 0 || self.bank.liquidity == 0 {
            return amount.min(held);
        }
        let numerator = amount as u128 * supply as u128;
        let liquidity = self.bank.liquidity as u128;
        let burned = numerator.div_ceil(liquidity);
        u64::try_from(burned).unwrap_or(u64::MAX).min(held)
    }

    /// Apply a settled bet's pool delta: record it, split it across providers
    /// and re-derive shares.
    pub fn settle(&mut self, delta: Delta) -> Option<LiquidityDrift> {
        self.bank.push_delta(delta);
        let liquidity = self.bank.liquidity as i128 + delta as i128;
        self.bank.liquidity = liquidity.clamp(0, Amount::MAX as i128) as Amount;
        self.distribute(delta);
        self.recompute_shares()
    }

    /// Split `delta` across providers in proportion to their balances.
    ///
    /// Each share is rounded independently, so the applied total can differ
    /// from `delta` by up to half a minor unit per provider. With an empty pool
    /// a gain is split evenly (truncated) and a loss is dropped.
    pub fn distribute(&mut self, delta: Delta) {
        if delta == 0 || self.providers.is_empty() {
            return;
        }
        let total = self.total_balance();
        if total == 0 {
            if delta > 0 {
                let each = delta as u64 / self.providers.len() as u64;
                for lp in &mut self.providers {
                    lp.balance = lp.balance.saturating_add(each);
                }
            }
            return;
        }
        for lp in &mut self.providers {
            let portion = signed_mul_div_round(delta, lp.balance, total);
            let next = lp.balance as i128 + portion as i128;
            lp.balance = next.clamp(0, Amount::MAX as i128) as Amount;
        }
    }

    /// Move an LP's available cash back into the pool.
    pub fn deposit(&mut self, id: LpId, amount: Amount, now_ms: u64) -> Result<Amount, Rejection> {
        if amount == 0 {
            return Err(Rejection::InvalidAmount);
        }
        let minted = self.mint(amount);
        let lp = self.provider_mut(id)?;
        if lp.available_cash < amount {
            return Err(Rejection::InsufficientCash {
                available: lp.available_cash,
                requested: amount,
            });
        }
        lp.available_cash -= amount;
        lp.balance = lp.balance.saturating_add(amount);
        lp.total_contributed = lp.total_contributed.saturating_add(amount);
        lp.tokens = lp.tokens.saturating_add(minted);
        if !lp.is_locked(now_ms) {
            lp.lock_until_ms = None;
        }
        self.bank.liquidity = self.bank.liquidity.saturating_add(amount);
        self.bank.total_token_supply = self.bank.total_token_supply.saturating_add(minted);
        debug!(lp = %id, amount, minted, "lp deposit");
        self.recompute_shares();
        Ok(amount)
    }

    /// Pull funds from the pool into the LP's available cash. Caps at the balance.
    pub fn withdraw(&mut self, id: LpId, amount: Amount, now_ms: u64) -> Result<Amount, Rejection> {
        if amount == 0 {
            return Err(Rejection::InvalidAmount);
        }
        let amount = self.take_from_position(id, amount, now_ms)?;
        let lp = self.provider_mut(id)?;
        lp.available_cash = lp.available_cash.saturating_add(amount);
        debug!(lp = %id, amount, "lp withdraw");
        self.recompute_shares();
        Ok(amount)
    }

    /// Move an owned LP's available cash into the owner's wallet.
    pub fn claim(&mut self, id: LpId, player: &mut Player) -> Result<Amount, Rejection> {
        let lp = self.provider_mut(id)?;
        if lp.owner != Some(player.id) {
            return Err(Rejection::NotOwner {
                player: player.id,
                lp: id,
            });
        }
        if lp.available_cash == 0 {
            return Err(Rejection::NothingToClaim);
        }
        let amount = std::mem::take(&mut lp.available_cash);
        player.balance = player.balance.saturating_add(amount);
        debug!(lp = %id, player = %player.id, amount, "lp cash claimed");
        self.recompute_shares();
        Ok(amount)
    }

    /// Move funds from the owner's wallet into their LP position and extend the lock.
    pub fn stake(
        &mut self,
        player: &mut Player,
        id: LpId,
        amount: Amount,
        now_ms: u64,
    ) -> Result<Amount, Rejection> {
        let minted = self.mint(amount);
        let min_lock_ms = self.min_lock_ms;
        let lp = self.provider_mut(id)?;
        if lp.owner != Some(player.id) {
            return Err(Rejection::NotOwner {
                player: player.id,
                lp: id,
            });
        }
        if amount == 0 {
            return Err(Rejection::InvalidAmount);
        }
        if player.balance < amount {
            return Err(Rejection::InsufficientBalance {
                balance: player.balance,
                stake: amount,
            });
        }
        player.balance -= amount;
        lp.balance = lp.balance.saturating_add(amount);
        lp.total_contributed = lp.total_contributed.saturating_add(amount);
        lp.tokens = lp.tokens.saturating_add(minted);
        if min_lock_ms > 0 {
            let target = now_ms.saturating_add(min_lock_ms);
            lp.lock_until_ms = Some(lp.lock_until_ms.map_or(target, |until| until.max(target)));
        }
        self.bank.liquidity = self.bank.liquidity.saturating_add(amount);
        self.bank.total_token_supply = self.bank.total_token_supply.saturating_add(minted);
        debug!(lp = %id, player = %player.id, amount, minted, "stake into pool");
        self.recompute_shares();
        Ok(amount)
    }

    /// Return funds from an owned LP position to the owner's wallet.
    pub fn unstake(
        &mut self,
        player: &mut Player,
        id: LpId,
        amount: Amount,
        now_ms: u64,
    ) -> Result<Amount, Rejection> {
        let lp = self.provider(id).ok_or(Rejection::ProviderNotFound(id))?;
        if lp.owner != Some(player.id) {
            return Err(Rejection::NotOwner {
                player: player.id,
                lp: id,
            });
        }
        if amount == 0 {
            return Err(Rejection::InvalidAmount);
        }
        let amount = self.take_from_position(id, amount, now_ms)?;
        player.balance = player.balance.saturating_add(amount);
        debug!(lp = %id, player = %player.id, amount, "unstake from pool");
        self.recompute_shares();
        Ok(amount)
    }

    /// Debit up to `amount` from a position, burning tokens. Shared by withdraw and unstake.
    fn take_from_position(
        &mut self,
        id: LpId,
        amount: Amount,
        now_ms: u64,
    ) -> Result<Amount, Rejection> {
        let lp = self.provider(id).ok_or(Rejection::ProviderNotFound(id))?;
        if let Some(until_ms) = lp.lock_until_ms.filter(|_| lp.is_locked(now_ms)) {
            return Err(Rejection::FundsLocked { until_ms });
        }
        let amount = amount.min(lp.balance);
        if amount == 0 {
            return Err(Rejection::InvalidAmount);
        }
        let burned = self.burn(amount, lp.tokens);
        let lp = self.provider_mut(id)?;
        lp.balance -= amount;
        lp.tokens -= burned;
        lp.total_withdrawn = lp.total_withdrawn.saturating_add(amount);
        self.bank.liquidity = self.bank.liquidity.saturating_sub(amount);
        self.bank.total_token_supply = self.bank.total_token_supply.saturating_sub(burned);
        Ok(amount)
    }

    /// Re-derive cached shares and snap recorded liquidity to the provider sum.
    ///
    /// Returns the drift when the bank had to be corrected. Drift within one
    /// minor unit per provider is expected rounding from [`Self::distribute`].
    pub fn recompute_shares(&mut self) -> Option<LiquidityDrift> {
        let total = self.total_balance();
        let supply = self.bank.total_token_supply;
        let by_tokens = self.tokenize && supply > 0;
        for lp in &mut self.providers {
            lp.share_ppm = if by_tokens {
                mul_div_round(lp.tokens, SHARE_SCALE, supply).unwrap_or(0)
            } else if total > 0 {
                mul_div_round(lp.balance, SHARE_SCALE, total).unwrap_or(0)
            } else {
                0
            };
        }

        if self.bank.liquidity == total {
            return None;
        }
        let drift = LiquidityDrift {
            recorded: self.bank.liquidity,
            actual: total,
        };
        self.bank.liquidity = total;
        if drift.magnitude() <= self.providers.len() as u64 {
            debug!(recorded = drift.recorded, actual = drift.actual, "liquidity rounding snapped");
        } else {
            warn!(recorded = drift.recorded, actual = drift.actual, "liquidity drift snapped");
        }
        Some(drift)
    }
}
