// crates/ballast-vault/src/vault.rs
//
// The Vault aggregate: all mutable state of the staking vault in one owned
// value, mutated only through `&mut self` entry points.
//
// Every public mutation runs under the vault's reentrancy guard and obeys
// one ordering rule: pending reward accrual is flushed before any
// rate-sensitive read or write, so no operation ever observes a stale
// exchange rate. Operations validate fully before mutating, so an error
// abort leaves every pool untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ballast_core::{
    decay, mul_div_floor, AccountId, BallastError, Fix, Grain, ProtocolEnv, Result, Shares,
};

use crate::config::{self, VaultConfig};
use crate::drafts::{DraftEraState, DraftQueue};
use crate::events::{Event, PoolKind};
use crate::ledger::{ReceiptLedger, ALLOWANCE_MAX};
use crate::pool::{DraftPool, Era, StakePool};
use crate::seizure::plan_seizure;

/// The staking vault.
///
/// Stake pools, the share ledger, and draft queues are keyed by era; live
/// operations touch only the current era of each side, while closed eras
/// stay frozen in storage to settle claims created before they closed.
#[derive(Debug, Serialize, Deserialize)]
pub struct Vault {
    config: VaultConfig,
    /// Grain actually held by the vault on behalf of all claimants.
    custody: Grain,
    /// Host timestamp up to which rewards have been paid, in whole periods.
    payout_last_paid: u64,
    stake_era: Era,
    stake_pools: BTreeMap<Era, StakePool>,
    ledger: ReceiptLedger,
    draft_era: Era,
    draft_eras: BTreeMap<Era, DraftEraState>,
    /// Cumulative withdrawal fraction since the last forced basket refresh.
    leaked: Fix,
    events: Vec<Event>,
    guard: bool,
}

impl Vault {
    /// Create a vault at `genesis` with empty pools and the identity rate.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the configuration violates a bound.
    pub fn new(config: VaultConfig, genesis: u64) -> Result<Vault> {
        config.validate()?;
        let mut stake_pools = BTreeMap::new();
        stake_pools.insert(1, StakePool::default());
        let mut draft_eras = BTreeMap::new();
        draft_eras.insert(1, DraftEraState::default());
        Ok(Vault {
            config,
            custody: 0,
            payout_last_paid: genesis,
            stake_era: 1,
            stake_pools,
            ledger: ReceiptLedger::new(),
            draft_era: 1,
            draft_eras,
            leaked: Fix::ZERO,
            events: Vec::new(),
            guard: false,
        })
    }

    // ---- reentrancy guard -------------------------------------------------

    /// Enter the protocol-wide non-reentrant section. Public so sibling
    /// components that touch the same pools share the guard.
    ///
    /// # Errors
    /// Returns `ReentrancyBlocked` if the section is already active.
    pub fn acquire_guard(&mut self) -> Result<()> {
        if self.guard {
            return Err(BallastError::ReentrancyBlocked);
        }
        self.guard = true;
        Ok(())
    }

    /// Leave the non-reentrant section.
    pub fn release_guard(&mut self) {
        self.guard = false;
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.acquire_guard()?;
        let out = f(self);
        self.release_guard();
        out
    }

    // ---- views ------------------------------------------------------------

    /// The vault's configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Grain held on behalf of all claimants.
    pub fn custody(&self) -> Grain {
        self.custody
    }

    /// Grain in custody that belongs to neither pool: undistributed revenue.
    pub fn unallocated(&self) -> Grain {
        self.custody
            .saturating_sub(self.stake_pool().backing)
            .saturating_sub(self.draft_pool().backing)
    }

    /// The current stake era.
    pub fn stake_era(&self) -> Era {
        self.stake_era
    }

    /// The current draft era.
    pub fn draft_era(&self) -> Era {
        self.draft_era
    }

    fn stake_pool(&self) -> StakePool {
        self.stake_pools
            .get(&self.stake_era)
            .copied()
            .unwrap_or_default()
    }

    fn stake_pool_mut(&mut self) -> &mut StakePool {
        self.stake_pools.entry(self.stake_era).or_default()
    }

    fn draft_pool(&self) -> DraftPool {
        self.draft_eras
            .get(&self.draft_era)
            .map(|s| s.pool)
            .unwrap_or_default()
    }

    fn draft_state_mut(&mut self) -> &mut DraftEraState {
        self.draft_eras.entry(self.draft_era).or_default()
    }

    /// The stake pool of any era, if it ever existed.
    pub fn era_stake_pool(&self, era: Era) -> Option<StakePool> {
        self.stake_pools.get(&era).copied()
    }

    /// The draft pool of any era, if it ever existed.
    pub fn era_draft_pool(&self, era: Era) -> Option<DraftPool> {
        self.draft_eras.get(&era).map(|s| s.pool)
    }

    /// Grain per share in the current stake era.
    pub fn exchange_rate(&self) -> Fix {
        self.stake_pool().rate()
    }

    /// Grain per draft unit in `era` (identity for an unknown era).
    pub fn draft_rate(&self, era: Era) -> Fix {
        self.era_draft_pool(era).unwrap_or_default().rate()
    }

    /// Receipt shares outstanding in the current era.
    pub fn total_staked(&self) -> Shares {
        self.stake_pool().total_staked
    }

    /// Grain backing the current era's shares.
    pub fn stake_backing(&self) -> Grain {
        self.stake_pool().backing
    }

    /// `account`'s share balance in the current era.
    pub fn balance_of(&self, account: &AccountId) -> Shares {
        self.ledger.balance_of(self.stake_era, account)
    }

    /// `account`'s share balance in `era` (frozen for closed eras).
    pub fn balance_of_era(&self, era: Era, account: &AccountId) -> Shares {
        self.ledger.balance_of(era, account)
    }

    /// Current-era allowance from `owner` to `spender`.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Shares {
        self.ledger.allowance(self.stake_era, owner, spender)
    }

    /// `account`'s draft queue in `era`, if any.
    pub fn draft_queue(&self, era: Era, account: &AccountId) -> Option<&DraftQueue> {
        self.draft_eras.get(&era)?.queue(account)
    }

    /// Length of `account`'s current-era draft queue.
    pub fn draft_queue_len(&self, account: &AccountId) -> u64 {
        self.draft_queue(self.draft_era, account)
            .map(|q| q.len() as u64)
            .unwrap_or(0)
    }

    /// Index of `account`'s oldest live draft in the current era.
    pub fn first_remaining_draft(&self, account: &AccountId) -> u64 {
        self.draft_queue(self.draft_era, account)
            .map(|q| q.cursor() as u64)
            .unwrap_or(0)
    }

    /// The largest `end_id` for which `withdraw(account, end_id, now, ..)`
    /// would find every covered draft available. O(log n) in queue length.
    pub fn end_id_for_withdraw(&self, account: &AccountId, now: u64) -> u64 {
        self.draft_queue(self.draft_era, account)
            .map(|q| q.end_id_available(now) as u64)
            .unwrap_or(0)
    }

    /// Drain the buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ---- persistence ------------------------------------------------------

    /// Serialize the whole aggregate to JSON for host persistence.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore an aggregate from `to_json` output.
    pub fn from_json(json: &str) -> Result<Vault> {
        Ok(serde_json::from_str(json)?)
    }

    // ---- reward payout ----------------------------------------------------

    /// Pay out pending rewards to the stake pool.
    ///
    /// Silent no-op when zero whole periods have elapsed, when nobody is
    /// staked (rewards wait, undistributed, until someone is present to
    /// receive them), or while trading is paused. Runs even while frozen.
    pub fn payout_rewards<E: ProtocolEnv>(&mut self, now: u64, env: &E) -> Result<()> {
        self.guarded(|v| v.flush_rewards(now, env))
    }

    /// The flush underlying `payout_rewards`, run as a precondition of every
    /// rate-sensitive operation so the observed rate is never stale.
    fn flush_rewards<E: ProtocolEnv>(&mut self, now: u64, env: &E) -> Result<()> {
        if env.trading_paused() {
            return Ok(());
        }
        if now <= self.payout_last_paid {
            return Ok(());
        }
        let periods = (now - self.payout_last_paid) / self.config.reward_period;
        if periods == 0 {
            return Ok(());
        }
        let pool = self.stake_pool();
        if pool.total_staked == 0 {
            return Ok(());
        }

        let unallocated = self.unallocated();
        let retained = decay(unallocated, self.config.reward_ratio, periods)?;
        let paid = unallocated - retained;
        let new_backing = pool.backing.checked_add(paid).ok_or_else(|| {
            BallastError::Arithmetic("stake backing overflow in payout".to_string())
        })?;
        let old_rate = pool.rate();

        self.payout_last_paid += periods * self.config.reward_period;
        self.stake_pool_mut().backing = new_backing;

        let new_rate = self.stake_pool().rate();
        self.events.push(Event::ExchangeRateSet {
            pool: PoolKind::Stake,
            old: old_rate,
            new: new_rate,
        });
        self.events.push(Event::RewardsPaid { grain: paid });
        debug!(periods, paid = %paid, "rewards paid into the stake pool");
        Ok(())
    }

    // ---- staking ----------------------------------------------------------

    /// Stake `amount` grain for `caller`, minting shares at the current
    /// exchange rate (rounded down). Available while frozen; rejected while
    /// trading is paused. Returns the shares minted.
    pub fn stake<E: ProtocolEnv>(
        &mut self,
        caller: AccountId,
        amount: Grain,
        now: u64,
        env: &E,
    ) -> Result<Shares> {
        self.guarded(|v| v.stake_inner(caller, amount, now, env))
    }

    fn stake_inner<E: ProtocolEnv>(
        &mut self,
        caller: AccountId,
        amount: Grain,
        now: u64,
        env: &E,
    ) -> Result<Shares> {
        if caller.is_zero() {
            return Err(BallastError::InvalidArgument(
                "stake from the zero address".to_string(),
            ));
        }
        if amount == 0 {
            return Err(BallastError::InvalidArgument(
                "cannot stake zero".to_string(),
            ));
        }
        if env.trading_paused() {
            return Err(BallastError::StateGate("trading paused".to_string()));
        }
        self.flush_rewards(now, env)?;

        let pool = self.stake_pool();
        let minted = if pool.total_staked == 0 || pool.backing == 0 {
            amount
        } else {
            mul_div_floor(amount, pool.total_staked, pool.backing)?
        };
        if minted == 0 {
            return Err(BallastError::InvalidArgument(
                "stake amount rounds to zero shares".to_string(),
            ));
        }
        let new_custody = self
            .custody
            .checked_add(amount)
            .ok_or_else(|| BallastError::Arithmetic("custody overflow".to_string()))?;
        let new_backing = pool
            .backing
            .checked_add(amount)
            .ok_or_else(|| BallastError::Arithmetic("stake backing overflow".to_string()))?;
        let new_total = pool
            .total_staked
            .checked_add(minted)
            .ok_or_else(|| BallastError::Arithmetic("share supply overflow".to_string()))?;

        self.ledger.mint(self.stake_era, &caller, minted)?;
        self.custody = new_custody;
        let p = self.stake_pool_mut();
        p.backing = new_backing;
        p.total_staked = new_total;

        self.events.push(Event::Transfer {
            from: AccountId::ZERO,
            to: caller,
            shares: minted,
        });
        self.events.push(Event::Staked {
            account: caller,
            grain: amount,
            shares: minted,
        });
        info!(account = %caller, grain = %amount, shares = %minted, "staked");
        Ok(minted)
    }

    // ---- unstaking --------------------------------------------------------

    /// Burn `shares` and queue the matching grain as a draft, withdrawable
    /// after the unstaking delay. Returns the new draft's index.
    pub fn unstake<E: ProtocolEnv>(
        &mut self,
        caller: AccountId,
        shares: Shares,
        now: u64,
        env: &E,
    ) -> Result<u64> {
        self.guarded(|v| v.unstake_inner(caller, shares, now, env))
    }

    fn unstake_inner<E: ProtocolEnv>(
        &mut self,
        caller: AccountId,
        shares: Shares,
        now: u64,
        env: &E,
    ) -> Result<u64> {
        if shares == 0 {
            return Err(BallastError::InvalidArgument(
                "cannot unstake zero".to_string(),
            ));
        }
        if env.frozen() || env.trading_paused() {
            return Err(BallastError::StateGate(
                "frozen or trading paused".to_string(),
            ));
        }
        self.flush_rewards(now, env)?;

        let balance = self.ledger.balance_of(self.stake_era, &caller);
        if balance < shares {
            return Err(BallastError::InsufficientBalance(format!(
                "unstake of {} shares exceeds balance {}",
                shares, balance
            )));
        }

        // balance > 0 implies a nonzero share supply
        let pool = self.stake_pool();
        let grain = mul_div_floor(shares, pool.backing, pool.total_staked)?;
        let new_total = pool.total_staked - shares;
        let new_backing = pool.backing - grain;

        let dp = self.draft_pool();
        let units = if dp.total_drafts == 0 || dp.backing == 0 {
            grain
        } else {
            mul_div_floor(grain, dp.total_drafts, dp.backing)?
        };
        let new_dp_total = dp
            .total_drafts
            .checked_add(units)
            .ok_or_else(|| BallastError::Arithmetic("draft supply overflow".to_string()))?;
        let new_dp_backing = dp
            .backing
            .checked_add(grain)
            .ok_or_else(|| BallastError::Arithmetic("draft backing overflow".to_string()))?;

        let era = self.draft_era;
        let queue_tail = self
            .draft_queue(era, &caller)
            .map(|q| (q.last_cumulative(), q.last_available_at().unwrap_or(0)))
            .unwrap_or((0, 0));
        let new_cumulative = queue_tail
            .0
            .checked_add(units)
            .ok_or_else(|| BallastError::Arithmetic("draft cumulative overflow".to_string()))?;
        let available_at = now
            .checked_add(self.config.unstaking_delay)
            .ok_or_else(|| BallastError::Arithmetic("timestamp overflow".to_string()))?
            // keep the queue FIFO if governance shortened the delay
            .max(queue_tail.1);

        self.ledger.burn(self.stake_era, &caller, shares)?;
        let p = self.stake_pool_mut();
        p.total_staked = new_total;
        p.backing = new_backing;
        let state = self.draft_state_mut();
        state.pool.total_drafts = new_dp_total;
        state.pool.backing = new_dp_backing;
        let index = state.queue_mut(&caller).append(new_cumulative, available_at) as u64;

        self.events.push(Event::Transfer {
            from: caller,
            to: AccountId::ZERO,
            shares,
        });
        self.events.push(Event::UnstakingStarted {
            index,
            era,
            account: caller,
            grain,
            shares,
            available_at,
        });
        info!(account = %caller, grain = %grain, shares = %shares, available_at, "unstaking started");
        Ok(index)
    }

    // ---- withdrawal -------------------------------------------------------

    /// Pay out every available draft of `account`'s current era up to
    /// `end_id`. `withdraw(_, 0, ..)` and already-satisfied ids are safe
    /// no-ops. Returns the grain paid.
    pub fn withdraw<E: ProtocolEnv>(
        &mut self,
        account: AccountId,
        end_id: u64,
        now: u64,
        env: &mut E,
    ) -> Result<Grain> {
        let era = self.draft_era;
        self.withdraw_from_era(account, era, end_id, now, env)
    }

    /// Like `withdraw`, against any era. Claims created before a rollover
    /// settle at the closed era's frozen rate.
    pub fn withdraw_from_era<E: ProtocolEnv>(
        &mut self,
        account: AccountId,
        era: Era,
        end_id: u64,
        now: u64,
        env: &mut E,
    ) -> Result<Grain> {
        self.guarded(|v| v.withdraw_inner(account, era, end_id, now, env))
    }

    fn withdraw_inner<E: ProtocolEnv>(
        &mut self,
        account: AccountId,
        era: Era,
        end_id: u64,
        now: u64,
        env: &mut E,
    ) -> Result<Grain> {
        if env.frozen() || env.trading_paused() {
            return Err(BallastError::StateGate(
                "frozen or trading paused".to_string(),
            ));
        }
        if era > self.draft_era {
            return Err(BallastError::InvalidArgument(format!(
                "unknown draft era {}",
                era
            )));
        }

        let (start, units, pool) = {
            let queue = self.draft_queue(era, &account);
            let len = queue.map(|q| q.len() as u64).unwrap_or(0);
            if end_id > len {
                return Err(BallastError::InvalidArgument(format!(
                    "index out-of-bounds: end id {} exceeds queue length {}",
                    end_id, len
                )));
            }
            let queue = match queue {
                Some(q) => q,
                None => return Ok(0), // end_id == 0 against an absent queue
            };
            let start = queue.cursor();
            let end = end_id as usize;
            if end <= start {
                return Ok(0); // zero or already-satisfied end id
            }
            if end > queue.end_id_available(now) {
                return Err(BallastError::StateGate(
                    "withdrawal unavailable".to_string(),
                ));
            }
            let units = queue.units_between(start, end);
            let pool = self
                .era_draft_pool(era)
                .unwrap_or_default();
            (start, units, pool)
        };

        let grain = if units == 0 || pool.total_drafts == 0 {
            0
        } else {
            mul_div_floor(units, pool.backing, pool.total_drafts)?
        };

        // Leak accounting runs before the readiness gate: the forced
        // refresh may be exactly what lets the basket report ready.
        let mut new_leaked = self.leaked;
        if grain > 0 {
            let live = self
                .stake_pool()
                .backing
                .saturating_add(self.draft_pool().backing);
            let fraction = Fix::from_ratio_saturating(grain, live);
            new_leaked = Fix::from_raw(new_leaked.raw().saturating_add(fraction.raw()));
            if new_leaked > self.config.withdrawal_leak {
                env.refresh_basket();
                new_leaked = Fix::ZERO;
            }
        }
        if !(env.fully_collateralized() && env.basket_ready()) {
            return Err(BallastError::StateGate(
                "vault token readying".to_string(),
            ));
        }
        let new_custody = self
            .custody
            .checked_sub(grain)
            .ok_or_else(|| BallastError::Arithmetic("custody underflow".to_string()))?;

        self.leaked = new_leaked;
        self.custody = new_custody;
        let state = self.draft_eras.entry(era).or_default();
        state.pool.total_drafts -= units;
        state.pool.backing -= grain;
        state.queue_mut(&account).advance(end_id as usize);

        self.events.push(Event::UnstakingCompleted {
            start_id: start as u64,
            end_id,
            era,
            account,
            grain,
        });
        info!(account = %account, era, grain = %grain, "unstaking completed");
        Ok(grain)
    }

    // ---- cancellation -----------------------------------------------------

    /// Reverse the single draft at `index` in `account`'s current-era
    /// queue, re-minting shares at the current exchange rate. An
    /// already-consumed or already-cancelled index is a silent no-op.
    pub fn cancel_unstake<E: ProtocolEnv>(
        &mut self,
        account: AccountId,
        index: u64,
        now: u64,
        env: &E,
    ) -> Result<()> {
        self.guarded(|v| v.cancel_unstake_inner(account, index, now, env))
    }

    fn cancel_unstake_inner<E: ProtocolEnv>(
        &mut self,
        account: AccountId,
        index: u64,
        now: u64,
        env: &E,
    ) -> Result<()> {
        if env.frozen() {
            return Err(BallastError::StateGate("frozen".to_string()));
        }
        // the re-mint must see a fresh rate
        self.flush_rewards(now, env)?;

        let era = self.draft_era;
        let (cursor, delta) = {
            let queue = self.draft_queue(era, &account);
            let len = queue.map(|q| q.len() as u64).unwrap_or(0);
            if index >= len {
                return Err(BallastError::InvalidArgument(format!(
                    "index out-of-bounds: draft {} of {}",
                    index, len
                )));
            }
            let queue = match queue {
                Some(q) => q,
                None => return Ok(()),
            };
            (queue.cursor() as u64, queue.delta_at(index as usize))
        };
        if index < cursor || delta == 0 {
            return Ok(()); // already withdrawn or already cancelled
        }

        let dp = self.draft_pool();
        let grain = mul_div_floor(delta, dp.backing, dp.total_drafts)?;
        let new_dp_total = dp.total_drafts - delta;
        let new_dp_backing = dp.backing - grain;

        let sp = self.stake_pool();
        let minted = if sp.total_staked == 0 || sp.backing == 0 {
            grain
        } else {
            mul_div_floor(grain, sp.total_staked, sp.backing)?
        };
        let new_sp_backing = sp
            .backing
            .checked_add(grain)
            .ok_or_else(|| BallastError::Arithmetic("stake backing overflow".to_string()))?;
        let new_sp_total = sp
            .total_staked
            .checked_add(minted)
            .ok_or_else(|| BallastError::Arithmetic("share supply overflow".to_string()))?;

        self.ledger.mint(self.stake_era, &account, minted)?;
        let state = self.draft_state_mut();
        state.pool.total_drafts = new_dp_total;
        state.pool.backing = new_dp_backing;
        state.queue_mut(&account).cancel_at(index as usize);
        let p = self.stake_pool_mut();
        p.backing = new_sp_backing;
        p.total_staked = new_sp_total;

        self.events.push(Event::Transfer {
            from: AccountId::ZERO,
            to: account,
            shares: minted,
        });
        self.events.push(Event::UnstakingCancelled {
            index,
            era,
            account,
            grain,
            shares: minted,
        });
        info!(account = %account, index, grain = %grain, "unstaking cancelled");
        Ok(())
    }

    // ---- seizure ----------------------------------------------------------

    /// Seize `amount` grain from custody to cover a shortfall elsewhere in
    /// the protocol. Risk-manager only. Returns the seized amount for the
    /// caller to collect.
    pub fn seize<E: ProtocolEnv>(
        &mut self,
        caller: AccountId,
        amount: Grain,
        now: u64,
        env: &E,
    ) -> Result<Grain> {
        self.guarded(|v| v.seize_inner(caller, amount, now, env))
    }

    fn seize_inner<E: ProtocolEnv>(
        &mut self,
        caller: AccountId,
        amount: Grain,
        now: u64,
        env: &E,
    ) -> Result<Grain> {
        if caller != self.config.risk_manager {
            return Err(BallastError::Unauthorized(
                "only the risk manager may seize".to_string(),
            ));
        }
        if env.frozen() || env.trading_paused() {
            return Err(BallastError::StateGate(
                "frozen or trading paused".to_string(),
            ));
        }
        self.flush_rewards(now, env)?;

        let sp = self.stake_pool();
        let dp = self.draft_pool();
        let plan = plan_seizure(amount, self.unallocated(), sp.backing, dp.backing)?;
        let old_stake_rate = sp.rate();
        let old_draft_rate = dp.rate();
        let new_custody = self
            .custody
            .checked_sub(amount)
            .ok_or_else(|| BallastError::Arithmetic("custody underflow".to_string()))?;

        self.custody = new_custody;
        self.stake_pool_mut().backing -= plan.from_stake;
        self.draft_state_mut().pool.backing -= plan.from_drafts;

        let sp = self.stake_pool();
        let mut stake_rolled = false;
        if sp.backing == 0 && sp.total_staked > 0 {
            self.begin_stake_era();
            stake_rolled = true;
        }
        let dp = self.draft_pool();
        let mut draft_rolled = false;
        if dp.backing == 0 && dp.total_drafts > 0 {
            self.begin_draft_era();
            draft_rolled = true;
        }

        if plan.from_stake > 0 || stake_rolled {
            let new = self.exchange_rate();
            self.events.push(Event::ExchangeRateSet {
                pool: PoolKind::Stake,
                old: old_stake_rate,
                new,
            });
        }
        if plan.from_drafts > 0 || draft_rolled {
            let new = self.draft_pool().rate();
            self.events.push(Event::ExchangeRateSet {
                pool: PoolKind::Draft,
                old: old_draft_rate,
                new,
            });
        }
        warn!(
            amount = %amount,
            from_unallocated = %plan.from_unallocated,
            from_stake = %plan.from_stake,
            from_drafts = %plan.from_drafts,
            "staked capital seized"
        );
        Ok(amount)
    }

    fn begin_stake_era(&mut self) {
        self.stake_era += 1;
        self.stake_pools.insert(self.stake_era, StakePool::default());
        info!(era = self.stake_era, "stake pool rolled into a new era");
    }

    fn begin_draft_era(&mut self) {
        self.draft_era += 1;
        self.draft_eras.insert(self.draft_era, DraftEraState::default());
        info!(era = self.draft_era, "draft pool rolled into a new era");
    }

    // ---- governance safety valve ------------------------------------------

    /// Zero the stake pool and every live share balance after the rate has
    /// drifted outside the safe band, restoring the identity rate. Drafts
    /// are untouched: they are already-committed, separately-rated claims.
    pub fn reset_stakes(&mut self, caller: AccountId) -> Result<()> {
        self.guarded(|v| v.reset_stakes_inner(caller))
    }

    fn reset_stakes_inner(&mut self, caller: AccountId) -> Result<()> {
        if caller != self.config.governance {
            return Err(BallastError::Unauthorized(
                "only governance may reset stakes".to_string(),
            ));
        }
        let rate = self.exchange_rate();
        if rate >= self.config.min_safe_rate && rate <= self.config.max_safe_rate {
            return Err(BallastError::StateGate("rate still safe".to_string()));
        }
        self.begin_stake_era();
        self.events.push(Event::AllBalancesReset {
            era: self.stake_era,
        });
        warn!(era = self.stake_era, old_rate = %rate, "all stake balances reset");
        Ok(())
    }

    // ---- governance parameters --------------------------------------------

    /// Governance: change the unstaking delay.
    pub fn set_unstaking_delay(&mut self, caller: AccountId, delay: u64) -> Result<()> {
        self.guarded(|v| {
            v.require_governance(&caller)?;
            config::check_unstaking_delay(delay, v.config.reward_period)?;
            let old = v.config.unstaking_delay;
            v.config.unstaking_delay = delay;
            v.events.push(Event::UnstakingDelaySet { old, new: delay });
            Ok(())
        })
    }

    /// Governance: change the per-period reward ratio. Flushes rewards
    /// first so past periods accrue at the old ratio.
    pub fn set_reward_ratio<E: ProtocolEnv>(
        &mut self,
        caller: AccountId,
        ratio: Fix,
        now: u64,
        env: &E,
    ) -> Result<()> {
        self.guarded(|v| {
            v.require_governance(&caller)?;
            config::check_reward_ratio(ratio)?;
            v.flush_rewards(now, env)?;
            let old = v.config.reward_ratio;
            v.config.reward_ratio = ratio;
            v.events.push(Event::RatioSet { old, new: ratio });
            Ok(())
        })
    }

    /// Governance: change the withdrawal leak.
    pub fn set_withdrawal_leak(&mut self, caller: AccountId, leak: Fix) -> Result<()> {
        self.guarded(|v| {
            v.require_governance(&caller)?;
            config::check_withdrawal_leak(leak)?;
            let old = v.config.withdrawal_leak;
            v.config.withdrawal_leak = leak;
            v.events.push(Event::WithdrawalLeakSet { old, new: leak });
            Ok(())
        })
    }

    fn require_governance(&self, caller: &AccountId) -> Result<()> {
        if *caller != self.config.governance {
            return Err(BallastError::Unauthorized(
                "only governance may set parameters".to_string(),
            ));
        }
        Ok(())
    }

    // ---- revenue inflow ---------------------------------------------------

    /// Record revenue transferred into the vault's custody. The amount
    /// stays unallocated until `payout_rewards` moves it into the stake
    /// pool.
    pub fn deposit_rewards(&mut self, amount: Grain) -> Result<()> {
        self.guarded(|v| {
            v.custody = v
                .custody
                .checked_add(amount)
                .ok_or_else(|| BallastError::Arithmetic("custody overflow".to_string()))?;
            Ok(())
        })
    }

    // ---- receipt-token surface --------------------------------------------

    /// Move shares from the caller to `to`.
    pub fn transfer(&mut self, caller: AccountId, to: AccountId, shares: Shares) -> Result<()> {
        self.guarded(|v| {
            let vault_address = v.config.vault_address;
            v.ledger
                .transfer(v.stake_era, &caller, &to, shares, &vault_address)?;
            v.events.push(Event::Transfer {
                from: caller,
                to,
                shares,
            });
            Ok(())
        })
    }

    /// Move shares from `from` to `to` using the caller's allowance.
    pub fn transfer_from(
        &mut self,
        caller: AccountId,
        from: AccountId,
        to: AccountId,
        shares: Shares,
    ) -> Result<()> {
        self.guarded(|v| {
            let vault_address = v.config.vault_address;
            // check the allowance before moving anything so a failure
            // cannot leave the transfer half-applied
            let current = v.ledger.allowance(v.stake_era, &from, &caller);
            if current != ALLOWANCE_MAX && current < shares {
                return Err(BallastError::InsufficientBalance(format!(
                    "transfer of {} shares exceeds allowance {}",
                    shares, current
                )));
            }
            v.ledger
                .transfer(v.stake_era, &from, &to, shares, &vault_address)?;
            v.ledger.spend_allowance(v.stake_era, &from, &caller, shares)?;
            v.events.push(Event::Transfer { from, to, shares });
            Ok(())
        })
    }

    /// Set the caller's allowance for `spender`.
    pub fn approve(&mut self, caller: AccountId, spender: AccountId, shares: Shares) -> Result<()> {
        self.guarded(|v| {
            v.ledger.approve(v.stake_era, &caller, &spender, shares)?;
            v.events.push(Event::Approval {
                owner: caller,
                spender,
                shares,
            });
            Ok(())
        })
    }

    /// Raise the caller's allowance for `spender` by `added`.
    pub fn increase_allowance(
        &mut self,
        caller: AccountId,
        spender: AccountId,
        added: Shares,
    ) -> Result<Shares> {
        self.guarded(|v| {
            let next = v
                .ledger
                .increase_allowance(v.stake_era, &caller, &spender, added)?;
            v.events.push(Event::Approval {
                owner: caller,
                spender,
                shares: next,
            });
            Ok(next)
        })
    }

    /// Lower the caller's allowance for `spender` by `subtracted`.
    pub fn decrease_allowance(
        &mut self,
        caller: AccountId,
        spender: AccountId,
        subtracted: Shares,
    ) -> Result<Shares> {
        self.guarded(|v| {
            let next = v
                .ledger
                .decrease_allowance(v.stake_era, &caller, &spender, subtracted)?;
            v.events.push(Event::Approval {
                owner: caller,
                spender,
                shares: next,
            });
            Ok(next)
        })
    }
}
