//! Rewards Distributor - stake node shares to earn the incentive token
//!
//! A fixed emission per second is split between pools by weight. Inside a
//! pool, each depositor earns in proportion to their deposited shares,
//! tracked with a per-pool accumulator scaled by 1e18.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::RewardsError;
use super::events::*;
use crate::constants::MS_PER_SECOND;
use crate::errors::MathError;
use crate::math::{SafeMath, WAD};
use crate::registry::RegistryContractRef;
use crate::token::Cep18TokenContractRef;

/// Pool information
#[odra::odra_type]
pub struct PoolInfo {
    /// Node share token staked in the pool
    pub staked_token: Address,
    /// Allocation weight
    pub weight: u64,
    /// Reward per deposited share, scaled by 1e18
    pub acc_reward_per_share: U256,
    /// Block time accrual was last settled at
    pub last_reward_time: u64,
    /// Total shares deposited
    pub total_deposited: U256,
}

/// Depositor position in a pool
#[odra::odra_type]
pub struct UserInfo {
    pub amount: U256,
    /// Accumulator value already credited to the position
    pub reward_debt: U256,
    /// Earned reward the distributor could not pay yet
    pub owed: U256,
}

impl UserInfo {
    fn empty() -> Self {
        Self {
            amount: U256::zero(),
            reward_debt: U256::zero(),
            owed: U256::zero(),
        }
    }
}

/// Rewards Distributor contract
#[odra::module]
pub struct RewardsDistributor {
    /// Admin address
    admin: Var<Address>,
    /// Registry recognising node share tokens
    registry: Var<Address>,
    /// Incentive token paid out
    reward_token: Var<Address>,
    /// Emission across all pools (tokens per second)
    reward_per_second: Var<U256>,
    /// No rewards accrue before this block time
    start_time: Var<u64>,
    /// Pool information by pool ID
    pools: Mapping<u32, PoolInfo>,
    /// Number of pools
    pool_count: Var<u32>,
    /// Staked tokens that already have a pool
    pooled_tokens: Mapping<Address, bool>,
    /// Sum of all pool weights
    total_weight: Var<u64>,
    /// (pool_id, user) -> position
    users: Mapping<(u32, Address), UserInfo>,
    /// Paused state
    paused: Var<bool>,
}

#[odra::module]
impl RewardsDistributor {
    /// Initialize the distributor
    pub fn init(
        &mut self,
        registry: Address,
        reward_token: Address,
        reward_per_second: U256,
        start_time: u64,
    ) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.registry.set(registry);
        self.reward_token.set(reward_token);
        self.reward_per_second.set(reward_per_second);
        self.start_time.set(start_time);
        self.pool_count.set(0);
        self.total_weight.set(0);
        self.paused.set(false);
    }

    // ========================================
    // Pool Management (Admin)
    // ========================================

    /// Create a pool for a node share token
    pub fn add(&mut self, staked_token: Address, weight: u64) -> u32 {
        self.only_admin();
        if staked_token == self.reward_token() {
            self.env().revert(RewardsError::SelfReferentialPool);
        }
        let registry = self.registry.get_or_revert_with(RewardsError::Unauthorized);
        if !RegistryContractRef::new(self.env(), registry).is_node(staked_token) {
            self.env().revert(RewardsError::NotANodeToken);
        }
        if self.pooled_tokens.get(&staked_token).unwrap_or_default() {
            self.env().revert(RewardsError::PoolAlreadyExists);
        }

        self.mass_update_pools();

        let now = self.env().get_block_time();
        let pool_id = self.pool_count();
        self.pools.set(
            &pool_id,
            PoolInfo {
                staked_token,
                weight,
                acc_reward_per_share: U256::zero(),
                last_reward_time: now.max(self.start_time.get_or_default()),
                total_deposited: U256::zero(),
            },
        );
        self.pool_count.set(pool_id + 1);
        self.pooled_tokens.set(&staked_token, true);
        self.total_weight.set(self.total_weight() + weight);

        self.env().emit_event(PoolAdded {
            pool_id,
            staked_token,
            weight,
            created_by: self.env().caller(),
        });
        pool_id
    }

    /// Change a pool's weight, settling accrual under the old weights first
    pub fn set(&mut self, pool_id: u32, weight: u64) {
        self.only_admin();
        let pool = self.pool_or_revert(pool_id);
        self.mass_update_pools();

        let old_weight = pool.weight;
        let mut pool = self.pool_or_revert(pool_id);
        pool.weight = weight;
        self.pools.set(&pool_id, pool);
        self.total_weight.set(self.total_weight() - old_weight + weight);

        self.env().emit_event(PoolWeightSet {
            pool_id,
            old_weight,
            new_weight: weight,
            updated_by: self.env().caller(),
        });
    }

    /// Change the global emission rate
    pub fn set_reward_per_second(&mut self, reward_per_second: U256) {
        self.only_admin();
        self.mass_update_pools();

        let old_rate = self.reward_per_second();
        self.reward_per_second.set(reward_per_second);
        self.env().emit_event(RewardRateUpdated {
            old_rate,
            new_rate: reward_per_second,
            updated_by: self.env().caller(),
        });
    }

    pub fn pause(&mut self) {
        self.only_admin();
        self.paused.set(true);
    }

    pub fn unpause(&mut self) {
        self.only_admin();
        self.paused.set(false);
    }

    // ========================================
    // Accrual
    // ========================================

    /// Settle accrual of every pool up to now
    pub fn mass_update_pools(&mut self) {
        for pool_id in 0..self.pool_count() {
            self.update_pool(pool_id);
        }
    }

    /// Settle accrual of one pool up to now
    pub fn update_pool(&mut self, pool_id: u32) {
        let mut pool = self.pool_or_revert(pool_id);
        let now = self.env().get_block_time();
        if now <= pool.last_reward_time {
            return;
        }
        pool.acc_reward_per_share = self.checked(self.accumulated(&pool, now));
        pool.last_reward_time = now;
        self.pools.set(&pool_id, pool);
    }

    // ========================================
    // Staking Functions
    // ========================================

    /// Deposit node shares, paying out rewards earned so far
    pub fn deposit(&mut self, pool_id: u32, amount: U256) {
        self.ensure_not_paused();
        self.update_pool(pool_id);
        let caller = self.env().caller();
        let mut pool = self.pool_or_revert(pool_id);
        let mut user = self.user_info(pool_id, caller);
        self.settle(pool_id, caller, &pool, &mut user);

        if !amount.is_zero() {
            let this = self.env().self_address();
            Cep18TokenContractRef::new(self.env(), pool.staked_token)
                .transfer_from(caller, this, amount);
            user.amount = user.amount + amount;
            pool.total_deposited = pool.total_deposited + amount;
        }
        user.reward_debt = self.checked(Self::credited(&pool, user.amount));
        self.users.set(&(pool_id, caller), user);
        self.pools.set(&pool_id, pool);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(Deposit {
            user: caller,
            pool_id,
            amount,
            timestamp,
        });
    }

    /// Withdraw node shares, paying out rewards earned so far
    pub fn withdraw(&mut self, pool_id: u32, amount: U256) {
        self.ensure_not_paused();
        let caller = self.env().caller();
        let mut user = self.user_info(pool_id, caller);
        if user.amount < amount {
            self.env().revert(RewardsError::InsufficientDeposit);
        }
        self.update_pool(pool_id);
        let mut pool = self.pool_or_revert(pool_id);
        self.settle(pool_id, caller, &pool, &mut user);

        if !amount.is_zero() {
            user.amount = user.amount - amount;
            pool.total_deposited = pool.total_deposited - amount;
            Cep18TokenContractRef::new(self.env(), pool.staked_token).transfer(caller, amount);
        }
        user.reward_debt = self.checked(Self::credited(&pool, user.amount));
        self.users.set(&(pool_id, caller), user);
        self.pools.set(&pool_id, pool);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(Withdraw {
            user: caller,
            pool_id,
            amount,
            timestamp,
        });
    }

    /// Claim rewards without moving the deposit
    pub fn harvest(&mut self, pool_id: u32) {
        self.ensure_not_paused();
        self.update_pool(pool_id);
        let caller = self.env().caller();
        let pool = self.pool_or_revert(pool_id);
        let mut user = self.user_info(pool_id, caller);
        self.settle(pool_id, caller, &pool, &mut user);
        user.reward_debt = self.checked(Self::credited(&pool, user.amount));
        self.users.set(&(pool_id, caller), user);
    }

    /// Return the caller's whole deposit, forfeiting unpaid rewards
    pub fn emergency_withdraw(&mut self, pool_id: u32) {
        let caller = self.env().caller();
        let mut pool = self.pool_or_revert(pool_id);
        let user = self.user_info(pool_id, caller);
        let amount = user.amount;

        self.users.set(&(pool_id, caller), UserInfo::empty());
        pool.total_deposited = pool.total_deposited - amount;
        let staked_token = pool.staked_token;
        self.pools.set(&pool_id, pool);
        if !amount.is_zero() {
            Cep18TokenContractRef::new(self.env(), staked_token).transfer(caller, amount);
        }

        let timestamp = self.env().get_block_time();
        self.env().emit_event(EmergencyWithdraw {
            user: caller,
            pool_id,
            amount,
            timestamp,
        });
    }

    // ========================================
    // View Functions
    // ========================================

    /// Reward `account` could claim now, without settling anything
    pub fn pending_reward(&self, pool_id: u32, account: Address) -> U256 {
        let pool = self.pool_or_revert(pool_id);
        let user = self.user_info(pool_id, account);
        let now = self.env().get_block_time();
        let acc = self.checked(self.accumulated(&pool, now));
        let earned = self.checked(SafeMath::mul_div(user.amount, acc, U256::from(WAD)));
        earned.saturating_sub(user.reward_debt) + user.owed
    }

    pub fn pool_info(&self, pool_id: u32) -> Option<PoolInfo> {
        self.pools.get(&pool_id)
    }

    pub fn user_info(&self, pool_id: u32, account: Address) -> UserInfo {
        self.users
            .get(&(pool_id, account))
            .unwrap_or_else(UserInfo::empty)
    }

    pub fn pool_count(&self) -> u32 {
        self.pool_count.get_or_default()
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight.get_or_default()
    }

    pub fn reward_per_second(&self) -> U256 {
        self.reward_per_second.get_or_default()
    }

    pub fn reward_token(&self) -> Address {
        self.reward_token.get_or_revert_with(RewardsError::Unauthorized)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    // ========================================
    // Internal Functions
    // ========================================

    /// Pool accumulator brought forward to `now`
    fn accumulated(&self, pool: &PoolInfo, now: u64) -> Result<U256, MathError> {
        let total_weight = self.total_weight();
        if now <= pool.last_reward_time || pool.total_deposited.is_zero() || total_weight == 0 {
            return Ok(pool.acc_reward_per_share);
        }
        let elapsed = U256::from(now - pool.last_reward_time);
        let emitted = SafeMath::mul(elapsed, self.reward_per_second())?;
        let reward = SafeMath::mul_div(
            emitted,
            U256::from(pool.weight),
            U256::from(total_weight) * U256::from(MS_PER_SECOND),
        )?;
        let increase = SafeMath::mul_div(reward, U256::from(WAD), pool.total_deposited)?;
        SafeMath::add(pool.acc_reward_per_share, increase)
    }

    fn credited(pool: &PoolInfo, amount: U256) -> Result<U256, MathError> {
        SafeMath::mul_div(amount, pool.acc_reward_per_share, U256::from(WAD))
    }

    /// Pay what `user` has earned against the settled pool, as far as the reward balance allows
    fn settle(&mut self, pool_id: u32, account: Address, pool: &PoolInfo, user: &mut UserInfo) {
        let earned = self.checked(Self::credited(pool, user.amount));
        let pending = earned.saturating_sub(user.reward_debt) + user.owed;
        if pending.is_zero() {
            return;
        }

        let reward_token = self.reward_token();
        let this = self.env().self_address();
        let mut token = Cep18TokenContractRef::new(self.env(), reward_token);
        let paid = pending.min(token.balance_of(this));
        user.owed = pending - paid;
        if paid.is_zero() {
            return;
        }
        token.transfer(account, paid);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(RewardPaid {
            user: account,
            pool_id,
            reward_amount: paid,
            timestamp,
        });
    }

    fn pool_or_revert(&self, pool_id: u32) -> PoolInfo {
        self.pools
            .get(&pool_id)
            .unwrap_or_revert_with(&self.env(), RewardsError::PoolNotFound)
    }

    fn checked<T>(&self, result: Result<T, MathError>) -> T {
        result.unwrap_or_else(|e| self.env().revert(e))
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(RewardsError::Unauthorized);
        if caller != admin {
            self.env().revert(RewardsError::Unauthorized);
        }
    }

    fn ensure_not_paused(&self) {
        if self.paused.get_or_default() {
            self.env().revert(RewardsError::ContractPaused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::lending_node::LendingNodeHostRef;
    use crate::test_utils::{deploy_token, tokens, Protocol};
    use crate::tokens::AssetTokenHostRef;
    use odra::host::{Deployer, HostRef};

    struct Setup {
        p: Protocol,
        rewards: RewardsDistributorHostRef,
        reward: AssetTokenHostRef,
    }

    fn setup() -> Setup {
        setup_with(0, tokens(1_000_000))
    }

    /// One token per second, starting `start_delay` ms from now
    fn setup_with(start_delay: u64, funding: U256) -> Setup {
        let p = Protocol::deploy();
        let mut reward = deploy_token(&p.env, "REWARD");
        let rewards = RewardsDistributor::deploy(
            &p.env,
            RewardsDistributorInitArgs {
                registry: p.registry.address().clone(),
                reward_token: reward.address().clone(),
                reward_per_second: tokens(1),
                start_time: p.env.block_time() + start_delay,
            },
        );
        reward.mint(rewards.address().clone(), funding);
        Setup { p, rewards, reward }
    }

    /// Deposit into the fixture node and stake the shares in `pool_id`
    fn stake(s: &mut Setup, account: Address, pool_id: u32, amount: U256) {
        s.p.deposit(account, amount);
        let distributor = s.rewards.address().clone();
        s.p.env.set_caller(account);
        s.p.node.approve(distributor, amount);
        s.rewards.deposit(pool_id, amount);
        s.p.env.set_caller(s.p.admin);
    }

    fn stake_on(s: &mut Setup, node: &mut LendingNodeHostRef, account: Address, pool_id: u32, amount: U256) {
        s.p.mint_usd(account, amount);
        let distributor = s.rewards.address().clone();
        s.p.env.set_caller(account);
        s.p.usd.approve(node.address().clone(), amount);
        node.deposit(amount);
        node.approve(distributor, amount);
        s.rewards.deposit(pool_id, amount);
        s.p.env.set_caller(s.p.admin);
    }

    #[test]
    fn test_add_pool_guards() {
        let mut s = setup();
        let node = s.p.node_address();
        let usd = s.p.usd.address().clone();
        let reward = s.reward.address().clone();

        s.p.env.set_caller(s.p.depositor);
        assert_eq!(s.rewards.try_add(node, 1), Err(RewardsError::Unauthorized.into()));

        s.p.env.set_caller(s.p.admin);
        assert_eq!(
            s.rewards.try_add(reward, 1),
            Err(RewardsError::SelfReferentialPool.into())
        );
        assert_eq!(s.rewards.try_add(usd, 1), Err(RewardsError::NotANodeToken.into()));
        assert_eq!(s.rewards.add(node, 1), 0);
        assert_eq!(s.rewards.try_add(node, 2), Err(RewardsError::PoolAlreadyExists.into()));

        assert_eq!(s.rewards.pool_count(), 1);
        assert_eq!(s.rewards.total_weight(), 1);
        assert_eq!(s.rewards.pool_info(0).unwrap().staked_token, node);
        assert_eq!(s.rewards.pool_info(1), None);
        assert_eq!(
            s.rewards.try_deposit(5, U256::one()),
            Err(RewardsError::PoolNotFound.into())
        );
    }

    #[test]
    fn test_single_pool_earns_full_emission() {
        let mut s = setup();
        let depositor = s.p.depositor;
        s.rewards.add(s.p.node_address(), 1);
        stake(&mut s, depositor, 0, tokens(100));

        s.p.env.advance_block_time(10_000);
        assert_eq!(s.rewards.pending_reward(0, depositor), tokens(10));

        s.p.env.set_caller(depositor);
        s.rewards.harvest(0);
        assert_eq!(s.reward.balance_of(depositor), tokens(10));
        assert_eq!(s.rewards.pending_reward(0, depositor), U256::zero());
        assert_eq!(s.rewards.user_info(0, depositor).amount, tokens(100));
        assert_eq!(s.p.node.balance_of(s.rewards.address().clone()), tokens(100));
    }

    #[test]
    fn test_emission_split_by_weight() {
        let mut s = setup();
        let depositor = s.p.depositor;
        let other = s.p.env.get_account(6);
        let second_operator = s.p.env.get_account(5);
        let mut second = s.p.add_node(second_operator);

        s.rewards.add(s.p.node_address(), 1);
        s.rewards.add(second.address().clone(), 3);
        stake(&mut s, depositor, 0, tokens(100));
        stake_on(&mut s, &mut second, other, 1, tokens(50));

        s.p.env.advance_block_time(8_000);
        assert_eq!(s.rewards.pending_reward(0, depositor), tokens(2));
        assert_eq!(s.rewards.pending_reward(1, other), tokens(6));
    }

    #[test]
    fn test_reweighting_settles_old_weights_first() {
        let mut s = setup();
        let depositor = s.p.depositor;
        let other = s.p.env.get_account(6);
        let second_operator = s.p.env.get_account(5);
        let mut second = s.p.add_node(second_operator);

        s.rewards.add(s.p.node_address(), 1);
        s.rewards.add(second.address().clone(), 1);
        stake(&mut s, depositor, 0, tokens(100));
        stake_on(&mut s, &mut second, other, 1, tokens(100));

        s.p.env.advance_block_time(10_000);
        s.rewards.set(1, 3);
        assert_eq!(s.rewards.total_weight(), 4);

        s.p.env.advance_block_time(8_000);
        assert_eq!(s.rewards.pending_reward(0, depositor), tokens(7));
        assert_eq!(s.rewards.pending_reward(1, other), tokens(11));
    }

    #[test]
    fn test_rate_change_applies_from_now() {
        let mut s = setup();
        let depositor = s.p.depositor;
        s.rewards.add(s.p.node_address(), 1);
        stake(&mut s, depositor, 0, tokens(100));

        s.p.env.advance_block_time(10_000);
        s.rewards.set_reward_per_second(tokens(2));
        assert_eq!(s.rewards.reward_per_second(), tokens(2));

        s.p.env.advance_block_time(5_000);
        assert_eq!(s.rewards.pending_reward(0, depositor), tokens(20));
    }

    #[test]
    fn test_nothing_accrues_before_start() {
        let mut s = setup_with(10_000, tokens(1_000));
        let depositor = s.p.depositor;
        s.rewards.add(s.p.node_address(), 1);
        stake(&mut s, depositor, 0, tokens(100));

        s.p.env.advance_block_time(10_000);
        assert_eq!(s.rewards.pending_reward(0, depositor), U256::zero());
        s.p.env.advance_block_time(5_000);
        assert_eq!(s.rewards.pending_reward(0, depositor), tokens(5));
    }

    #[test]
    fn test_withdraw_pays_rewards_and_returns_shares() {
        let mut s = setup();
        let depositor = s.p.depositor;
        s.rewards.add(s.p.node_address(), 1);
        stake(&mut s, depositor, 0, tokens(100));
        s.p.env.advance_block_time(5_000);

        s.p.env.set_caller(depositor);
        assert_eq!(
            s.rewards.try_withdraw(0, tokens(101)),
            Err(RewardsError::InsufficientDeposit.into())
        );
        s.rewards.withdraw(0, tokens(40));

        assert_eq!(s.reward.balance_of(depositor), tokens(5));
        assert_eq!(s.p.node.balance_of(depositor), tokens(40));
        assert_eq!(s.rewards.user_info(0, depositor).amount, tokens(60));
        assert_eq!(s.rewards.pool_info(0).unwrap().total_deposited, tokens(60));

        s.p.env.advance_block_time(3_000);
        assert_eq!(s.rewards.pending_reward(0, depositor), tokens(3));
    }

    #[test]
    fn test_emergency_withdraw_forfeits_rewards() {
        let mut s = setup();
        let depositor = s.p.depositor;
        s.rewards.add(s.p.node_address(), 1);
        stake(&mut s, depositor, 0, tokens(100));
        s.p.env.advance_block_time(10_000);
        s.rewards.pause();

        s.p.env.set_caller(depositor);
        s.rewards.emergency_withdraw(0);

        assert_eq!(s.p.node.balance_of(depositor), tokens(100));
        assert_eq!(s.reward.balance_of(depositor), U256::zero());
        assert_eq!(s.rewards.user_info(0, depositor).amount, U256::zero());
        assert_eq!(s.rewards.pending_reward(0, depositor), U256::zero());
        assert_eq!(s.rewards.pool_info(0).unwrap().total_deposited, U256::zero());
    }

    #[test]
    fn test_payout_capped_by_reward_balance() {
        let mut s = setup_with(0, tokens(4));
        let depositor = s.p.depositor;
        let distributor = s.rewards.address().clone();
        s.rewards.add(s.p.node_address(), 1);
        stake(&mut s, depositor, 0, tokens(100));
        s.p.env.advance_block_time(10_000);

        s.p.env.set_caller(depositor);
        s.rewards.harvest(0);
        assert_eq!(s.reward.balance_of(depositor), tokens(4));
        assert_eq!(s.rewards.user_info(0, depositor).owed, tokens(6));
        assert_eq!(s.rewards.pending_reward(0, depositor), tokens(6));

        s.p.env.set_caller(s.p.admin);
        s.reward.mint(distributor, tokens(6));
        s.p.env.set_caller(depositor);
        s.rewards.harvest(0);
        assert_eq!(s.reward.balance_of(depositor), tokens(10));
        assert_eq!(s.rewards.user_info(0, depositor).owed, U256::zero());
    }

    #[test]
    fn test_pause_blocks_staking() {
        let mut s = setup();
        let depositor = s.p.depositor;
        s.rewards.add(s.p.node_address(), 1);

        s.p.env.set_caller(depositor);
        assert_eq!(s.rewards.try_pause(), Err(RewardsError::Unauthorized.into()));

        s.p.env.set_caller(s.p.admin);
        s.rewards.pause();
        assert!(s.rewards.is_paused());

        s.p.env.set_caller(depositor);
        assert_eq!(
            s.rewards.try_deposit(0, U256::zero()),
            Err(RewardsError::ContractPaused.into())
        );
        assert_eq!(s.rewards.try_harvest(0), Err(RewardsError::ContractPaused.into()));

        s.p.env.set_caller(s.p.admin);
        s.rewards.unpause();
        stake(&mut s, depositor, 0, tokens(1));
        assert_eq!(s.rewards.user_info(0, depositor).amount, tokens(1));
    }
}
