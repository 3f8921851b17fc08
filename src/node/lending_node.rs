//! Lending Node - pooled liquidity vault, loan book and bond ledger
//!
//! Depositors supply the base asset and receive node shares. The operator
//! approves loans out of the unlent balance. Bond stakers (the operator first)
//! back the loan book: when an overdue loan is slashed, active and unbonding
//! stake lose the same fraction, and the seized bond is later sold back into
//! the pool.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::NodeError;
use super::events::*;
use super::loan::{Installment, Loan, LoanStatus};
use super::loan_set::LoanIdSet;
use crate::adapters::{ExchangeContractRef, YieldVaultContractRef};
use crate::constants::{
    AGENT_FEE_BPS, INTEREST_WITHHELD_BPS, OPERATOR_FEE_SHARE_BPS, TREASURY_FEE_BPS,
    UNBONDING_PERIOD_MS,
};
use crate::errors::MathError;
use crate::math::{SafeMath, ShareMath};
use crate::token::{Cep18TokenContractRef, ShareToken};

/// Lending node contract
#[odra::module]
pub struct LendingNode {
    /// Registry allowed to bind the node
    registry: Var<Address>,
    /// Operator, set once on binding
    operator: Var<Address>,
    base_asset: Var<Address>,
    bond_token: Var<Address>,
    exchange: Var<Address>,
    yield_vault: Var<Option<Address>>,
    /// Receives the treasury fee on every approval
    treasury: Var<Address>,
    /// Keep collateral in the node instead of the yield vault
    collateral_locked: Var<bool>,
    /// Extra time after a due date before a loan may be slashed
    grace_period: Var<u64>,
    /// Operator bond locked at creation
    bond_requirement: Var<U256>,

    /// Depositor shares (CEP-18)
    shares: SubModule<ShareToken>,
    /// Unlent base asset, excluding withheld fees
    liquid_balance: Var<U256>,
    /// Outstanding principal of current loans
    accounts_receivable: Var<U256>,
    /// Withheld interest awaiting collection
    fee_balance: Var<U256>,

    /// Bumped whenever a slash empties the staked pool
    staking_epoch: Var<u32>,
    /// Staking shares keyed by (epoch, account)
    staking_shares: Mapping<(u32, Address), U256>,
    total_staking_shares: Var<U256>,
    total_staked_bond: Var<U256>,
    unbonding_epoch: Var<u32>,
    unbonding_shares: Mapping<(u32, Address), U256>,
    total_unbonding_shares: Var<U256>,
    unbonding_amount: Var<U256>,
    /// Start of each account's latest unbonding
    unbond_started_at: Mapping<Address, u64>,
    /// Seized bond not yet sold
    slashing_balance: Var<U256>,

    loans: Mapping<u64, Loan>,
    next_loan_id: Var<u64>,
    pending_requests: SubModule<LoanIdSet>,
    current_loans: SubModule<LoanIdSet>,
    defaulted_loan_count: Var<u64>,
    /// Collateral held for pending and current loans, per token
    collateral_owed: Mapping<Address, U256>,
    /// Collateral principal parked in the yield vault, per token
    vault_principal: Mapping<Address, U256>,

    /// Reentrancy lock
    locked: Var<bool>,
}

#[odra::module]
impl LendingNode {
    /// Deploy an unbound node owned by `registry`
    pub fn init(&mut self, registry: Address) {
        self.registry.set(registry);
        self.next_loan_id.set(0);
        self.locked.set(false);
    }

    /// Bind the node to its operator and stake the operator's bond.
    ///
    /// The registry transfers `bond_requirement` of `bond_token` to the node
    /// before calling this.
    #[allow(clippy::too_many_arguments)]
    pub fn bind(
        &mut self,
        operator: Address,
        base_asset: Address,
        bond_token: Address,
        exchange: Address,
        yield_vault: Option<Address>,
        treasury: Address,
        collateral_locked: bool,
        grace_period: u64,
        bond_requirement: U256,
    ) {
        let registry = self.registry.get_or_revert_with(NodeError::NotRegistry);
        if self.env().caller() != registry {
            self.env().revert(NodeError::NotRegistry);
        }
        if self.is_bound() {
            self.env().revert(NodeError::AlreadyBound);
        }

        self.operator.set(operator);
        self.base_asset.set(base_asset);
        self.bond_token.set(bond_token);
        self.exchange.set(exchange);
        self.yield_vault.set(yield_vault);
        self.treasury.set(treasury);
        self.collateral_locked.set(collateral_locked);
        self.grace_period.set(grace_period);
        self.bond_requirement.set(bond_requirement);

        let decimals = Cep18TokenContractRef::new(self.env(), base_asset).decimals();
        self.shares.init(
            String::from("Lending Node Share"),
            String::from("LNS"),
            decimals,
        );

        if !bond_requirement.is_zero() {
            self.set_staking_shares(operator, bond_requirement);
            self.total_staking_shares.set(bond_requirement);
            self.total_staked_bond.set(bond_requirement);
        }

        let timestamp = self.env().get_block_time();
        self.env().emit_event(NodeBound {
            operator,
            base_asset,
            bond_token,
            bond_amount: bond_requirement,
            timestamp,
        });
    }

    // ========================================
    // Depositor Vault
    // ========================================

    /// Deposit base asset, returning the shares minted
    pub fn deposit(&mut self, amount: U256) -> U256 {
        let base_asset = self.base_asset();
        if amount.is_zero() {
            self.env().revert(NodeError::ZeroAmount);
        }
        if !self.is_active() {
            self.env().revert(NodeError::InactiveNode);
        }

        let total_shares = self.shares.total_supply();
        let total_value = self.total_asset_value();
        if !total_shares.is_zero() && total_value.is_zero() {
            self.env().revert(NodeError::PoolInsolvent);
        }
        let minted = self.checked(ShareMath::to_shares(amount, total_shares, total_value));
        if minted.is_zero() {
            self.env().revert(NodeError::ZeroShares);
        }

        let caller = self.env().caller();
        self.pull(base_asset, caller, amount);
        self.liquid_balance.set(self.liquid_balance() + amount);
        self.shares.mint(caller, minted);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(Deposited {
            account: caller,
            amount,
            shares: minted,
            timestamp,
        });
        minted
    }

    /// Redeem shares for base asset out of the unlent balance
    pub fn withdraw(&mut self, shares: U256) -> U256 {
        let base_asset = self.base_asset();
        if shares.is_zero() {
            self.env().revert(NodeError::ZeroAmount);
        }
        let caller = self.env().caller();
        if self.shares.balance_of(caller) < shares {
            self.env().revert(NodeError::InsufficientShares);
        }

        let amount = self.checked(ShareMath::to_assets(
            shares,
            self.shares.total_supply(),
            self.total_asset_value(),
        ));
        let liquid = self.liquid_balance();
        if amount > liquid {
            self.env().revert(NodeError::InsufficientLiquidity);
        }

        self.shares.burn(caller, shares);
        self.liquid_balance.set(liquid - amount);
        self.push(base_asset, caller, amount);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(Withdrawn {
            account: caller,
            amount,
            shares,
            timestamp,
        });
        amount
    }

    // ========================================
    // Bond Staking
    // ========================================

    /// Stake bond, returning the staking shares minted
    pub fn stake(&mut self, amount: U256) -> U256 {
        let bond_token = self.bond_token();
        if amount.is_zero() {
            self.env().revert(NodeError::ZeroAmount);
        }

        let total_shares = self.total_staking_shares();
        let total_bond = self.total_staked_bond();
        let minted = self.checked(ShareMath::to_shares(amount, total_shares, total_bond));
        if minted.is_zero() {
            self.env().revert(NodeError::ZeroShares);
        }

        let caller = self.env().caller();
        self.pull(bond_token, caller, amount);
        self.set_staking_shares(caller, self.staking_shares_of(caller) + minted);
        self.total_staking_shares.set(total_shares + minted);
        self.total_staked_bond.set(total_bond + amount);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(BondStaked {
            account: caller,
            amount,
            staking_shares: minted,
            timestamp,
        });
        minted
    }

    /// Move `amount` of the caller's bonded balance into the unbonding pool.
    ///
    /// Restarts the caller's cooldown. Unbonding bond stays exposed to slashing.
    pub fn initiate_unstake(&mut self, amount: U256) -> U256 {
        let operator = self.operator();
        if amount.is_zero() {
            self.env().revert(NodeError::ZeroAmount);
        }
        let caller = self.env().caller();
        let bonded = self.bond_balance(caller);
        if amount > bonded {
            self.env().revert(NodeError::InsufficientBond);
        }
        if caller == operator
            && !self.current_loans.is_empty()
            && bonded - amount < self.bond_requirement.get_or_default()
        {
            self.env().revert(NodeError::OperatorBondLocked);
        }

        let total_shares = self.total_staking_shares();
        let total_bond = self.total_staked_bond();
        let held = self.staking_shares_of(caller);
        let burned = self
            .checked(ShareMath::to_shares_up(amount, total_shares, total_bond))
            .min(held);
        self.set_staking_shares(caller, held - burned);
        self.total_staking_shares.set(total_shares - burned);
        self.total_staked_bond.set(total_bond - amount);

        let total_unbonding_shares = self.total_unbonding_shares();
        let unbonding = self.unbonding_amount();
        let minted = self.checked(ShareMath::to_shares(amount, total_unbonding_shares, unbonding));
        self.set_unbonding_shares(caller, self.unbonding_shares_of(caller) + minted);
        self.total_unbonding_shares.set(total_unbonding_shares + minted);
        self.unbonding_amount.set(unbonding + amount);

        let now = self.env().get_block_time();
        self.unbond_started_at.set(&caller, now);

        self.env().emit_event(UnstakeInitiated {
            account: caller,
            amount,
            unbonding_shares: minted,
            available_at: now + UNBONDING_PERIOD_MS,
        });
        minted
    }

    /// Claim all of the caller's unbonding bond once the cooldown has passed
    pub fn unstake(&mut self) -> U256 {
        let bond_token = self.bond_token();
        let caller = self.env().caller();
        let shares = self.unbonding_shares_of(caller);
        if shares.is_zero() {
            self.env().revert(NodeError::NothingToUnstake);
        }
        let now = self.env().get_block_time();
        if now < self.unbond_available_at(caller) {
            self.env().revert(NodeError::CooldownNotElapsed);
        }

        let total_shares = self.total_unbonding_shares();
        let unbonding = self.unbonding_amount();
        let amount = self.checked(ShareMath::to_assets(shares, total_shares, unbonding));

        self.set_unbonding_shares(caller, U256::zero());
        self.total_unbonding_shares.set(total_shares - shares);
        self.unbonding_amount.set(unbonding - amount);
        self.push(bond_token, caller, amount);

        self.env().emit_event(BondUnstaked {
            account: caller,
            amount,
            timestamp: now,
        });
        amount
    }

    // ========================================
    // Loan Requests
    // ========================================

    /// Queue a loan request for the operator, posting optional collateral.
    ///
    /// Collateral goes to the yield vault when one is configured and the
    /// node does not lock collateral.
    #[allow(clippy::too_many_arguments)]
    pub fn request_loan(
        &mut self,
        principal: U256,
        payment_interval: u64,
        num_payments: u32,
        interest_rate_bps: u32,
        interest_only: bool,
        collateral_token: Option<Address>,
        collateral_amount: U256,
        agent: Address,
        message: String,
    ) -> u64 {
        self.ensure_bound();
        if principal.is_zero() || payment_interval == 0 || num_payments == 0 {
            self.env().revert(NodeError::InvalidLoanTerms);
        }
        if collateral_token.is_some() == collateral_amount.is_zero() {
            self.env().revert(NodeError::InvalidLoanTerms);
        }
        let now = self.env().get_block_time();
        let maturity = payment_interval
            .checked_mul(u64::from(num_payments))
            .and_then(|term| now.checked_add(term));
        if maturity.is_none() {
            self.env().revert(NodeError::InvalidLoanTerms);
        }

        let borrower = self.env().caller();
        let mut collateral_in_vault = false;
        if let Some(token) = collateral_token {
            self.pull(token, borrower, collateral_amount);
            collateral_in_vault = self.park_collateral(token, collateral_amount);
            let owed = self.collateral_owed(token);
            self.collateral_owed.set(&token, owed + collateral_amount);
        }

        let loan_id = self.next_loan_id.get_or_default();
        let loan = Loan {
            id: loan_id,
            borrower,
            agent,
            principal,
            outstanding_principal: principal,
            payment_interval,
            num_payments,
            remaining_payments: num_payments,
            interest_rate_bps,
            interest_only,
            payment_amount: U256::zero(),
            collateral_token,
            collateral_amount,
            collateral_in_vault,
            requested_at: now,
            next_due_date: 0,
            status: LoanStatus::Pending,
            message,
        };
        self.loans.set(&loan_id, loan);
        self.next_loan_id.set(loan_id + 1);

        self.pending_requests.insert(loan_id);

        self.env().emit_event(LoanRequested {
            loan_id,
            borrower,
            principal,
            collateral_token,
            collateral_amount,
            timestamp: now,
        });
        loan_id
    }

    /// Approve a pending request and disburse the principal net of fees
    pub fn approve_loan(&mut self, loan_id: u64, min_amount_out: U256) {
        self.only_operator();
        let base_asset = self.base_asset();
        if !self.is_active() {
            self.env().revert(NodeError::InactiveNode);
        }
        if !self.pending_requests.remove(loan_id) {
            self.env().revert(NodeError::NoSuchPendingLoan);
        }
        let mut loan = self.loan_or_revert(loan_id);

        let liquid = self.liquid_balance();
        if loan.principal > liquid {
            self.env().revert(NodeError::InsufficientLiquidity);
        }
        let treasury_fee = self.checked(SafeMath::bps(loan.principal, TREASURY_FEE_BPS));
        let agent_fee = self.checked(SafeMath::bps(loan.principal, AGENT_FEE_BPS));
        let disbursed = loan.principal - treasury_fee - agent_fee;
        if disbursed < min_amount_out {
            self.env().revert(NodeError::SlippageExceeded);
        }

        let now = self.env().get_block_time();
        loan.status = LoanStatus::Current;
        loan.next_due_date = self.later(now, loan.payment_interval);
        loan.remaining_payments = loan.num_payments;
        loan.payment_amount = self.checked(loan.scheduled_payment());

        self.liquid_balance.set(liquid - loan.principal);
        self.accounts_receivable.set(self.accounts_receivable() + loan.principal);
        self.current_loans.insert(loan_id);

        let treasury = self.treasury.get_or_revert_with(NodeError::NodeNotBound);
        self.push(base_asset, loan.borrower, disbursed);
        self.push(base_asset, loan.agent, agent_fee);
        self.push(base_asset, treasury, treasury_fee);

        self.env().emit_event(LoanApproved {
            loan_id,
            borrower: loan.borrower,
            principal: loan.principal,
            treasury_fee,
            agent_fee,
            disbursed,
            next_due_date: loan.next_due_date,
        });
        self.loans.set(&loan_id, loan);
    }

    /// Reject every pending request, returning posted collateral
    pub fn clear_pending_loans(&mut self) {
        self.only_operator();
        for loan_id in self.pending_requests.take_all() {
            let loan = self.loan_or_revert(loan_id);
            self.cancel_request(loan);
        }
    }

    /// Withdraw a request that has not been approved yet, reclaiming its collateral
    pub fn withdraw_collateral(&mut self, loan_id: u64) {
        self.ensure_bound();
        let loan = self.loan_or_revert(loan_id);
        if loan.status != LoanStatus::Pending {
            self.env().revert(NodeError::LoanNotPending);
        }
        if self.env().caller() != loan.borrower {
            self.env().revert(NodeError::NotBorrower);
        }
        self.pending_requests.remove(loan_id);
        self.cancel_request(loan);
    }

    // ========================================
    // Repayment
    // ========================================

    /// Pay the next scheduled installment; anyone may pay
    pub fn make_loan_payment(&mut self, loan_id: u64) -> U256 {
        let base_asset = self.base_asset();
        let mut loan = self.loan_or_revert(loan_id);
        if !loan.is_current() {
            self.env().revert(NodeError::LoanNotCurrent);
        }

        let installment = self.checked(loan.next_installment());
        let amount = self.checked(installment.total());
        let payer = self.env().caller();
        self.pull(base_asset, payer, amount);
        let withheld = self.settle_installment(&mut loan, installment);

        loan.remaining_payments -= 1;
        loan.next_due_date = self.later(loan.next_due_date, loan.payment_interval);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(LoanPaymentMade {
            loan_id,
            payer,
            principal_paid: installment.principal,
            interest_paid: installment.interest,
            fee_withheld: withheld,
            remaining_payments: loan.remaining_payments,
            timestamp,
        });

        if loan.remaining_payments == 0 {
            self.close_repaid(loan);
        } else {
            self.loans.set(&loan_id, loan);
        }
        amount
    }

    /// Settle the outstanding principal plus one period of interest and close the loan
    pub fn repay_early(&mut self, loan_id: u64) -> U256 {
        let base_asset = self.base_asset();
        let mut loan = self.loan_or_revert(loan_id);
        if !loan.is_current() {
            self.env().revert(NodeError::LoanNotCurrent);
        }

        let installment = self.checked(loan.early_settlement());
        let amount = self.checked(installment.total());
        let payer = self.env().caller();
        self.pull(base_asset, payer, amount);
        let withheld = self.settle_installment(&mut loan, installment);
        loan.remaining_payments = 0;

        let timestamp = self.env().get_block_time();
        self.env().emit_event(LoanPaymentMade {
            loan_id,
            payer,
            principal_paid: installment.principal,
            interest_paid: installment.interest,
            fee_withheld: withheld,
            remaining_payments: 0,
            timestamp,
        });
        self.close_repaid(loan);
        amount
    }

    // ========================================
    // Defaults
    // ========================================

    /// Write off an overdue loan, liquidate its collateral and slash stakers for the shortfall
    pub fn slash_loan(&mut self, loan_id: u64, min_amount_out: U256) {
        let base_asset = self.base_asset();
        let mut loan = self.loan_or_revert(loan_id);
        if !loan.is_current() {
            self.env().revert(NodeError::AlreadyDefaulted);
        }
        let now = self.env().get_block_time();
        let deadline = loan
            .next_due_date
            .saturating_add(self.grace_period.get_or_default());
        if now <= deadline {
            self.env().revert(NodeError::NotOverdue);
        }
        self.lock();

        let value_before = self.total_asset_value();
        let written_off = loan.outstanding_principal;
        self.accounts_receivable.set(self.accounts_receivable() - written_off);
        self.current_loans.remove(loan_id);
        self.defaulted_loan_count.set(self.defaulted_loan_count() + 1);
        loan.status = LoanStatus::Defaulted;

        let mut proceeds = U256::zero();
        if let Some(token) = loan.collateral_token {
            let freed = self.release_collateral(&loan);
            proceeds = if token == base_asset || freed.is_zero() {
                freed
            } else {
                self.swap(token, freed, base_asset, min_amount_out)
            };
            self.credit_pool(proceeds);
        }

        let loss = written_off.saturating_sub(proceeds);
        let bond_slashed = self.apply_slash(loss, value_before);

        self.env().emit_event(LoanSlashed {
            loan_id,
            written_off,
            collateral_proceeds: proceeds,
            loss,
            bond_slashed,
            timestamp: now,
        });
        self.loans.set(&loan_id, loan);
        self.unlock();
    }

    /// Sell all slashed bond for base asset.
    ///
    /// Proceeds go to the pool, or to fees when no shares are outstanding.
    pub fn sell_slashed(&mut self, min_amount_out: U256) -> U256 {
        let base_asset = self.base_asset();
        let bond_token = self.bond_token();
        let amount = self.slashing_balance();
        if amount.is_zero() {
            self.env().revert(NodeError::NothingToSell);
        }
        self.lock();

        self.slashing_balance.set(U256::zero());
        let proceeds = self.swap(bond_token, amount, base_asset, min_amount_out);
        self.credit_pool(proceeds);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(SlashedBondSold {
            bond_amount: amount,
            proceeds,
            timestamp,
        });
        self.unlock();
        proceeds
    }

    // ========================================
    // Fees
    // ========================================

    /// Distribute withheld interest between the operator and bond stakers
    pub fn collect_fees(&mut self) {
        self.only_operator();
        let fees = self.fee_balance();
        if fees.is_zero() {
            self.env().revert(NodeError::NoFeesToCollect);
        }
        self.lock();
        self.fee_balance.set(U256::zero());
        self.distribute_fees(fees);
        self.unlock();
    }

    /// Harvest yield earned by vaulted collateral of `token` and distribute it like fees
    pub fn collect_collateral_fees(&mut self, token: Address) {
        self.only_operator();
        let base_asset = self.base_asset();
        let vault = self
            .yield_vault
            .get_or_default()
            .unwrap_or_revert_with(&self.env(), NodeError::NoYieldVault);

        let this = self.env().self_address();
        let position = YieldVaultContractRef::new(self.env(), vault).balance_of(token, this);
        let earned = position.saturating_sub(self.vault_principal.get(&token).unwrap_or_default());
        if earned.is_zero() {
            self.env().revert(NodeError::NoFeesToCollect);
        }
        self.lock();

        let withdrawn = YieldVaultContractRef::new(self.env(), vault).withdraw(token, earned);
        let base_amount = if token == base_asset || withdrawn.is_zero() {
            withdrawn
        } else {
            self.swap(token, withdrawn, base_asset, U256::zero())
        };

        let timestamp = self.env().get_block_time();
        self.env().emit_event(CollateralYieldCollected {
            token,
            yield_amount: withdrawn,
            base_amount,
            timestamp,
        });
        if !base_amount.is_zero() {
            self.distribute_fees(base_amount);
        }
        self.unlock();
    }

    // ========================================
    // Node Views
    // ========================================

    pub fn registry(&self) -> Address {
        self.registry.get_or_revert_with(NodeError::NotRegistry)
    }

    pub fn operator(&self) -> Address {
        self.operator.get_or_revert_with(NodeError::NodeNotBound)
    }

    pub fn is_bound(&self) -> bool {
        self.operator.get().is_some()
    }

    pub fn base_asset(&self) -> Address {
        self.base_asset.get_or_revert_with(NodeError::NodeNotBound)
    }

    pub fn bond_token(&self) -> Address {
        self.bond_token.get_or_revert_with(NodeError::NodeNotBound)
    }

    pub fn bond_requirement(&self) -> U256 {
        self.bond_requirement.get_or_default()
    }

    /// A node accepts deposits and approves loans only while bond is staked
    pub fn is_active(&self) -> bool {
        !self.total_staked_bond().is_zero()
    }

    pub fn total_asset_value(&self) -> U256 {
        self.liquid_balance() + self.accounts_receivable()
    }

    pub fn liquid_balance(&self) -> U256 {
        self.liquid_balance.get_or_default()
    }

    pub fn accounts_receivable(&self) -> U256 {
        self.accounts_receivable.get_or_default()
    }

    pub fn fee_balance(&self) -> U256 {
        self.fee_balance.get_or_default()
    }

    /// Base asset redeemable for `account`'s shares
    pub fn base_token_balance(&self, account: Address) -> U256 {
        self.checked(ShareMath::to_assets(
            self.shares.balance_of(account),
            self.shares.total_supply(),
            self.total_asset_value(),
        ))
    }

    pub fn total_staked_bond(&self) -> U256 {
        self.total_staked_bond.get_or_default()
    }

    pub fn total_staking_shares(&self) -> U256 {
        self.total_staking_shares.get_or_default()
    }

    pub fn staking_shares_of(&self, account: Address) -> U256 {
        let epoch = self.staking_epoch.get_or_default();
        self.staking_shares.get(&(epoch, account)).unwrap_or_default()
    }

    /// Bond currently staked by `account`
    pub fn bond_balance(&self, account: Address) -> U256 {
        self.checked(ShareMath::to_assets(
            self.staking_shares_of(account),
            self.total_staking_shares(),
            self.total_staked_bond(),
        ))
    }

    pub fn unbonding_amount(&self) -> U256 {
        self.unbonding_amount.get_or_default()
    }

    pub fn total_unbonding_shares(&self) -> U256 {
        self.total_unbonding_shares.get_or_default()
    }

    pub fn unbonding_shares_of(&self, account: Address) -> U256 {
        let epoch = self.unbonding_epoch.get_or_default();
        self.unbonding_shares.get(&(epoch, account)).unwrap_or_default()
    }

    /// Bond `account` can claim once its cooldown ends
    pub fn unbonding_balance(&self, account: Address) -> U256 {
        self.checked(ShareMath::to_assets(
            self.unbonding_shares_of(account),
            self.total_unbonding_shares(),
            self.unbonding_amount(),
        ))
    }

    pub fn unbond_available_at(&self, account: Address) -> u64 {
        self.unbond_started_at
            .get(&account)
            .unwrap_or_default()
            .saturating_add(UNBONDING_PERIOD_MS)
    }

    pub fn slashing_balance(&self) -> U256 {
        self.slashing_balance.get_or_default()
    }

    pub fn loan(&self, loan_id: u64) -> Option<Loan> {
        self.loans.get(&loan_id)
    }

    pub fn pending_requests(&self) -> Vec<u64> {
        self.pending_requests.ids()
    }

    pub fn pending_request_count(&self) -> u32 {
        self.pending_requests.len()
    }

    pub fn current_loans(&self) -> Vec<u64> {
        self.current_loans.ids()
    }

    pub fn current_loan_count(&self) -> u32 {
        self.current_loans.len()
    }

    pub fn defaulted_loan_count(&self) -> u64 {
        self.defaulted_loan_count.get_or_default()
    }

    pub fn collateral_owed(&self, token: Address) -> U256 {
        self.collateral_owed.get(&token).unwrap_or_default()
    }

    /// Due date of the next installment, zero unless the loan is current
    pub fn next_due_date(&self, loan_id: u64) -> u64 {
        match self.loans.get(&loan_id) {
            Some(loan) if loan.is_current() => loan.next_due_date,
            _ => 0,
        }
    }

    /// Amount of the next installment, zero unless the loan is current
    pub fn next_payment(&self, loan_id: u64) -> U256 {
        match self.loans.get(&loan_id) {
            Some(loan) if loan.is_current() => {
                let installment = self.checked(loan.next_installment());
                self.checked(installment.total())
            }
            _ => U256::zero(),
        }
    }

    // ========================================
    // Share Token (CEP-18)
    // ========================================

    pub fn name(&self) -> String {
        self.shares.name()
    }

    pub fn symbol(&self) -> String {
        self.shares.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.shares.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.shares.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.shares.balance_of(owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.shares.allowance(owner, spender)
    }

    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        self.shares.transfer(to, amount)
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        self.shares.approve(spender, amount)
    }

    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        self.shares.transfer_from(from, to, amount)
    }

    // ========================================
    // Internal Functions
    // ========================================

    fn ensure_bound(&self) {
        if !self.is_bound() {
            self.env().revert(NodeError::NodeNotBound);
        }
    }

    fn only_operator(&self) {
        if self.env().caller() != self.operator() {
            self.env().revert(NodeError::NotOperator);
        }
    }

    fn checked<T>(&self, result: Result<T, MathError>) -> T {
        result.unwrap_or_else(|e| self.env().revert(e))
    }

    /// `time + delta`, reverting on overflow
    fn later(&self, time: u64, delta: u64) -> u64 {
        time.checked_add(delta)
            .unwrap_or_else(|| self.env().revert(MathError::Overflow))
    }

    fn set_staking_shares(&mut self, account: Address, shares: U256) {
        let epoch = self.staking_epoch.get_or_default();
        self.staking_shares.set(&(epoch, account), shares);
    }

    fn set_unbonding_shares(&mut self, account: Address, shares: U256) {
        let epoch = self.unbonding_epoch.get_or_default();
        self.unbonding_shares.set(&(epoch, account), shares);
    }

    /// Credit base asset to depositors, or to fees when no shares are outstanding
    fn credit_pool(&mut self, amount: U256) {
        if self.shares.total_supply().is_zero() {
            self.fee_balance.set(self.fee_balance() + amount);
        } else {
            self.liquid_balance.set(self.liquid_balance() + amount);
        }
    }

    fn loan_or_revert(&self, loan_id: u64) -> Loan {
        self.loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), NodeError::LoanNotFound)
    }

    fn pull(&self, token: Address, from: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let this = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), token).transfer_from(from, this, amount);
    }

    fn push(&self, token: Address, to: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        Cep18TokenContractRef::new(self.env(), token).transfer(to, amount);
    }

    /// Sell `amount_in` through the exchange into the node
    fn swap(&self, token_in: Address, amount_in: U256, token_out: Address, min_amount_out: U256) -> U256 {
        let exchange = self.exchange.get_or_revert_with(NodeError::NodeNotBound);
        let this = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), token_in).approve(exchange, amount_in);
        let amount_out = ExchangeContractRef::new(self.env(), exchange)
            .swap(token_in, amount_in, token_out, min_amount_out, this);
        if amount_out < min_amount_out {
            self.env().revert(NodeError::SlippageExceeded);
        }
        amount_out
    }

    /// Park freshly posted collateral in the yield vault; false when it stays in the node
    fn park_collateral(&mut self, token: Address, amount: U256) -> bool {
        if self.collateral_locked.get_or_default() {
            return false;
        }
        let Some(vault) = self.yield_vault.get_or_default() else {
            return false;
        };
        Cep18TokenContractRef::new(self.env(), token).approve(vault, amount);
        if !YieldVaultContractRef::new(self.env(), vault).deposit(token, amount) {
            self.env().revert(NodeError::CollateralDepositFailed);
        }
        let parked = self.vault_principal.get(&token).unwrap_or_default();
        self.vault_principal.set(&token, parked + amount);
        true
    }

    /// Bring a loan's collateral back into the node and stop owing it; returns the amount recovered
    fn release_collateral(&mut self, loan: &Loan) -> U256 {
        let Some(token) = loan.collateral_token else {
            return U256::zero();
        };
        let recovered = if loan.collateral_in_vault {
            let vault = self
                .yield_vault
                .get_or_default()
                .unwrap_or_revert_with(&self.env(), NodeError::NoYieldVault);
            let parked = self.vault_principal.get(&token).unwrap_or_default();
            self.vault_principal.set(&token, parked.saturating_sub(loan.collateral_amount));
            YieldVaultContractRef::new(self.env(), vault).withdraw(token, loan.collateral_amount)
        } else {
            loan.collateral_amount
        };
        let owed = self.collateral_owed(token);
        self.collateral_owed.set(&token, owed.saturating_sub(loan.collateral_amount));
        recovered
    }

    fn cancel_request(&mut self, mut loan: Loan) {
        let returned = self.release_collateral(&loan);
        if let Some(token) = loan.collateral_token {
            self.push(token, loan.borrower, returned);
        }
        loan.status = LoanStatus::Cancelled;

        let timestamp = self.env().get_block_time();
        self.env().emit_event(LoanCancelled {
            loan_id: loan.id,
            borrower: loan.borrower,
            collateral_returned: returned,
            timestamp,
        });
        self.loans.set(&loan.id, loan);
    }

    /// Book a received installment; returns the interest withheld as fees
    fn settle_installment(&mut self, loan: &mut Loan, installment: Installment) -> U256 {
        let withheld = self.checked(SafeMath::bps(installment.interest, INTEREST_WITHHELD_BPS));
        let to_pool = installment.interest - withheld;

        self.liquid_balance
            .set(self.liquid_balance() + installment.principal + to_pool);
        self.fee_balance.set(self.fee_balance() + withheld);
        self.accounts_receivable
            .set(self.accounts_receivable() - installment.principal);
        loan.outstanding_principal = loan.outstanding_principal - installment.principal;
        withheld
    }

    fn close_repaid(&mut self, mut loan: Loan) {
        loan.status = LoanStatus::Repaid;
        self.current_loans.remove(loan.id);
        let returned = self.release_collateral(&loan);
        if let Some(token) = loan.collateral_token {
            self.push(token, loan.borrower, returned);
        }

        let timestamp = self.env().get_block_time();
        self.env().emit_event(LoanRepaid {
            loan_id: loan.id,
            borrower: loan.borrower,
            timestamp,
        });
        self.loans.set(&loan.id, loan);
    }

    /// Seize `loss / value_before` of both active and unbonding bond into the slashing balance
    fn apply_slash(&mut self, loss: U256, value_before: U256) -> U256 {
        if loss.is_zero() || value_before.is_zero() {
            return U256::zero();
        }
        let staked = self.total_staked_bond();
        let unbonding = self.unbonding_amount();
        let from_staked = self
            .checked(SafeMath::mul_div(staked, loss, value_before))
            .min(staked);
        let from_unbonding = self
            .checked(SafeMath::mul_div(unbonding, loss, value_before))
            .min(unbonding);

        self.total_staked_bond.set(staked - from_staked);
        self.unbonding_amount.set(unbonding - from_unbonding);
        if from_staked == staked {
            self.retire_staking_shares();
        }
        if from_unbonding == unbonding {
            self.retire_unbonding_shares();
        }
        let seized = from_staked + from_unbonding;
        self.slashing_balance.set(self.slashing_balance() + seized);
        seized
    }

    /// Start a new staking epoch once the staked pool holds no bond
    fn retire_staking_shares(&mut self) {
        let retired = self.total_staking_shares();
        if retired.is_zero() {
            return;
        }
        let epoch = self.staking_epoch.get_or_default() + 1;
        self.staking_epoch.set(epoch);
        self.total_staking_shares.set(U256::zero());
        self.emit_pool_wiped(false, retired, epoch);
    }

    /// Start a new unbonding epoch once the unbonding pool holds no bond
    fn retire_unbonding_shares(&mut self) {
        let retired = self.total_unbonding_shares();
        if retired.is_zero() {
            return;
        }
        let epoch = self.unbonding_epoch.get_or_default() + 1;
        self.unbonding_epoch.set(epoch);
        self.total_unbonding_shares.set(U256::zero());
        self.emit_pool_wiped(true, retired, epoch);
    }

    fn emit_pool_wiped(&self, unbonding: bool, retired_shares: U256, epoch: u32) {
        let timestamp = self.env().get_block_time();
        self.env().emit_event(BondPoolWipedOut {
            unbonding,
            retired_shares,
            epoch,
            timestamp,
        });
    }

    /// Pay the operator its cut of `amount` in base asset; buy bond for stakers with the rest
    fn distribute_fees(&mut self, amount: U256) {
        let base_asset = self.base_asset();
        let bond_token = self.bond_token();
        let operator = self.operator();

        let operator_amount = if self.total_staked_bond().is_zero() {
            amount
        } else {
            self.checked(SafeMath::bps(amount, OPERATOR_FEE_SHARE_BPS))
        };
        let staker_amount = amount - operator_amount;
        self.push(base_asset, operator, operator_amount);

        let bond_bought = if staker_amount.is_zero() {
            U256::zero()
        } else {
            self.swap(base_asset, staker_amount, bond_token, U256::zero())
        };
        self.total_staked_bond.set(self.total_staked_bond() + bond_bought);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(FeesCollected {
            operator_amount,
            staker_amount,
            bond_bought,
            timestamp,
        });
    }

    /// Reentrancy lock
    fn lock(&mut self) {
        if self.locked.get_or_default() {
            self.env().revert(NodeError::Locked);
        }
        self.locked.set(true);
    }

    fn unlock(&mut self) {
        self.locked.set(false);
    }
}
