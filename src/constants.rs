//! Protocol-wide economic parameters

/// Basis-point denominator (100% = 10_000)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Share of loan principal paid to the treasury on approval (0.5%)
pub const TREASURY_FEE_BPS: u64 = 50;

/// Share of loan principal paid to the loan agent on approval (0.25%)
pub const AGENT_FEE_BPS: u64 = 25;

/// Share of every interest payment withheld into the node fee balance (30%)
pub const INTEREST_WITHHELD_BPS: u64 = 3_000;

/// Share of collected fees paid straight to the operator; the rest buys bond for stakers
pub const OPERATOR_FEE_SHARE_BPS: u64 = 3_333;

/// Length of a 365-day year in milliseconds of block time
pub const YEAR_MS: u64 = 31_536_000_000;

/// Cooldown between initiating an unstake and claiming it (7 days)
pub const UNBONDING_PERIOD_MS: u64 = 604_800_000;

/// Block time ticks per second
pub const MS_PER_SECOND: u64 = 1_000;

/// Bond an operator must lock to create a node (2,000,000 tokens at 18 decimals)
pub const DEFAULT_BOND_REQUIREMENT: u128 = 2_000_000 * 1_000_000_000_000_000_000;
