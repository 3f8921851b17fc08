//! Lending nodes - one pooled lending vault per operator and base asset
//!
//! A node is deployed unbound and handed to the registry, which binds it to
//! its operator, base asset and bond.

pub mod lending_node;
pub mod loan;
pub mod loan_set;
pub mod errors;
pub mod events;


pub use lending_node::{LendingNode, LendingNodeContractRef};
pub use loan::{Installment, Loan, LoanStatus};
pub use loan_set::LoanIdSet;
pub use errors::NodeError;
pub use events::*;
