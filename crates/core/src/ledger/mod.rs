pub mod ledger_model;
pub mod ledger_service;
pub mod ledger_traits;

#[cfg(test)]
mod ledger_service_tests;

pub use ledger_model::{NewTransaction, Transaction, TransactionKind};
pub use ledger_service::LedgerService;
pub use ledger_traits::TransactionRepositoryTrait;
