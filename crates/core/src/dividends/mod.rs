pub mod dividends_model;
pub mod dividends_service;
pub mod dividends_traits;
pub mod refresh_worker;

#[cfg(test)]
mod dividends_service_tests;

pub use dividends_model::{
    DividendEvent, DividendSummary, MonthlyIncome, PaymentDatePolicy, ProvisionedDividend,
    SymbolIncome,
};
pub use dividends_service::{DividendService, DividendServiceTrait};
pub use dividends_traits::{DividendProviderTrait, DividendRepositoryTrait};
pub use refresh_worker::{spawn_refresh_worker, RefreshConfig, RefreshHandle};
