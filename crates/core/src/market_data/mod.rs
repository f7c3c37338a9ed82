pub mod market_data_model;
pub mod market_data_traits;
pub mod price_book;

#[cfg(test)]
mod price_book_tests;

pub use market_data_model::Quote;
pub use market_data_traits::{PriceHistoryProviderTrait, QuoteRepositoryTrait};
pub use price_book::PriceBook;
