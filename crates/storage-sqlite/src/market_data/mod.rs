pub mod model;
pub mod repository;

pub use model::QuoteDB;
pub use repository::QuoteRepository;
