pub mod model;
pub mod repository;

pub use model::TransactionDB;
pub use repository::TransactionRepository;
