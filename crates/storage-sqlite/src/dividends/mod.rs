pub mod model;
pub mod repository;

pub use model::DividendEventDB;
pub use repository::DividendRepository;
