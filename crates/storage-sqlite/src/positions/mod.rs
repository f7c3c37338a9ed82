pub mod model;
pub mod repository;

pub use model::PositionDB;
pub use repository::PositionRepository;
