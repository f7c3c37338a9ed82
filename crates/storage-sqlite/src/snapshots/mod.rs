pub mod model;
pub mod repository;

pub use model::DailySnapshotDB;
pub use repository::SnapshotRepository;
