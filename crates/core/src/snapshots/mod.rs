pub mod replay;
pub mod snapshots_model;
pub mod snapshots_service;
pub mod snapshots_traits;


pub use replay::ReplayState;
pub use snapshots_model::DailySnapshot;
pub use snapshots_service::{SnapshotService, SnapshotServiceTrait};
pub use snapshots_traits::SnapshotRepositoryTrait;
