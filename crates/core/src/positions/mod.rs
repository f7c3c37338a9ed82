pub mod accountant;
pub mod positions_model;
pub mod positions_traits;


pub use accountant::replay;
pub use positions_model::{is_quantity_significant, AssetKind, Position, TaxLot};
pub use positions_traits::PositionRepositoryTrait;
