//! Repository trait for derived positions.

use async_trait::async_trait;

use super::positions_model::Position;
use crate::errors::Result;

#[async_trait]
pub trait PositionRepositoryTrait: Send + Sync {
    /// The stored position for one symbol, if any.
    fn get_position(&self, account_id: &str, symbol: &str) -> Result<Option<Position>>;

    /// All stored positions for an account.
    fn list_positions(&self, account_id: &str) -> Result<Vec<Position>>;

    /// Replaces the stored position wholesale. Positions are derived state;
    /// there is no partial update path.
    async fn save_position(&self, position: &Position) -> Result<()>;

    /// Removes the stored position for a symbol.
    async fn delete_position(&self, account_id: &str, symbol: &str) -> Result<()>;
}
