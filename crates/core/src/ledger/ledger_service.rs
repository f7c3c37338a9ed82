use log::{debug, warn};
use std::sync::Arc;

use super::ledger_model::{NewTransaction, Transaction};
use super::ledger_traits::TransactionRepositoryTrait;
use crate::errors::Result;
use crate::positions::accountant;
use crate::positions::positions_model::{AssetKind, Position};
use crate::positions::positions_traits::PositionRepositoryTrait;

/// Mutation path for the append-only ledger.
///
/// Every mutation replays the affected symbol's full log *before* anything
/// is persisted, so a transaction that would corrupt the position (for
/// example a retroactive oversell) is rejected with no state change.
pub struct LedgerService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    position_repository: Arc<dyn PositionRepositoryTrait>,
}

impl LedgerService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        position_repository: Arc<dyn PositionRepositoryTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            position_repository,
        }
    }

    /// Appends a transaction and returns the freshly derived position.
    ///
    /// The candidate ledger (existing rows plus the new one) is replayed
    /// first; a replay failure aborts before anything is written.
    pub async fn record_transaction(
        &self,
        new_transaction: NewTransaction,
        asset_kind: AssetKind,
    ) -> Result<Position> {
        let transaction = new_transaction.into_transaction();
        transaction.validate()?;

        let mut candidate_ledger = self
            .transaction_repository
            .get_transactions_for_symbol(&transaction.account_id, &transaction.symbol)?;
        candidate_ledger.push(transaction.clone());

        let position = accountant::replay(
            &transaction.account_id,
            &transaction.symbol,
            asset_kind,
            &candidate_ledger,
        )?;

        self.transaction_repository
            .insert_transaction(&transaction)
            .await?;
        self.position_repository.save_position(&position).await?;

        debug!(
            "Recorded {} {} x {} for {}/{}",
            transaction.kind,
            transaction.quantity,
            transaction.symbol,
            transaction.account_id,
            transaction.symbol
        );
        Ok(position)
    }

    /// Deletes a transaction and returns the re-derived position, or `None`
    /// when the symbol has no remaining history.
    ///
    /// The remaining ledger is replayed before the delete is persisted;
    /// a deletion that would cause a retroactive oversell (removing a buy
    /// that later sells depend on) is rejected with no state change.
    pub async fn delete_transaction(&self, transaction_id: &str) -> Result<Option<Position>> {
        let target = self.transaction_repository.get_transaction(transaction_id)?;

        let remaining: Vec<Transaction> = self
            .transaction_repository
            .get_transactions_for_symbol(&target.account_id, &target.symbol)?
            .into_iter()
            .filter(|transaction| transaction.id != target.id)
            .collect();

        if remaining.is_empty() {
            self.transaction_repository
                .delete_transaction(transaction_id)
                .await?;
            self.position_repository
                .delete_position(&target.account_id, &target.symbol)
                .await?;
            warn!(
                "Deleted last transaction for {}/{}; position removed",
                target.account_id, target.symbol
            );
            return Ok(None);
        }

        let asset_kind = self
            .position_repository
            .get_position(&target.account_id, &target.symbol)?
            .map(|position| position.kind)
            .unwrap_or(AssetKind::Equity);

        let position =
            accountant::replay(&target.account_id, &target.symbol, asset_kind, &remaining)?;

        self.transaction_repository
            .delete_transaction(transaction_id)
            .await?;
        self.position_repository.save_position(&position).await?;

        Ok(Some(position))
    }
}
