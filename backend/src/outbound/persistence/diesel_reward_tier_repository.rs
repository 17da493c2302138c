//! PostgreSQL-backed `RewardTierRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RewardPersistenceError, RewardTierRepository};
use crate::domain::rewards::{RewardTier, RewardTierId};

use super::diesel_helpers::{classify, from_db_i32, to_db_i32, StoreFailure};
use super::models::{NewRewardTierRow, RewardTierRow};
use super::pool::{DbPool, PoolError};
use super::schema::reward_tiers;

/// Diesel-backed implementation of the `RewardTierRepository` port.
#[derive(Clone)]
pub struct DieselRewardTierRepository {
    pool: DbPool,
}

impl DieselRewardTierRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RewardPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RewardPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> RewardPersistenceError {
    match classify(error) {
        StoreFailure::Connection(message) => RewardPersistenceError::connection(message),
        StoreFailure::UniqueViolation(constraint) => {
            RewardPersistenceError::query(format!("unique constraint violated: {constraint}"))
        }
        StoreFailure::Query(message) => RewardPersistenceError::query(message),
    }
}

fn row_to_tier(row: RewardTierRow) -> RewardTier {
    RewardTier {
        id: RewardTierId::from_uuid(row.id),
        name: row.name,
        threshold_xp: from_db_i32(row.threshold_xp),
    }
}

#[async_trait]
impl RewardTierRepository for DieselRewardTierRepository {
    async fn list_ascending(&self) -> Result<Vec<RewardTier>, RewardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<RewardTierRow> = reward_tiers::table
            .order(reward_tiers::threshold_xp.asc())
            .select(RewardTierRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_tier).collect())
    }

    async fn insert(&self, tier: &RewardTier) -> Result<(), RewardPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(reward_tiers::table)
            .values(&NewRewardTierRow {
                id: *tier.id.as_uuid(),
                name: &tier.name,
                threshold_xp: to_db_i32(tier.threshold_xp),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
