//! Progress service: the persistence-aware face of the reward engine.
//!
//! Wraps the pure functions in [`crate::domain::rewards`] with tier lookup
//! and user persistence so callers award XP in one step.

use std::sync::Arc;

use crate::domain::ports::{
    RewardPersistenceError, RewardTierRepository, UserPersistenceError, UserRepository,
};
use crate::domain::rewards::{self, RewardTier, TierProgress};
use crate::domain::user::User;
use crate::domain::Error;

/// XP and level after an award, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// New XP total.
    pub xp: u32,
    /// New derived level.
    pub level: u32,
}

/// Awards XP and reports tier progress.
#[derive(Clone)]
pub struct ProgressService {
    users: Arc<dyn UserRepository>,
    tiers: Arc<dyn RewardTierRepository>,
}

pub(crate) fn map_reward_error(error: RewardPersistenceError) -> Error {
    match error {
        RewardPersistenceError::Connection { message } => Error::service_unavailable(message),
        RewardPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => Error::conflict("email is already registered"),
    }
}

impl ProgressService {
    /// Create the service over the user and tier repositories.
    pub fn new(users: Arc<dyn UserRepository>, tiers: Arc<dyn RewardTierRepository>) -> Self {
        Self { users, tiers }
    }

    /// The tier ladder, ascending by threshold.
    pub async fn tier_list(&self) -> Result<Vec<RewardTier>, Error> {
        self.tiers.list_ascending().await.map_err(map_reward_error)
    }

    /// Add `amount` XP to the user, recompute the level, and persist both.
    ///
    /// Awards of zero are a no-op that still reports the current standing.
    pub async fn add_xp(&self, user: &User, amount: u32) -> Result<ProgressUpdate, Error> {
        let xp = user.xp.saturating_add(amount);
        if amount == 0 {
            return Ok(ProgressUpdate {
                xp,
                level: user.level,
            });
        }
        let tiers = self.tier_list().await?;
        let level = rewards::level_for(xp, &tiers);
        self.users
            .store_progress(&user.id, xp, level)
            .await
            .map_err(map_user_error)?;
        Ok(ProgressUpdate { xp, level })
    }

    /// Tier progress for an XP total.
    pub async fn progress(&self, xp: u32) -> Result<TierProgress, Error> {
        let tiers = self.tier_list().await?;
        Ok(rewards::progress_for(xp, tiers))
    }
}
