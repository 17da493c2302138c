//! Identity merge: fold a guest's activity and XP into an authenticated
//! account.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{ActivityRepository, MergeOutcome, MergePlan, UserRepository};
use crate::domain::progress_service::ProgressService;
use crate::domain::rewards;
use crate::domain::tipping_service::map_activity_error;
use crate::domain::user::UserId;
use crate::domain::Error;

/// Result of a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    /// Guest and target were the same row; nothing changed.
    Noop,
    /// The merge committed.
    Merged {
        /// Counts of reassigned activity.
        outcome: MergeOutcome,
        /// Target XP after the merge.
        xp: u32,
        /// Target level after the merge.
        level: u32,
    },
}

/// Folds guest accounts into authenticated ones.
#[derive(Clone)]
pub struct MergeService {
    users: Arc<dyn UserRepository>,
    activity: Arc<dyn ActivityRepository>,
    progress: ProgressService,
}

fn map_user_error(error: crate::domain::ports::UserPersistenceError) -> Error {
    use crate::domain::ports::UserPersistenceError;
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => Error::conflict("email is already registered"),
    }
}

impl MergeService {
    /// Create the service over its ports.
    pub fn new(
        users: Arc<dyn UserRepository>,
        activity: Arc<dyn ActivityRepository>,
        progress: ProgressService,
    ) -> Self {
        Self {
            users,
            activity,
            progress,
        }
    }

    /// Merge `guest_id` into `target_id`.
    ///
    /// Same-row merges are a no-op. Otherwise every tip and review owned by
    /// the guest moves to the target, the target's XP grows by the guest's,
    /// the level is recomputed, and the guest row is deleted, atomically.
    /// A failed commit leaves everything untouched; callers simply retry.
    pub async fn merge(&self, guest_id: &UserId, target_id: &UserId) -> Result<MergeResult, Error> {
        if guest_id == target_id {
            return Ok(MergeResult::Noop);
        }

        let guest = self
            .users
            .find_by_id(guest_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("guest account not found"))?;
        let target = self
            .users
            .find_by_id(target_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("target account not found"))?;

        let merged_xp = target.xp.saturating_add(guest.xp);
        let tiers = self.progress.tier_list().await?;
        let merged_level = rewards::level_for(merged_xp, &tiers);

        let outcome = self
            .activity
            .apply_merge(&MergePlan {
                guest_id: guest.id,
                target_id: target.id,
                merged_xp,
                merged_level,
            })
            .await
            .map_err(map_activity_error)?;

        info!(
            guest = %guest.id,
            target = %target.id,
            tips_moved = outcome.tips_moved,
            reviews_moved = outcome.reviews_moved,
            "guest account merged"
        );

        Ok(MergeResult::Merged {
            outcome,
            xp: merged_xp,
            level: merged_level,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::test_support::InMemoryStore;
    use crate::domain::ErrorCode;

    fn service(store: &InMemoryStore) -> MergeService {
        MergeService::new(store.users(), store.activity(), store.progress_service())
    }

    #[tokio::test]
    async fn merge_moves_activity_and_sums_xp() {
        let store = InMemoryStore::with_demo_restaurant();
        store.add_tiers(&[("Bronze", 0), ("Silver", 100), ("Gold", 250)]);
        let guest = store.add_guest_with_xp("device-1", 80);
        let target = store.add_registered("ada@example.com", 120);
        store.add_tip_for(&guest.id, 500);
        store.add_tip_for(&guest.id, 300);
        store.add_review_for(&guest.id, 5);

        let result = service(&store)
            .merge(&guest.id, &target.id)
            .await
            .expect("merge succeeds");

        let MergeResult::Merged { outcome, xp, level } = result else {
            panic!("expected a merged result");
        };
        assert_eq!(outcome.tips_moved, 2);
        assert_eq!(outcome.reviews_moved, 1);
        assert_eq!(xp, 200);
        assert_eq!(level, 2);

        // Every fact previously owned by the guest now belongs to the target.
        assert_eq!(store.tips_owned_by(&guest.id), 0);
        assert_eq!(store.tips_owned_by(&target.id), 2);
        assert_eq!(store.reviews_owned_by(&target.id), 1);
        // The guest row is gone; the target carries the summed XP.
        assert!(store.try_user(&guest.id).is_none());
        assert_eq!(store.user_xp(&target.id), 200);
        assert_eq!(store.user(&target.id).level, 2);
    }

    #[tokio::test]
    async fn merging_a_user_into_itself_is_a_noop() {
        let store = InMemoryStore::with_demo_restaurant();
        let target = store.add_registered("ada@example.com", 70);
        store.add_tip_for(&target.id, 500);

        let result = service(&store)
            .merge(&target.id, &target.id)
            .await
            .expect("noop succeeds");

        assert_eq!(result, MergeResult::Noop);
        assert_eq!(store.user_xp(&target.id), 70);
        assert_eq!(store.tips_owned_by(&target.id), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_guest_is_not_found() {
        let store = InMemoryStore::with_demo_restaurant();
        let target = store.add_registered("ada@example.com", 0);

        let err = service(&store)
            .merge(&crate::domain::UserId::random(), &target.id)
            .await
            .expect_err("missing guest rejected");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn failed_commit_preserves_the_guest() {
        let store = InMemoryStore::with_demo_restaurant();
        let guest = store.add_guest_with_xp("device-1", 30);
        let target = store.add_registered("ada@example.com", 10);
        store.add_tip_for(&guest.id, 200);
        store.fail_next_merge();

        let err = service(&store)
            .merge(&guest.id, &target.id)
            .await
            .expect_err("commit failure surfaces");
        assert_eq!(err.code(), ErrorCode::InternalError);

        // Nothing moved, nothing deleted; the caller may retry from scratch.
        assert!(store.try_user(&guest.id).is_some());
        assert_eq!(store.tips_owned_by(&guest.id), 1);
        assert_eq!(store.user_xp(&target.id), 10);

        let retried = service(&store)
            .merge(&guest.id, &target.id)
            .await
            .expect("retry succeeds");
        assert!(matches!(retried, MergeResult::Merged { .. }));
        assert!(store.try_user(&guest.id).is_none());
    }

    #[tokio::test]
    async fn merge_with_empty_tier_list_keeps_level_one() {
        let store = InMemoryStore::with_demo_restaurant();
        let guest = store.add_guest_with_xp("device-1", 500);
        let target = store.add_registered("ada@example.com", 500);

        let result = service(&store)
            .merge(&guest.id, &target.id)
            .await
            .expect("merge succeeds");
        let MergeResult::Merged { level, .. } = result else {
            panic!("expected a merged result");
        };
        assert_eq!(level, 1);
    }
}
