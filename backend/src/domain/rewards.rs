//! Reward engine: tier thresholds, level recomputation, and progress.
//!
//! Levels and progress are pure functions of a user's XP and the ordered
//! tier list, so they live here as free functions; persistence of the
//! recomputed values is the calling service's job.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable reward-tier identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardTierId(Uuid);

impl RewardTierId {
    /// Generate a new random [`RewardTierId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RewardTierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named reward level unlocked at a fixed XP threshold.
///
/// ## Invariants
/// - Thresholds across the stored tier list are distinct and the list is
///   always consumed sorted ascending by `threshold_xp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTier {
    /// Stable identifier.
    pub id: RewardTierId,
    /// Display name, e.g. `Silver`.
    pub name: String,
    /// XP required to reach this tier.
    pub threshold_xp: u32,
}

impl RewardTier {
    /// Build a new tier with a fresh identifier.
    pub fn new(name: impl Into<String>, threshold_xp: u32) -> Self {
        Self {
            id: RewardTierId::random(),
            name: name.into(),
            threshold_xp,
        }
    }
}

/// XP awarded for submitting a tip while identified.
pub const XP_PER_TIP: u32 = 10;
/// XP awarded for a review carrying a non-blank comment.
pub const XP_PER_REVIEW_COMMENT: u32 = 5;
/// XP awarded for a review carrying a photo.
pub const XP_PER_REVIEW_PHOTO: u32 = 5;

/// A user's position within the tier ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierProgress {
    /// All tiers, ascending by threshold.
    pub tiers: Vec<RewardTier>,
    /// Last tier whose threshold the XP has reached, if any.
    pub current: Option<RewardTier>,
    /// First tier whose threshold lies above the XP, if any.
    pub next: Option<RewardTier>,
    /// Percentage of the span between current and next tier, in `0..=100`.
    ///
    /// 100 exactly when there is no next tier (all thresholds reached, or
    /// the tier list is empty).
    pub progress_pct: u8,
}

/// Compute the 1-based level for the given XP.
///
/// The level is the index of the last tier whose `threshold_xp <= xp`; users
/// below every threshold (or with no tiers configured) sit at level 1.
/// Because the list is ascending, the level never decreases as XP grows.
pub fn level_for(xp: u32, tiers: &[RewardTier]) -> u32 {
    let reached = tiers.iter().filter(|t| t.threshold_xp <= xp).count();
    u32::try_from(reached.max(1)).unwrap_or(u32::MAX)
}

/// Compute the tier progress for the given XP.
///
/// With no next tier the progress is 100. Otherwise the percentage of the
/// span between the current tier's threshold (0 when no tier is reached yet)
/// and the next tier's threshold, floored, which keeps it in `0..100`.
pub fn progress_for(xp: u32, tiers: Vec<RewardTier>) -> TierProgress {
    let current = tiers
        .iter()
        .filter(|t| t.threshold_xp <= xp)
        .next_back()
        .cloned();
    let next = tiers.iter().find(|t| t.threshold_xp > xp).cloned();

    let progress_pct = match &next {
        None => 100,
        Some(next_tier) => {
            let baseline = current.as_ref().map_or(0, |t| t.threshold_xp);
            let span = u64::from(next_tier.threshold_xp.saturating_sub(baseline)).max(1);
            let gained = u64::from(xp.saturating_sub(baseline));
            #[expect(
                clippy::integer_division,
                reason = "progress is defined as a floored percentage"
            )]
            let pct = (100 * gained) / span;
            u8::try_from(pct.min(99)).unwrap_or(99)
        }
    };

    TierProgress {
        tiers,
        current,
        next,
        progress_pct,
    }
}
