//! Restaurants, their staff roster, and dashboard memberships.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Stable restaurant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(Uuid);

impl RestaurantId {
    /// Generate a new random [`RestaurantId`].
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

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable staff-member identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(Uuid);

impl StaffId {
    /// Generate a new random [`StaffId`].
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

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A restaurant reachable through its public tipping link.
#[derive(Debug, Clone, PartialEq)]
pub struct Restaurant {
    /// Stable identifier.
    pub id: RestaurantId,
    /// Unique URL slug, e.g. `cafe-luna`.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Stored logo image name, servable under `/uploads/{name}`.
    pub logo_image: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    /// Build a new restaurant with a fresh identifier.
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RestaurantId::random(),
            slug: slug.into(),
            name: name.into(),
            logo_image: None,
            created_at: Utc::now(),
        }
    }
}

/// A tippable member of a restaurant's roster.
///
/// `rating_avg` and `tips_count` are denormalised aggregates refreshed after
/// each review; they exist so the public roster renders without touching the
/// activity tables.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffMember {
    /// Stable identifier.
    pub id: StaffId,
    /// Owning restaurant.
    pub restaurant_id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Optional role label, e.g. `Barista`.
    pub role: Option<String>,
    /// Stored avatar image name.
    pub avatar_image: Option<String>,
    /// Optional short biography shown on the tip page.
    pub bio: Option<String>,
    /// Mean review rating; 0 when unreviewed.
    pub rating_avg: f64,
    /// Count of tips addressed to this member.
    pub tips_count: u32,
    /// Soft-delete flag; inactive staff are hidden from public pages.
    pub active: bool,
}

impl StaffMember {
    /// Build a new active staff member with a fresh identifier.
    pub fn new(restaurant_id: RestaurantId, name: impl Into<String>) -> Self {
        Self {
            id: StaffId::random(),
            restaurant_id,
            name: name.into(),
            role: None,
            avatar_image: None,
            bio: None,
            rating_avg: 0.0,
            tips_count: 0,
            active: true,
        }
    }
}

/// Role a membership grants over its restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    /// Full dashboard access, including payouts and coupons.
    Admin,
    /// Same dashboard access as admin; separate label for reporting.
    Manager,
    /// A staff member's own account.
    Staff,
    /// Ordinary loyalty-programme member.
    User,
}

impl MembershipRole {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
            Self::User => "user",
        }
    }

    /// Parse the storage representation; unknown values map to [`Self::User`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Self::Admin,
            "manager" => Self::Manager,
            "staff" => Self::Staff,
            _ => Self::User,
        }
    }

    /// Whether this role grants dashboard administration.
    pub fn grants_dashboard(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

/// Link between a user and a restaurant carrying a [`MembershipRole`].
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    /// Stable identifier.
    pub id: Uuid,
    /// Member account.
    pub user_id: UserId,
    /// Restaurant the role applies to.
    pub restaurant_id: RestaurantId,
    /// Granted role.
    pub role: MembershipRole,
}

impl Membership {
    /// Build a new membership with a fresh identifier.
    pub fn new(user_id: UserId, restaurant_id: RestaurantId, role: MembershipRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            restaurant_id,
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MembershipRole::Admin, true)]
    #[case(MembershipRole::Manager, true)]
    #[case(MembershipRole::Staff, false)]
    #[case(MembershipRole::User, false)]
    fn dashboard_grant_follows_role(#[case] role: MembershipRole, #[case] granted: bool) {
        assert_eq!(role.grants_dashboard(), granted);
    }

    #[rstest]
    #[case("admin", MembershipRole::Admin)]
    #[case("manager", MembershipRole::Manager)]
    #[case("staff", MembershipRole::Staff)]
    #[case("user", MembershipRole::User)]
    #[case("unknown-role", MembershipRole::User)]
    fn role_round_trips_storage_representation(#[case] raw: &str, #[case] role: MembershipRole) {
        assert_eq!(MembershipRole::parse(raw), role);
        if raw != "unknown-role" {
            assert_eq!(role.as_str(), raw);
        }
    }

    #[rstest]
    fn new_staff_member_starts_active_and_unrated() {
        let member = StaffMember::new(RestaurantId::random(), "Mia");
        assert!(member.active);
        assert_eq!(member.tips_count, 0);
        assert_eq!(member.rating_avg, 0.0);
    }
}
