//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    coupon_redemptions, coupons, media, memberships, restaurants, reviews, reward_tiers, staff,
    tips, transfers, users,
};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub password_digest: Option<String>,
    pub display_name: String,
    pub device_fingerprint: Option<String>,
    pub xp: i32,
    pub level: i32,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: Option<&'a str>,
    pub password_digest: Option<&'a str>,
    pub display_name: &'a str,
    pub device_fingerprint: Option<&'a str>,
    pub xp: i32,
    pub level: i32,
}

/// Row struct for reading from the restaurants table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RestaurantRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub logo_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new restaurant records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = restaurants)]
pub(crate) struct NewRestaurantRow<'a> {
    pub id: Uuid,
    pub slug: &'a str,
    pub name: &'a str,
    pub logo_image: Option<&'a str>,
}

/// Row struct for reading from the staff table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = staff)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StaffRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub role: Option<String>,
    pub avatar_image: Option<String>,
    pub bio: Option<String>,
    pub rating_avg: f64,
    pub tips_count: i32,
    pub active: bool,
}

/// Insertable struct for creating new staff records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = staff)]
pub(crate) struct NewStaffRow<'a> {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: &'a str,
    pub role: Option<&'a str>,
    pub avatar_image: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub rating_avg: f64,
    pub tips_count: i32,
    pub active: bool,
}

/// Changeset struct for updating staff records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = staff)]
pub(crate) struct StaffUpdate<'a> {
    pub name: &'a str,
    pub role: Option<&'a str>,
    pub avatar_image: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub active: bool,
}

/// Insertable struct for creating membership records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = memberships)]
pub(crate) struct NewMembershipRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub role: &'a str,
}

/// Row struct for reading from the tips table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tips)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TipRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub amount_cents: i32,
    pub method_ui: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating tip records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tips)]
pub(crate) struct NewTipRow<'a> {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub amount_cents: i32,
    pub method_ui: &'a str,
    pub status: &'a str,
}

/// Row struct for reading from the reviews table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub share_allowed: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating review records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub(crate) struct NewReviewRow<'a> {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<&'a str>,
    pub share_allowed: bool,
}

/// Row struct for reading from the media table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = media)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MediaRow {
    pub id: Uuid,
    pub review_id: Uuid,
    pub image_name: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Insertable struct for attaching media to a review.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = media)]
pub(crate) struct NewMediaRow<'a> {
    pub id: Uuid,
    pub review_id: Uuid,
    pub image_name: &'a str,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Row struct for reading from the reward_tiers table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reward_tiers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RewardTierRow {
    pub id: Uuid,
    pub name: String,
    pub threshold_xp: i32,
}

/// Insertable struct for creating reward tiers.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reward_tiers)]
pub(crate) struct NewRewardTierRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub threshold_xp: i32,
}

/// Row struct for reading from the coupons table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CouponRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub required_xp: i32,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating coupons.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coupons)]
pub(crate) struct NewCouponRow<'a> {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub required_xp: i32,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Changeset struct for updating coupons.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = coupons)]
pub(crate) struct CouponUpdate<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub required_xp: i32,
    pub active: bool,
}

/// Row struct for reading from the coupon_redemptions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coupon_redemptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RedemptionRow {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating redemptions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coupon_redemptions)]
pub(crate) struct NewRedemptionRow<'a> {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: Uuid,
    pub code: &'a str,
    pub status: &'a str,
}

/// Row struct for reading from the transfers table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transfers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransferRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub amount_cents: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating transfers.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transfers)]
pub(crate) struct NewTransferRow<'a> {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub amount_cents: i32,
    pub status: &'a str,
}
