//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation; regenerate with `diesel print-schema` after editing the
//! migrations.

diesel::table! {
    /// Accounts and guests; guests carry a device fingerprint instead of
    /// credentials.
    users (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Login email; NULL for guests. Unique.
        email -> Nullable<Varchar>,
        /// Salted password digest; NULL for guests.
        password_digest -> Nullable<Varchar>,
        /// Name shown on reviews and dashboards.
        display_name -> Varchar,
        /// SHA-256 hex fingerprint of the device cookie; NULL for accounts.
        device_fingerprint -> Nullable<Varchar>,
        /// Accrued experience points.
        xp -> Int4,
        /// Derived reward level (1-based).
        level -> Int4,
        /// Row creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Restaurants reachable through their public slug.
    restaurants (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Unique URL slug.
        slug -> Varchar,
        /// Display name.
        name -> Varchar,
        /// Stored logo image name.
        logo_image -> Nullable<Varchar>,
        /// Row creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tippable staff roster.
    staff (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Owning restaurant.
        restaurant_id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// Role label.
        role -> Nullable<Varchar>,
        /// Stored avatar image name.
        avatar_image -> Nullable<Varchar>,
        /// Short biography.
        bio -> Nullable<Text>,
        /// Denormalised mean review rating.
        rating_avg -> Float8,
        /// Denormalised tip count.
        tips_count -> Int4,
        /// Soft-delete flag.
        active -> Bool,
    }
}

diesel::table! {
    /// User-to-restaurant roles.
    memberships (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Member account.
        user_id -> Uuid,
        /// Restaurant the role applies to.
        restaurant_id -> Uuid,
        /// Granted role label.
        role -> Varchar,
    }
}

diesel::table! {
    /// Append-only tip facts.
    tips (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Restaurant the tip was left at.
        restaurant_id -> Uuid,
        /// Addressed staff member.
        staff_id -> Nullable<Uuid>,
        /// Owning user; reassigned only during identity merge.
        user_id -> Nullable<Uuid>,
        /// Amount in cents.
        amount_cents -> Int4,
        /// Payment-method label chosen in the UI.
        method_ui -> Text,
        /// Processing status.
        status -> Text,
        /// Submission timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only review facts.
    reviews (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Restaurant the review is about.
        restaurant_id -> Uuid,
        /// Reviewed staff member.
        staff_id -> Nullable<Uuid>,
        /// Owning user; reassigned only during identity merge.
        user_id -> Nullable<Uuid>,
        /// Rating, 1..=5.
        rating -> Int4,
        /// Free-text comment.
        comment -> Nullable<Text>,
        /// Public-sharing consent.
        share_allowed -> Bool,
        /// Submission timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One stored photo per review.
    media (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Owning review.
        review_id -> Uuid,
        /// Stored image name.
        image_name -> Text,
        /// Pixel width when known.
        width -> Nullable<Int4>,
        /// Pixel height when known.
        height -> Nullable<Int4>,
    }
}

diesel::table! {
    /// Global reward-tier ladder.
    reward_tiers (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// XP threshold; unique and non-negative.
        threshold_xp -> Int4,
    }
}

diesel::table! {
    /// XP-gated coupons per restaurant.
    coupons (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Offering restaurant.
        restaurant_id -> Uuid,
        /// Short title.
        title -> Varchar,
        /// Longer description.
        description -> Nullable<Text>,
        /// XP required to claim.
        required_xp -> Int4,
        /// Claimability flag.
        active -> Bool,
        /// Informational expiry.
        expires_at -> Nullable<Timestamptz>,
        /// Row creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Claimed coupon codes; the code column alone is unique.
    coupon_redemptions (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Claimed coupon.
        coupon_id -> Uuid,
        /// Claiming member.
        user_id -> Uuid,
        /// Unique redemption code.
        code -> Varchar,
        /// Lifecycle status.
        status -> Varchar,
        /// Claim timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recorded payout transfers.
    transfers (id) {
        /// Primary key: UUID v4.
        id -> Uuid,
        /// Paying restaurant.
        restaurant_id -> Uuid,
        /// Receiving staff member.
        staff_id -> Nullable<Uuid>,
        /// Amount in cents.
        amount_cents -> Int4,
        /// Processing status.
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(staff -> restaurants (restaurant_id));
diesel::joinable!(memberships -> restaurants (restaurant_id));
diesel::joinable!(memberships -> users (user_id));
diesel::joinable!(media -> reviews (review_id));
diesel::joinable!(coupons -> restaurants (restaurant_id));
diesel::joinable!(coupon_redemptions -> coupons (coupon_id));
diesel::joinable!(coupon_redemptions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    restaurants,
    staff,
    memberships,
    tips,
    reviews,
    media,
    reward_tiers,
    coupons,
    coupon_redemptions,
    transfers,
);
