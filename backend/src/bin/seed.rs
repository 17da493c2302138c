//! Demo seed: one restaurant, its roster, the tier ladder, and coupons.
//!
//! Run with `DATABASE_URL` set. Seeding is skipped when the demo
//! restaurant already exists, so the binary is safe to re-run.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use backend::domain::accounts_service::AccountsService;
use backend::domain::activity::{NewReview, NewTip};
use backend::domain::coupons::Coupon;
use backend::domain::ports::{ActivityRepository, RestaurantRepository};
use backend::domain::restaurant::{Membership, MembershipRole, Restaurant, StaffMember};
use backend::domain::rewards::RewardTier;
use backend::outbound::persistence::{
    run_schema_bootstrap, DbPool, DieselActivityRepository, DieselCouponRepository,
    DieselRestaurantRepository, DieselRewardTierRepository, DieselUserRepository, PoolConfig,
};

const DEMO_SLUG: &str = "cafe-luna";
const DEMO_PASSWORD: &str = "demo123";

const TIERS: &[(&str, u32)] = &[
    ("Bronze", 0),
    ("Silver", 100),
    ("Gold", 250),
    ("Platinum", 500),
    ("Diamond", 1000),
    ("Master", 2000),
];

const ROSTER: &[(&str, &str, &str)] = &[
    ("Mia", "Barista", "Latte art specialist and single-origin coffee lover."),
    ("Jake", "Barista", "Espresso perfectionist; try his cappuccino."),
    ("Tess", "Server", "Always smiling; she'll make your visit delightful."),
    ("Leo", "Cook", "Creative chef; responsible for daily specials."),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        warn!(error = %e, "tracing init failed");
    }

    let database_url = std::env::var("DATABASE_URL")?;
    run_schema_bootstrap(&database_url)?;

    let pool = DbPool::new(PoolConfig::new(&database_url)).await?;
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let tiers = DieselRewardTierRepository::new(pool.clone());
    let restaurants = DieselRestaurantRepository::new(pool.clone());
    let activity = DieselActivityRepository::new(pool.clone());
    let coupons = DieselCouponRepository::new(pool);
    let accounts = AccountsService::new(users);

    if restaurants.find_by_slug(DEMO_SLUG).await?.is_some() {
        info!(slug = DEMO_SLUG, "demo restaurant already present, nothing to do");
        return Ok(());
    }

    use backend::domain::ports::RewardTierRepository;
    for (name, threshold) in TIERS {
        tiers.insert(&RewardTier::new(*name, *threshold)).await?;
    }

    let restaurant = Restaurant::new(DEMO_SLUG, "Cafe Luna");
    restaurants.insert(&restaurant).await?;

    let mut roster = Vec::new();
    for (name, role, bio) in ROSTER {
        let mut member = StaffMember::new(restaurant.id, *name);
        member.role = Some((*role).to_owned());
        member.bio = Some((*bio).to_owned());
        restaurants.insert_staff(&member).await?;
        roster.push(member);
    }

    let admin = accounts
        .register("admin@demo.com", DEMO_PASSWORD, "Admin")
        .await?;
    restaurants
        .insert_membership(&Membership::new(
            admin.id,
            restaurant.id,
            MembershipRole::Admin,
        ))
        .await?;

    let mia = accounts
        .register("mia@demo.com", DEMO_PASSWORD, "Mia")
        .await?;
    restaurants
        .insert_membership(&Membership::new(
            mia.id,
            restaurant.id,
            MembershipRole::Staff,
        ))
        .await?;

    let amounts = [200, 300, 500, 700, 1000];
    let methods = ["apple_pay", "google_pay", "paypal"];
    let comments = ["Excellent", "Very good", "Great coffee", "Friendly service"];

    // Pick the random demo data up front; the RNG handle is not Send.
    let (tip_specs, review_specs) = {
        let mut rng = rand::thread_rng();
        let tips: Vec<NewTip> = (0..20)
            .map(|_| NewTip {
                restaurant_id: restaurant.id,
                staff_id: roster.choose(&mut rng).map(|m| m.id),
                user_id: None,
                amount_cents: *amounts.choose(&mut rng).unwrap_or(&500),
                method_ui: (*methods.choose(&mut rng).unwrap_or(&"apple_pay")).to_owned(),
            })
            .collect();
        let reviews: Vec<NewReview> = (0..10)
            .map(|_| NewReview {
                restaurant_id: restaurant.id,
                staff_id: roster.choose(&mut rng).map(|m| m.id),
                user_id: None,
                rating: rng.gen_range(4..=5),
                comment: Some((*comments.choose(&mut rng).unwrap_or(&"Excellent")).to_owned()),
                share_allowed: false,
                media: None,
            })
            .collect();
        (tips, reviews)
    };

    for spec in &tip_specs {
        activity.insert_tip(spec).await?;
    }
    for spec in &review_specs {
        activity.insert_review(spec).await?;
    }

    for member in &roster {
        activity.refresh_staff_aggregates(&member.id).await?;
    }

    use backend::domain::ports::CouponRepository;
    let catalogue = [
        ("Free Coffee", "1 free drink (small)", 100),
        ("2-for-1 Latte", "Valid Mon-Thu", 250),
        ("Free Merch", "Limited edition tote bag", 500),
    ];
    for (title, description, required_xp) in catalogue {
        let mut coupon = Coupon::new(restaurant.id, title, required_xp);
        coupon.description = Some(description.to_owned());
        coupons.insert(&coupon).await?;
    }

    info!(slug = DEMO_SLUG, "seed complete");
    Ok(())
}
