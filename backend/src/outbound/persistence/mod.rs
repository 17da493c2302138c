//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via Diesel, with async support through `diesel-async` and
//! `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here; the
//!   one multi-statement operation (the identity merge) is a transaction
//!   whose inputs the domain computes up front.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are implementation details, never exposed to
//!   the domain layer.
//! - **Strongly typed errors**: all database failures are classified once
//!   (`diesel_helpers`) and mapped into the port error types.

pub mod bootstrap;
mod diesel_activity_repository;
mod diesel_coupon_repository;
pub(crate) mod diesel_helpers;
mod diesel_reporting_repository;
mod diesel_restaurant_repository;
mod diesel_reward_tier_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use bootstrap::{run_schema_bootstrap, BootstrapError};
pub use diesel_activity_repository::DieselActivityRepository;
pub use diesel_coupon_repository::DieselCouponRepository;
pub use diesel_reporting_repository::DieselReportingRepository;
pub use diesel_restaurant_repository::DieselRestaurantRepository;
pub use diesel_reward_tier_repository::DieselRewardTierRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
