//! Domain primitives, aggregates, ports, and services.
//!
//! Purpose: strongly typed entities for the tipping and loyalty programme,
//! the ports adapters implement, and the services the API drives. Keep
//! invariants documented in each type's Rustdoc; transport concerns stay in
//! the API layer and storage concerns in the outbound adapters.

pub mod activity;
pub mod coupons;
pub mod error;
pub mod ports;
pub mod reporting;
pub mod restaurant;
pub mod rewards;
pub mod user;

pub mod accounts_service;
pub mod coupons_service;
pub mod merge_service;
pub mod profile_service;
pub mod progress_service;
pub mod reporting_service;
pub mod reviews_service;
pub mod tipping_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::error::{Error, ErrorCode};
pub use self::restaurant::{RestaurantId, StaffId};
pub use self::user::{Actor, UserId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<u32> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
