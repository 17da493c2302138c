//! Shared Diesel error classification for the adapters.
//!
//! Adapters translate [`StoreFailure`] into their port's error enum so the
//! match over Diesel's error surface lives in one place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Adapter-neutral classification of a failed database operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFailure {
    /// The connection dropped mid-operation.
    Connection(String),
    /// A unique constraint rejected the write; carries the constraint name
    /// when the driver reports one.
    UniqueViolation(String),
    /// Everything else: malformed queries, missing rows, serialisation.
    Query(String),
}

/// Classify a Diesel error, logging the raw failure at debug level.
pub(crate) fn classify(error: DieselError) -> StoreFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreFailure::UniqueViolation(info.constraint_name().unwrap_or("unknown").to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => {
            StoreFailure::Connection("database connection error".to_owned())
        }
        DieselError::NotFound => StoreFailure::Query("record not found".to_owned()),
        _ => StoreFailure::Query("database error".to_owned()),
    }
}

/// Cast a non-negative domain integer for storage.
#[expect(
    clippy::cast_possible_wrap,
    reason = "XP, levels, and ratings stay far below i32::MAX"
)]
pub(crate) fn to_db_i32(value: u32) -> i32 {
    value as i32
}

/// Cast a stored integer back into the domain's unsigned space.
#[expect(
    clippy::cast_sign_loss,
    reason = "columns carry CHECK constraints keeping them non-negative"
)]
pub(crate) fn from_db_i32(value: i32) -> u32 {
    value.max(0) as u32
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_classifies_as_query() {
        assert_eq!(
            classify(DieselError::NotFound),
            StoreFailure::Query("record not found".to_owned())
        );
    }

    #[rstest]
    #[case(0, 0)]
    #[case(250, 250)]
    fn db_casts_round_trip(#[case] domain: u32, #[case] db: i32) {
        assert_eq!(to_db_i32(domain), db);
        assert_eq!(from_db_i32(db), domain);
    }

    #[rstest]
    fn negative_db_values_clamp_to_zero() {
        assert_eq!(from_db_i32(-5), 0);
    }
}
