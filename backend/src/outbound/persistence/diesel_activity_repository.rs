//! PostgreSQL-backed `ActivityRepository` implementation using Diesel ORM.
//!
//! The identity merge runs as a single transaction: tip and review
//! reassignment, the target's progress update, and the guest deletion either
//! all commit or all roll back.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::activity::{
    Media, NewReview, NewTip, Review, ReviewId, Tip, TipId, TIP_STATUS_RECORDED,
};
use crate::domain::ports::{
    ActivityPersistenceError, ActivityRepository, MergeOutcome, MergePlan,
};
use crate::domain::restaurant::{RestaurantId, StaffId};
use crate::domain::user::UserId;

use super::diesel_helpers::{classify, from_db_i32, to_db_i32, StoreFailure};
use super::models::{MediaRow, NewMediaRow, NewReviewRow, NewTipRow, ReviewRow, TipRow};
use super::pool::{DbPool, PoolError};
use super::schema::{media, reviews, staff, tips, users};

/// Diesel-backed implementation of the `ActivityRepository` port.
#[derive(Clone)]
pub struct DieselActivityRepository {
    pool: DbPool,
}

impl DieselActivityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ActivityPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ActivityPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ActivityPersistenceError {
    match classify(error) {
        StoreFailure::Connection(message) => ActivityPersistenceError::connection(message),
        StoreFailure::UniqueViolation(constraint) => {
            ActivityPersistenceError::query(format!("unique constraint violated: {constraint}"))
        }
        StoreFailure::Query(message) => ActivityPersistenceError::query(message),
    }
}

pub(crate) fn row_to_tip(row: TipRow) -> Tip {
    Tip {
        id: TipId::from_uuid(row.id),
        restaurant_id: RestaurantId::from_uuid(row.restaurant_id),
        staff_id: row.staff_id.map(StaffId::from_uuid),
        user_id: row.user_id.map(UserId::from_uuid),
        amount_cents: row.amount_cents,
        method_ui: row.method_ui,
        status: row.status,
        created_at: row.created_at,
    }
}

pub(crate) fn row_to_review(row: ReviewRow, media_row: Option<MediaRow>) -> Review {
    Review {
        id: ReviewId::from_uuid(row.id),
        restaurant_id: RestaurantId::from_uuid(row.restaurant_id),
        staff_id: row.staff_id.map(StaffId::from_uuid),
        user_id: row.user_id.map(UserId::from_uuid),
        rating: u8::try_from(row.rating.clamp(0, 5)).unwrap_or(0),
        comment: row.comment,
        share_allowed: row.share_allowed,
        media: media_row.map(|m| Media {
            id: m.id,
            review_id: ReviewId::from_uuid(m.review_id),
            image_name: m.image_name,
            width: m.width,
            height: m.height,
        }),
        created_at: row.created_at,
    }
}

/// Load the media rows for a batch of reviews and zip them together.
pub(crate) async fn attach_media<C>(
    conn: &mut C,
    rows: Vec<ReviewRow>,
) -> Result<Vec<Review>, diesel::result::Error>
where
    C: diesel_async::AsyncConnection<Backend = diesel::pg::Pg> + Send,
{
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let media_rows: Vec<MediaRow> = media::table
        .filter(media::review_id.eq_any(&ids))
        .select(MediaRow::as_select())
        .load(conn)
        .await?;

    let mut by_review: std::collections::HashMap<Uuid, MediaRow> =
        media_rows.into_iter().map(|m| (m.review_id, m)).collect();
    Ok(rows
        .into_iter()
        .map(|row| {
            let attached = by_review.remove(&row.id);
            row_to_review(row, attached)
        })
        .collect())
}

#[async_trait]
impl ActivityRepository for DieselActivityRepository {
    async fn insert_tip(&self, tip: &NewTip) -> Result<Tip, ActivityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewTipRow {
            id: Uuid::new_v4(),
            restaurant_id: *tip.restaurant_id.as_uuid(),
            staff_id: tip.staff_id.map(|s| *s.as_uuid()),
            user_id: tip.user_id.map(|u| *u.as_uuid()),
            amount_cents: tip.amount_cents,
            method_ui: &tip.method_ui,
            status: TIP_STATUS_RECORDED,
        };

        let stored: TipRow = diesel::insert_into(tips::table)
            .values(&row)
            .returning(TipRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row_to_tip(stored))
    }

    async fn insert_review(&self, review: &NewReview) -> Result<Review, ActivityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let review_row = NewReviewRow {
            id: Uuid::new_v4(),
            restaurant_id: *review.restaurant_id.as_uuid(),
            staff_id: review.staff_id.map(|s| *s.as_uuid()),
            user_id: review.user_id.map(|u| *u.as_uuid()),
            rating: i32::from(review.rating),
            comment: review.comment.as_deref(),
            share_allowed: review.share_allowed,
        };
        let media_input = review.media.clone();

        let (stored, stored_media) = conn
            .transaction::<(ReviewRow, Option<MediaRow>), diesel::result::Error, _>(|conn| {
                async move {
                    let stored: ReviewRow = diesel::insert_into(reviews::table)
                        .values(&review_row)
                        .returning(ReviewRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let stored_media = match media_input {
                        Some(input) => Some(
                            diesel::insert_into(media::table)
                                .values(&NewMediaRow {
                                    id: Uuid::new_v4(),
                                    review_id: stored.id,
                                    image_name: &input.image_name,
                                    width: input.width,
                                    height: input.height,
                                })
                                .returning(MediaRow::as_returning())
                                .get_result(conn)
                                .await?,
                        ),
                        None => None,
                    };

                    Ok((stored, stored_media))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(row_to_review(stored, stored_media))
    }

    async fn tips_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Tip>, ActivityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TipRow> = tips::table
            .filter(tips::user_id.eq(user_id.as_uuid()))
            .order(tips::created_at.desc())
            .limit(i64::from(limit))
            .select(TipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_tip).collect())
    }

    async fn reviews_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Review>, ActivityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ReviewRow> = reviews::table
            .filter(reviews::user_id.eq(user_id.as_uuid()))
            .order(reviews::created_at.desc())
            .limit(i64::from(limit))
            .select(ReviewRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        attach_media(&mut conn, rows).await.map_err(map_diesel_error)
    }

    async fn apply_merge(&self, plan: &MergePlan) -> Result<MergeOutcome, ActivityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let guest = *plan.guest_id.as_uuid();
        let target = *plan.target_id.as_uuid();
        let merged_xp = to_db_i32(plan.merged_xp);
        let merged_level = to_db_i32(plan.merged_level);

        conn.transaction::<MergeOutcome, diesel::result::Error, _>(|conn| {
            async move {
                let tips_moved = diesel::update(tips::table.filter(tips::user_id.eq(guest)))
                    .set(tips::user_id.eq(target))
                    .execute(conn)
                    .await?;

                let reviews_moved =
                    diesel::update(reviews::table.filter(reviews::user_id.eq(guest)))
                        .set(reviews::user_id.eq(target))
                        .execute(conn)
                        .await?;

                diesel::update(users::table.filter(users::id.eq(target)))
                    .set((users::xp.eq(merged_xp), users::level.eq(merged_level)))
                    .execute(conn)
                    .await?;

                diesel::delete(users::table.filter(users::id.eq(guest)))
                    .execute(conn)
                    .await?;

                Ok(MergeOutcome {
                    tips_moved: tips_moved as u64,
                    reviews_moved: reviews_moved as u64,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn refresh_staff_aggregates(
        &self,
        staff_id: &StaffId,
    ) -> Result<(), ActivityPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *staff_id.as_uuid();

        let (review_count, rating_total): (i64, Option<i64>) = reviews::table
            .filter(reviews::staff_id.eq(id))
            .select((
                diesel::dsl::count_star(),
                diesel::dsl::sum(reviews::rating),
            ))
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let tips_count: i64 = tips::table
            .filter(tips::staff_id.eq(id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rating_avg = if review_count > 0 {
            #[expect(
                clippy::cast_precision_loss,
                reason = "rating sums and counts stay far below 2^52"
            )]
            let mean = rating_total.unwrap_or(0) as f64 / review_count as f64;
            mean
        } else {
            0.0
        };

        diesel::update(staff::table.filter(staff::id.eq(id)))
            .set((
                staff::rating_avg.eq(rating_avg),
                staff::tips_count.eq(i32::try_from(tips_count).unwrap_or(i32::MAX)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    fn tip_row_conversion_preserves_ownership() {
        let user = Uuid::new_v4();
        let tip = row_to_tip(TipRow {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            staff_id: None,
            user_id: Some(user),
            amount_cents: 500,
            method_ui: "apple_pay".to_owned(),
            status: TIP_STATUS_RECORDED.to_owned(),
            created_at: Utc::now(),
        });
        assert_eq!(tip.user_id.map(|u| *u.as_uuid()), Some(user));
        assert_eq!(tip.amount_cents, 500);
    }

    #[rstest]
    fn review_row_conversion_attaches_media() {
        let review_id = Uuid::new_v4();
        let review = row_to_review(
            ReviewRow {
                id: review_id,
                restaurant_id: Uuid::new_v4(),
                staff_id: None,
                user_id: None,
                rating: 4,
                comment: Some("nice".to_owned()),
                share_allowed: true,
                created_at: Utc::now(),
            },
            Some(MediaRow {
                id: Uuid::new_v4(),
                review_id,
                image_name: "abc.jpg".to_owned(),
                width: Some(800),
                height: None,
            }),
        );
        assert_eq!(review.rating, 4);
        assert_eq!(
            review.media.as_ref().map(|m| m.image_name.as_str()),
            Some("abc.jpg")
        );
    }

    #[rstest]
    fn out_of_range_stored_ratings_clamp() {
        let review = row_to_review(
            ReviewRow {
                id: Uuid::new_v4(),
                restaurant_id: Uuid::new_v4(),
                staff_id: None,
                user_id: None,
                rating: 99,
                comment: None,
                share_allowed: false,
                created_at: Utc::now(),
            },
            None,
        );
        assert_eq!(review.rating, 5);
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, ActivityPersistenceError::Connection { .. }));
    }
}
