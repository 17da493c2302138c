//! Dashboard reporting and payout recording.
//!
//! Pure arithmetic over repository aggregates; date arithmetic lives in
//! [`crate::domain::reporting`] so it stays unit-testable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::ports::{
    RatingStats, ReportingPersistenceError, ReportingRepository, RestaurantRepository,
};
use crate::domain::reporting::{
    daily_comparison, daily_totals, MonthRange, Overview, PayoutsView, PeriodStarts, StaffAmount,
    StaffDetail, Transfer,
};
use crate::domain::restaurant::{Restaurant, StaffId, StaffMember};
use crate::domain::tipping_service::map_restaurant_error;
use crate::domain::Error;

/// Number of staff shown in the overview leaderboards.
const LEADERBOARD_SIZE: usize = 3;
/// Reviews shown on the overview page.
const OVERVIEW_REVIEWS: u32 = 10;
/// Tips/reviews shown on the staff drill-down.
const STAFF_DETAIL_ROWS: u32 = 10;
/// Transfers shown on the payouts page.
const PAYOUT_TRANSFERS: u32 = 20;

/// Builds the admin dashboard payloads.
#[derive(Clone)]
pub struct ReportingService {
    reporting: Arc<dyn ReportingRepository>,
    restaurants: Arc<dyn RestaurantRepository>,
}

fn map_reporting_error(error: ReportingPersistenceError) -> Error {
    match error {
        ReportingPersistenceError::Connection { message } => Error::service_unavailable(message),
        ReportingPersistenceError::Query { message } => Error::internal(message),
    }
}

fn mean_rating(stats: RatingStats) -> f64 {
    if stats.count == 0 {
        return 0.0;
    }
    #[expect(
        clippy::cast_precision_loss,
        reason = "rating sums and counts stay far below 2^52"
    )]
    let mean = stats.rating_total as f64 / stats.count as f64;
    mean
}

fn pending_by_staff(
    tip_totals: &[(StaffId, i64)],
    transfer_totals: &[(StaffId, i64)],
    staff: &[StaffMember],
) -> Vec<StaffAmount> {
    let tips: HashMap<StaffId, i64> = tip_totals.iter().copied().collect();
    let sent: HashMap<StaffId, i64> = transfer_totals.iter().copied().collect();
    staff
        .iter()
        .map(|member| {
            let pending = tips.get(&member.id).copied().unwrap_or(0)
                - sent.get(&member.id).copied().unwrap_or(0);
            StaffAmount {
                staff: member.clone(),
                amount_cents: pending.max(0),
            }
        })
        .collect()
}

impl ReportingService {
    /// Create the service over its ports.
    pub fn new(
        reporting: Arc<dyn ReportingRepository>,
        restaurants: Arc<dyn RestaurantRepository>,
    ) -> Self {
        Self {
            reporting,
            restaurants,
        }
    }

    /// The overview page payload for a restaurant.
    pub async fn overview(&self, restaurant: &Restaurant) -> Result<Overview, Error> {
        let now = Utc::now();
        let periods = PeriodStarts::at(now);
        let r = &restaurant.id;

        let tips_today_cents = self
            .reporting
            .tip_total_since(r, None, periods.today)
            .await
            .map_err(map_reporting_error)?;
        let tips_week_cents = self
            .reporting
            .tip_total_since(r, None, periods.week)
            .await
            .map_err(map_reporting_error)?;
        let tips_month_cents = self
            .reporting
            .tip_total_since(r, None, periods.month)
            .await
            .map_err(map_reporting_error)?;

        let stats = self
            .reporting
            .rating_stats(r, None)
            .await
            .map_err(map_reporting_error)?;

        let tip_totals = self
            .reporting
            .tip_totals_by_staff(r)
            .await
            .map_err(map_reporting_error)?;
        let transfer_totals = self
            .reporting
            .transfer_totals_by_staff(r)
            .await
            .map_err(map_reporting_error)?;

        let all_staff = self
            .restaurants
            .all_staff(r)
            .await
            .map_err(map_restaurant_error)?;
        let active_staff: Vec<StaffMember> =
            all_staff.iter().filter(|m| m.active).cloned().collect();

        let by_id: HashMap<StaffId, &StaffMember> =
            all_staff.iter().map(|m| (m.id, m)).collect();
        let mut top_tipped: Vec<StaffAmount> = tip_totals
            .iter()
            .filter_map(|(id, total)| {
                by_id.get(id).map(|member| StaffAmount {
                    staff: (*member).clone(),
                    amount_cents: *total,
                })
            })
            .collect();
        top_tipped.sort_by(|a, b| b.amount_cents.cmp(&a.amount_cents));
        top_tipped.truncate(LEADERBOARD_SIZE);

        let mut top_rated = active_staff.clone();
        top_rated.sort_by(|a, b| b.rating_avg.total_cmp(&a.rating_avg));
        top_rated.truncate(LEADERBOARD_SIZE);

        let staff_pending = pending_by_staff(&tip_totals, &transfer_totals, &active_staff);

        let current_range = MonthRange::containing(now);
        let previous_range = current_range.previous();
        let current_rows = self
            .reporting
            .tip_rows_between(r, current_range.start, current_range.end)
            .await
            .map_err(map_reporting_error)?;
        let previous_rows = self
            .reporting
            .tip_rows_between(r, previous_range.start, previous_range.end)
            .await
            .map_err(map_reporting_error)?;
        let daily = daily_comparison(
            daily_totals(&current_range, &current_rows),
            daily_totals(&previous_range, &previous_rows),
        );

        let recent_reviews = self
            .reporting
            .recent_reviews(r, None, OVERVIEW_REVIEWS)
            .await
            .map_err(map_reporting_error)?;

        Ok(Overview {
            tips_today_cents,
            tips_week_cents,
            tips_month_cents,
            rating_avg: mean_rating(stats),
            reviews_count: stats.count,
            top_tipped,
            top_rated,
            staff_pending,
            daily,
            recent_reviews,
        })
    }

    /// The staff drill-down payload.
    pub async fn staff_detail(
        &self,
        restaurant: &Restaurant,
        staff_id: &StaffId,
    ) -> Result<StaffDetail, Error> {
        let staff = self
            .restaurants
            .staff_member(&restaurant.id, staff_id)
            .await
            .map_err(map_restaurant_error)?
            .ok_or_else(|| Error::not_found("staff member not found"))?;

        let periods = PeriodStarts::at(Utc::now());
        let tips_today_cents = self
            .reporting
            .tip_total_since(&restaurant.id, Some(staff_id), periods.today)
            .await
            .map_err(map_reporting_error)?;
        let tips_week_cents = self
            .reporting
            .tip_total_since(&restaurant.id, Some(staff_id), periods.week)
            .await
            .map_err(map_reporting_error)?;
        let stats = self
            .reporting
            .rating_stats(&restaurant.id, Some(staff_id))
            .await
            .map_err(map_reporting_error)?;
        let last_tips = self
            .reporting
            .recent_tips(&restaurant.id, Some(staff_id), STAFF_DETAIL_ROWS)
            .await
            .map_err(map_reporting_error)?;
        let last_reviews = self
            .reporting
            .recent_reviews(&restaurant.id, Some(staff_id), STAFF_DETAIL_ROWS)
            .await
            .map_err(map_reporting_error)?;

        Ok(StaffDetail {
            staff,
            tips_today_cents,
            tips_week_cents,
            rating_avg: mean_rating(stats),
            last_tips,
            last_reviews,
        })
    }

    /// The payouts page payload.
    pub async fn payouts(&self, restaurant: &Restaurant) -> Result<PayoutsView, Error> {
        let rows = self.pending_rows(restaurant).await?;
        let transfers = self
            .reporting
            .recent_transfers(&restaurant.id, PAYOUT_TRANSFERS)
            .await
            .map_err(map_reporting_error)?;
        Ok(PayoutsView { rows, transfers })
    }

    /// Record a transfer of the full pending amount for one staff member.
    pub async fn send_payout(
        &self,
        restaurant: &Restaurant,
        staff_id: &StaffId,
    ) -> Result<Transfer, Error> {
        let rows = self.pending_rows(restaurant).await?;
        let pending = rows
            .iter()
            .find(|row| row.staff.id == *staff_id)
            .map(|row| row.amount_cents)
            .ok_or_else(|| Error::not_found("staff member not found"))?;

        if pending <= 0 {
            return Err(Error::conflict("nothing pending for this staff member"));
        }
        let amount = i32::try_from(pending)
            .map_err(|_| Error::internal("pending amount exceeds transfer bounds"))?;

        let transfer = Transfer::new_sent(restaurant.id, *staff_id, amount);
        self.reporting
            .insert_transfer(&transfer)
            .await
            .map_err(map_reporting_error)?;
        Ok(transfer)
    }

    async fn pending_rows(&self, restaurant: &Restaurant) -> Result<Vec<StaffAmount>, Error> {
        let tip_totals = self
            .reporting
            .tip_totals_by_staff(&restaurant.id)
            .await
            .map_err(map_reporting_error)?;
        let transfer_totals = self
            .reporting
            .transfer_totals_by_staff(&restaurant.id)
            .await
            .map_err(map_reporting_error)?;
        let staff: Vec<StaffMember> = self
            .restaurants
            .active_staff(&restaurant.id)
            .await
            .map_err(map_restaurant_error)?;
        Ok(pending_by_staff(&tip_totals, &transfer_totals, &staff))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::test_support::InMemoryStore;
    use crate::domain::ErrorCode;

    fn service(store: &InMemoryStore) -> ReportingService {
        ReportingService::new(store.reporting(), store.restaurants())
    }

    #[rstest]
    #[case(RatingStats { count: 0, rating_total: 0 }, 0.0)]
    #[case(RatingStats { count: 2, rating_total: 6 }, 3.0)]
    #[case(RatingStats { count: 4, rating_total: 18 }, 4.5)]
    fn mean_rating_handles_empty_and_exact_cases(
        #[case] stats: RatingStats,
        #[case] expected: f64,
    ) {
        assert_eq!(mean_rating(stats), expected);
    }

    #[tokio::test]
    async fn overview_sums_tips_and_counts_reviews() {
        let store = InMemoryStore::with_demo_restaurant();
        let member = store.add_staff("Mia");
        store.add_tip_to_staff(&member.id, 500);
        store.add_tip_to_staff(&member.id, 300);
        store.add_review_of_staff(&member.id, 4);
        store.add_review_of_staff(&member.id, 5);
        let restaurant = store.restaurant();

        let overview = service(&store)
            .overview(&restaurant)
            .await
            .expect("overview builds");

        assert_eq!(overview.tips_today_cents, 800);
        assert_eq!(overview.tips_week_cents, 800);
        assert_eq!(overview.tips_month_cents, 800);
        assert_eq!(overview.reviews_count, 2);
        assert_eq!(overview.rating_avg, 4.5);
        assert_eq!(overview.recent_reviews.len(), 2);
        assert_eq!(
            overview.top_tipped.first().map(|row| row.amount_cents),
            Some(800)
        );
        assert_eq!(
            overview.daily.current.iter().sum::<i64>(),
            800,
            "today's tips appear in the daily series"
        );
    }

    #[tokio::test]
    async fn overview_of_an_idle_restaurant_is_all_zeroes() {
        let store = InMemoryStore::with_demo_restaurant();
        let restaurant = store.restaurant();

        let overview = service(&store)
            .overview(&restaurant)
            .await
            .expect("overview builds");
        assert_eq!(overview.tips_today_cents, 0);
        assert_eq!(overview.reviews_count, 0);
        assert_eq!(overview.rating_avg, 0.0);
        assert!(overview.top_tipped.is_empty());
        assert!(overview.recent_reviews.is_empty());
    }

    #[tokio::test]
    async fn pending_is_tips_minus_transfers_clamped_at_zero() {
        let store = InMemoryStore::with_demo_restaurant();
        let member = store.add_staff("Mia");
        store.add_tip_to_staff(&member.id, 1000);
        store.add_transfer_to_staff(&member.id, 400);
        let restaurant = store.restaurant();
        let svc = service(&store);

        let payouts = svc.payouts(&restaurant).await.expect("payouts build");
        assert_eq!(
            payouts.rows.first().map(|row| row.amount_cents),
            Some(600)
        );

        // Over-transferred staff never show negative pending.
        store.add_transfer_to_staff(&member.id, 900);
        let payouts = svc.payouts(&restaurant).await.expect("payouts build");
        assert_eq!(payouts.rows.first().map(|row| row.amount_cents), Some(0));
    }

    #[tokio::test]
    async fn send_payout_zeroes_the_pending_amount() {
        let store = InMemoryStore::with_demo_restaurant();
        let member = store.add_staff("Mia");
        store.add_tip_to_staff(&member.id, 700);
        let restaurant = store.restaurant();
        let svc = service(&store);

        let transfer = svc
            .send_payout(&restaurant, &member.id)
            .await
            .expect("payout sends");
        assert_eq!(transfer.amount_cents, 700);
        assert_eq!(transfer.status, "sent");

        let payouts = svc.payouts(&restaurant).await.expect("payouts build");
        assert_eq!(payouts.rows.first().map(|row| row.amount_cents), Some(0));
        assert_eq!(payouts.transfers.len(), 1);
    }

    #[tokio::test]
    async fn send_payout_with_nothing_pending_conflicts() {
        let store = InMemoryStore::with_demo_restaurant();
        let member = store.add_staff("Mia");
        let restaurant = store.restaurant();

        let err = service(&store)
            .send_payout(&restaurant, &member.id)
            .await
            .expect_err("nothing pending");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn staff_detail_scopes_to_the_member() {
        let store = InMemoryStore::with_demo_restaurant();
        let mia = store.add_staff("Mia");
        let jake = store.add_staff("Jake");
        store.add_tip_to_staff(&mia.id, 500);
        store.add_tip_to_staff(&jake.id, 900);
        store.add_review_of_staff(&mia.id, 5);
        let restaurant = store.restaurant();

        let detail = service(&store)
            .staff_detail(&restaurant, &mia.id)
            .await
            .expect("detail builds");
        assert_eq!(detail.tips_today_cents, 500);
        assert_eq!(detail.rating_avg, 5.0);
        assert_eq!(detail.last_tips.len(), 1);
    }

    #[tokio::test]
    async fn staff_detail_for_a_stranger_is_not_found() {
        let store = InMemoryStore::with_demo_restaurant();
        let restaurant = store.restaurant();

        let err = service(&store)
            .staff_detail(&restaurant, &StaffId::random())
            .await
            .expect_err("unknown staff");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
