//! PostgreSQL-backed `RestaurantRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{RestaurantPersistenceError, RestaurantRepository};
use crate::domain::restaurant::{
    Membership, MembershipRole, Restaurant, RestaurantId, StaffId, StaffMember,
};
use crate::domain::user::UserId;

use super::diesel_helpers::{classify, from_db_i32, StoreFailure};
use super::models::{
    NewMembershipRow, NewRestaurantRow, NewStaffRow, RestaurantRow, StaffRow, StaffUpdate,
};
use super::pool::{DbPool, PoolError};
use super::schema::{memberships, restaurants, staff};

/// Diesel-backed implementation of the `RestaurantRepository` port.
#[derive(Clone)]
pub struct DieselRestaurantRepository {
    pool: DbPool,
}

impl DieselRestaurantRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RestaurantPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RestaurantPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> RestaurantPersistenceError {
    match classify(error) {
        StoreFailure::Connection(message) => RestaurantPersistenceError::connection(message),
        StoreFailure::UniqueViolation(constraint) => {
            RestaurantPersistenceError::query(format!("unique constraint violated: {constraint}"))
        }
        StoreFailure::Query(message) => RestaurantPersistenceError::query(message),
    }
}

pub(crate) fn row_to_restaurant(row: RestaurantRow) -> Restaurant {
    Restaurant {
        id: RestaurantId::from_uuid(row.id),
        slug: row.slug,
        name: row.name,
        logo_image: row.logo_image,
        created_at: row.created_at,
    }
}

pub(crate) fn row_to_staff(row: StaffRow) -> StaffMember {
    StaffMember {
        id: StaffId::from_uuid(row.id),
        restaurant_id: RestaurantId::from_uuid(row.restaurant_id),
        name: row.name,
        role: row.role,
        avatar_image: row.avatar_image,
        bio: row.bio,
        rating_avg: row.rating_avg,
        tips_count: from_db_i32(row.tips_count),
        active: row.active,
    }
}

#[async_trait]
impl RestaurantRepository for DieselRestaurantRepository {
    async fn insert(&self, restaurant: &Restaurant) -> Result<(), RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(restaurants::table)
            .values(&NewRestaurantRow {
                id: *restaurant.id.as_uuid(),
                slug: &restaurant.slug,
                name: &restaurant.name,
                logo_image: restaurant.logo_image.as_deref(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<RestaurantRow> = restaurants::table
            .filter(restaurants::slug.eq(slug))
            .select(RestaurantRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_restaurant))
    }

    async fn find_by_id(
        &self,
        id: &RestaurantId,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<RestaurantRow> = restaurants::table
            .filter(restaurants::id.eq(id.as_uuid()))
            .select(RestaurantRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_restaurant))
    }

    async fn find_by_ids(
        &self,
        ids: &[RestaurantId],
    ) -> Result<Vec<Restaurant>, RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<RestaurantRow> = restaurants::table
            .filter(restaurants::id.eq_any(&uuids))
            .order(restaurants::name.asc())
            .select(RestaurantRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_restaurant).collect())
    }

    async fn active_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<StaffMember>, RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<StaffRow> = staff::table
            .filter(staff::restaurant_id.eq(restaurant_id.as_uuid()))
            .filter(staff::active.eq(true))
            .order(staff::name.asc())
            .select(StaffRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_staff).collect())
    }

    async fn all_staff(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<StaffMember>, RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<StaffRow> = staff::table
            .filter(staff::restaurant_id.eq(restaurant_id.as_uuid()))
            .order(staff::name.asc())
            .select(StaffRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_staff).collect())
    }

    async fn staff_member(
        &self,
        restaurant_id: &RestaurantId,
        staff_id: &StaffId,
    ) -> Result<Option<StaffMember>, RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<StaffRow> = staff::table
            .filter(staff::id.eq(staff_id.as_uuid()))
            .filter(staff::restaurant_id.eq(restaurant_id.as_uuid()))
            .select(StaffRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_staff))
    }

    async fn insert_staff(&self, member: &StaffMember) -> Result<(), RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(staff::table)
            .values(&NewStaffRow {
                id: *member.id.as_uuid(),
                restaurant_id: *member.restaurant_id.as_uuid(),
                name: &member.name,
                role: member.role.as_deref(),
                avatar_image: member.avatar_image.as_deref(),
                bio: member.bio.as_deref(),
                rating_avg: member.rating_avg,
                tips_count: i32::try_from(member.tips_count).unwrap_or(i32::MAX),
                active: member.active,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_staff(&self, member: &StaffMember) -> Result<(), RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(staff::table.filter(staff::id.eq(member.id.as_uuid())))
            .set(&StaffUpdate {
                name: &member.name,
                role: member.role.as_deref(),
                avatar_image: member.avatar_image.as_deref(),
                bio: member.bio.as_deref(),
                active: member.active,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn insert_membership(
        &self,
        membership: &Membership,
    ) -> Result<(), RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(memberships::table)
            .values(&NewMembershipRow {
                id: membership.id,
                user_id: *membership.user_id.as_uuid(),
                restaurant_id: *membership.restaurant_id.as_uuid(),
                role: membership.role.as_str(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn admin_restaurant_for(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Restaurant>, RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(String, RestaurantRow)> = memberships::table
            .inner_join(restaurants::table)
            .filter(memberships::user_id.eq(user_id.as_uuid()))
            .filter(memberships::role.eq_any(["admin", "manager"]))
            .order(memberships::id.asc())
            .select((memberships::role, RestaurantRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.and_then(|(role, restaurant)| {
            MembershipRole::parse(&role)
                .grants_dashboard()
                .then(|| row_to_restaurant(restaurant))
        }))
    }

    async fn set_logo(
        &self,
        restaurant_id: &RestaurantId,
        logo_image: Option<&str>,
    ) -> Result<(), RestaurantPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(restaurants::table.filter(restaurants::id.eq(restaurant_id.as_uuid())))
            .set(restaurants::logo_image.eq(logo_image))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
