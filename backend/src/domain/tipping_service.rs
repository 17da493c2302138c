//! Tip recording: validate, insert, award XP.

use std::sync::Arc;

use serde_json::json;

use crate::domain::activity::{NewTip, Tip};
use crate::domain::ports::{
    ActivityPersistenceError, ActivityRepository, RestaurantPersistenceError, RestaurantRepository,
};
use crate::domain::progress_service::ProgressService;
use crate::domain::restaurant::{Restaurant, StaffId};
use crate::domain::rewards::XP_PER_TIP;
use crate::domain::user::User;
use crate::domain::Error;

/// A recorded tip plus the XP standing it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TipReceipt {
    /// The stored tip.
    pub tip: Tip,
    /// XP awarded to the tipper; 0 for fully anonymous tips.
    pub xp_awarded: u32,
    /// The tipper's XP after the award, when identified.
    pub xp_total: Option<u32>,
}

/// Records tips against a restaurant's roster.
#[derive(Clone)]
pub struct TippingService {
    activity: Arc<dyn ActivityRepository>,
    restaurants: Arc<dyn RestaurantRepository>,
    progress: ProgressService,
}

pub(crate) fn map_activity_error(error: ActivityPersistenceError) -> Error {
    match error {
        ActivityPersistenceError::Connection { message } => Error::service_unavailable(message),
        ActivityPersistenceError::Query { message } => Error::internal(message),
    }
}

pub(crate) fn map_restaurant_error(error: RestaurantPersistenceError) -> Error {
    match error {
        RestaurantPersistenceError::Connection { message } => Error::service_unavailable(message),
        RestaurantPersistenceError::Query { message } => Error::internal(message),
    }
}

impl TippingService {
    /// Create the service over its ports.
    pub fn new(
        activity: Arc<dyn ActivityRepository>,
        restaurants: Arc<dyn RestaurantRepository>,
        progress: ProgressService,
    ) -> Self {
        Self {
            activity,
            restaurants,
            progress,
        }
    }

    /// Record a tip at `restaurant`, optionally addressed to a staff member.
    ///
    /// The amount must be positive and the staff member, when given, must
    /// belong to the restaurant and be active. Identified tippers earn
    /// [`XP_PER_TIP`].
    pub async fn record_tip(
        &self,
        restaurant: &Restaurant,
        staff_id: Option<StaffId>,
        user: Option<&User>,
        amount_cents: i32,
        method_ui: &str,
    ) -> Result<TipReceipt, Error> {
        if amount_cents <= 0 {
            return Err(Error::invalid_request("tip amount must be positive")
                .with_details(json!({ "amountCents": amount_cents })));
        }

        if let Some(id) = staff_id {
            let member = self
                .restaurants
                .staff_member(&restaurant.id, &id)
                .await
                .map_err(map_restaurant_error)?;
            match member {
                Some(m) if m.active => {}
                _ => return Err(Error::invalid_request("unknown staff member")),
            }
        }

        let tip = self
            .activity
            .insert_tip(&NewTip {
                restaurant_id: restaurant.id,
                staff_id,
                user_id: user.map(|u| u.id),
                amount_cents,
                method_ui: method_ui.to_owned(),
            })
            .await
            .map_err(map_activity_error)?;

        let (xp_awarded, xp_total) = match user {
            Some(u) => {
                let update = self.progress.add_xp(u, XP_PER_TIP).await?;
                (XP_PER_TIP, Some(update.xp))
            }
            None => (0, None),
        };

        Ok(TipReceipt {
            tip,
            xp_awarded,
            xp_total,
        })
    }
}
