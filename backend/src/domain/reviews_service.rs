//! Review submission: validate, store the photo, insert, award XP, refresh
//! staff aggregates.

use std::sync::Arc;

use serde_json::json;

use crate::domain::activity::{NewMedia, NewReview, Review};
use crate::domain::ports::{
    ActivityRepository, ImageFormat, ImageStore, ImageStoreError, RestaurantRepository,
};
use crate::domain::progress_service::ProgressService;
use crate::domain::restaurant::{Restaurant, StaffId};
use crate::domain::rewards::{XP_PER_REVIEW_COMMENT, XP_PER_REVIEW_PHOTO};
use crate::domain::tipping_service::{map_activity_error, map_restaurant_error};
use crate::domain::user::User;
use crate::domain::Error;

/// An uploaded photo: raw bytes plus the declared format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Raw image bytes, stored unprocessed.
    pub bytes: Vec<u8>,
    /// Declared format; drives the stored extension and served MIME type.
    pub format: ImageFormat,
}

/// A stored review plus the XP standing it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewReceipt {
    /// The stored review.
    pub review: Review,
    /// XP awarded for this review.
    pub xp_awarded: u32,
}

/// Records reviews with optional photos.
#[derive(Clone)]
pub struct ReviewsService {
    activity: Arc<dyn ActivityRepository>,
    restaurants: Arc<dyn RestaurantRepository>,
    images: Arc<dyn ImageStore>,
    progress: ProgressService,
    max_image_bytes: usize,
}

fn map_image_error(error: ImageStoreError) -> Error {
    match error {
        ImageStoreError::Unavailable { message } => Error::service_unavailable(message),
    }
}

impl ReviewsService {
    /// Create the service over its ports; `max_image_bytes` caps uploads.
    pub fn new(
        activity: Arc<dyn ActivityRepository>,
        restaurants: Arc<dyn RestaurantRepository>,
        images: Arc<dyn ImageStore>,
        progress: ProgressService,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            activity,
            restaurants,
            images,
            progress,
            max_image_bytes,
        }
    }

    /// Submit a review for `restaurant`, optionally about a staff member and
    /// optionally carrying one photo.
    ///
    /// XP: [`XP_PER_REVIEW_COMMENT`] for a non-blank comment plus
    /// [`XP_PER_REVIEW_PHOTO`] for a stored photo, identified users only.
    pub async fn submit_review(
        &self,
        restaurant: &Restaurant,
        staff_id: Option<StaffId>,
        user: Option<&User>,
        rating: u8,
        comment: Option<&str>,
        share_allowed: bool,
        photo: Option<PhotoUpload>,
    ) -> Result<ReviewReceipt, Error> {
        if !(1..=5).contains(&rating) {
            return Err(Error::invalid_request("rating must be between 1 and 5")
                .with_details(json!({ "rating": rating })));
        }

        if let Some(id) = staff_id {
            let member = self
                .restaurants
                .staff_member(&restaurant.id, &id)
                .await
                .map_err(map_restaurant_error)?;
            if member.is_none() {
                return Err(Error::invalid_request("unknown staff member"));
            }
        }

        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);

        let media = match photo {
            Some(upload) => {
                if upload.bytes.len() > self.max_image_bytes {
                    return Err(Error::invalid_request("image exceeds the size limit")
                        .with_details(json!({ "maxBytes": self.max_image_bytes })));
                }
                let name = self
                    .images
                    .store(&upload.bytes, upload.format)
                    .await
                    .map_err(map_image_error)?;
                Some(NewMedia {
                    image_name: name,
                    width: None,
                    height: None,
                })
            }
            None => None,
        };
        let photo_saved = media.is_some();

        let review = self
            .activity
            .insert_review(&NewReview {
                restaurant_id: restaurant.id,
                staff_id,
                user_id: user.map(|u| u.id),
                rating,
                comment,
                share_allowed,
                media,
            })
            .await
            .map_err(map_activity_error)?;

        let mut xp_awarded = 0;
        if let Some(u) = user {
            let mut gained = 0;
            if review.comment.is_some() {
                gained += XP_PER_REVIEW_COMMENT;
            }
            if photo_saved {
                gained += XP_PER_REVIEW_PHOTO;
            }
            if gained > 0 {
                self.progress.add_xp(u, gained).await?;
            }
            xp_awarded = gained;
        }

        if let Some(id) = staff_id {
            self.activity
                .refresh_staff_aggregates(&id)
                .await
                .map_err(map_activity_error)?;
        }

        Ok(ReviewReceipt { review, xp_awarded })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::test_support::{InMemoryStore, StubImages};
    use crate::domain::user::DeviceFingerprint;
    use crate::domain::ErrorCode;

    fn service(store: &InMemoryStore) -> ReviewsService {
        ReviewsService::new(
            store.activity(),
            store.restaurants(),
            Arc::new(StubImages::default()),
            store.progress_service(),
            1024,
        )
    }

    fn photo() -> PhotoUpload {
        PhotoUpload {
            bytes: vec![0xFF; 64],
            format: ImageFormat::Jpeg,
        }
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[tokio::test]
    async fn out_of_range_ratings_are_rejected(#[case] rating: u8) {
        let store = InMemoryStore::with_demo_restaurant();
        let svc = service(&store);
        let restaurant = store.restaurant();

        let err = svc
            .submit_review(&restaurant, None, None, rating, None, false, None)
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(store.review_count(), 0);
    }

    #[tokio::test]
    async fn comment_and_photo_award_five_xp_each() {
        let store = InMemoryStore::with_demo_restaurant();
        let svc = service(&store);
        let restaurant = store.restaurant();
        let user = store.add_guest("device-1");

        let receipt = svc
            .submit_review(
                &restaurant,
                None,
                Some(&user),
                5,
                Some("Great coffee"),
                true,
                Some(photo()),
            )
            .await
            .expect("review stored");

        assert_eq!(receipt.xp_awarded, 10);
        assert_eq!(store.user_xp(&user.id), 10);
        assert!(receipt.review.media.is_some());
    }

    #[tokio::test]
    async fn blank_comment_without_photo_awards_nothing() {
        let store = InMemoryStore::with_demo_restaurant();
        let svc = service(&store);
        let restaurant = store.restaurant();
        let user = store.add_guest("device-1");

        let receipt = svc
            .submit_review(&restaurant, None, Some(&user), 4, Some("   "), false, None)
            .await
            .expect("review stored");

        assert_eq!(receipt.xp_awarded, 0);
        assert_eq!(store.user_xp(&user.id), 0);
        assert!(receipt.review.comment.is_none());
    }

    #[tokio::test]
    async fn anonymous_reviews_never_award_xp() {
        let store = InMemoryStore::with_demo_restaurant();
        let svc = service(&store);
        let restaurant = store.restaurant();

        let receipt = svc
            .submit_review(
                &restaurant,
                None,
                None,
                5,
                Some("Lovely"),
                false,
                Some(photo()),
            )
            .await
            .expect("review stored");
        assert_eq!(receipt.xp_awarded, 0);
    }

    #[tokio::test]
    async fn oversized_photos_are_rejected_before_storage() {
        let store = InMemoryStore::with_demo_restaurant();
        let svc = service(&store);
        let restaurant = store.restaurant();
        let user = store.add_guest("device-1");

        let err = svc
            .submit_review(
                &restaurant,
                None,
                Some(&user),
                5,
                None,
                false,
                Some(PhotoUpload {
                    bytes: vec![0; 4096],
                    format: ImageFormat::Png,
                }),
            )
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(store.review_count(), 0);
        assert_eq!(store.user_xp(&user.id), 0);
    }

    #[tokio::test]
    async fn staff_review_refreshes_their_aggregates() {
        let store = InMemoryStore::with_demo_restaurant();
        let member = store.add_staff("Mia");
        let svc = service(&store);
        let restaurant = store.restaurant();

        svc.submit_review(&restaurant, Some(member.id), None, 4, None, false, None)
            .await
            .expect("review stored");
        svc.submit_review(&restaurant, Some(member.id), None, 2, None, false, None)
            .await
            .expect("review stored");

        let refreshed = store.staff_member(&member.id);
        assert_eq!(refreshed.rating_avg, 3.0);
    }

    #[tokio::test]
    async fn unknown_staff_is_rejected() {
        let store = InMemoryStore::with_demo_restaurant();
        let svc = service(&store);
        let restaurant = store.restaurant();

        let err = svc
            .submit_review(
                &restaurant,
                Some(StaffId::random()),
                None,
                3,
                None,
                false,
                None,
            )
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn guest_fingerprint_does_not_change_on_review() {
        // Sanity: reviewing must not touch identity fields.
        let store = InMemoryStore::with_demo_restaurant();
        let svc = service(&store);
        let restaurant = store.restaurant();
        let user = store.add_guest("device-9");
        let fingerprint = DeviceFingerprint::from_device_id("device-9");

        svc.submit_review(&restaurant, None, Some(&user), 5, Some("ok"), false, None)
            .await
            .expect("review stored");
        let reloaded = store.user(&user.id);
        assert_eq!(reloaded.device_fingerprint, Some(fingerprint));
    }
}
