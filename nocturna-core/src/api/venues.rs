//! Venues, reviews and reservations.
//!
//! Submissions are validated locally first; an invalid one never reaches the
//! network.

use super::ApiClient;
use crate::models::{NewReservation, NewReview, Reservation, Review, Venue};
use crate::Result;

impl ApiClient {
    /// `GET /api/Comercios/listado`
    pub async fn list_venues(&self) -> Result<Vec<Venue>> {
        self.get("api/Comercios/listado").await
    }

    /// `GET /api/Comercios/{id}`
    pub async fn get_venue(&self, id: i64) -> Result<Venue> {
        self.get(&format!("api/Comercios/{}", id)).await
    }

    /// `GET /api/Resenias/comercio/{venue_id}`
    pub async fn list_reviews(&self, venue_id: i64) -> Result<Vec<Review>> {
        self.get(&format!("api/Resenias/comercio/{}", venue_id)).await
    }

    /// `POST /api/Resenias/crear`
    pub async fn create_review(&self, review: &NewReview) -> Result<Review> {
        review.validate()?;
        self.post("api/Resenias/crear", review).await
    }

    /// `POST /api/Reservas/crear`
    pub async fn create_reservation(&self, reservation: &NewReservation) -> Result<Reservation> {
        reservation.validate()?;
        self.post("api/Reservas/crear", reservation).await
    }

    /// `GET /api/Reservas/usuario/{user_id}`
    pub async fn list_reservations(&self, user_id: i64) -> Result<Vec<Reservation>> {
        self.get(&format!("api/Reservas/usuario/{}", user_id)).await
    }
}
