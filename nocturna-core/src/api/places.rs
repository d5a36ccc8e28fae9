//! Geocoding through the backend's maps proxy.

use std::sync::Arc;

use super::ApiClient;
use crate::cache::{CachePolicy, TtlCache};
use crate::clock::Clock;
use crate::models::GeoPoint;
use crate::validation;
use crate::Result;

/// Address to coordinates, cached per normalized address.
pub struct Geocoder {
    api: Arc<ApiClient>,
    cache: TtlCache<String, GeoPoint>,
}

impl Geocoder {
    /// Create a geocoder with its own cache.
    pub fn new(api: Arc<ApiClient>, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            cache: TtlCache::new(policy, clock),
        }
    }

    /// `GET /api/GooglePlaces/geocode?address=...`
    pub async fn geocode(&self, address: &str) -> Result<GeoPoint> {
        validation::require_field("dirección", address)?;
        let key = address.trim().to_lowercase();
        if let Some(point) = self.cache.get(&key) {
            return Ok(point);
        }

        let point: GeoPoint = self
            .api
            .get(&format!(
                "api/GooglePlaces/geocode?address={}",
                urlencoding::encode(address.trim())
            ))
            .await?;
        self.cache.insert(key, point);
        Ok(point)
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        self.cache.clear();
    }
}
