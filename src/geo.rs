//! Location types, the coarse area-bucket derivation, and the geolocation
//! capability seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MallError, MallResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Coarse area grouping key: latitude/longitude scaled by 100 and
    /// floored, e.g. `{12.9, 77.6}` -> `"1290_7760"`.
    pub fn area_id(&self) -> String {
        format!("{}_{}", scale_floor(self.lat), scale_floor(self.lng))
    }
}

// The product can land one ulp under the decimal boundary (77.6 * 100.0 ==
// 7759.999999999999), which would bucket a coordinate into the wrong area.
// The nudge is far below coordinate precision, so it only repairs that case.
fn scale_floor(v: f64) -> i64 {
    (v * 100.0 + 1e-9).floor() as i64
}

/// One-shot geolocation capability (the browser geolocation API in the real
/// front end).
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_location(&self) -> MallResult<GeoPoint>;
}

/// Always reports the same spot. Used by the demo CLI and tests.
pub struct FixedGeolocator(pub GeoPoint);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_location(&self) -> MallResult<GeoPoint> {
        Ok(self.0)
    }
}

/// Models a user refusing the location permission prompt.
pub struct DeniedGeolocator;

#[async_trait]
impl Geolocator for DeniedGeolocator {
    async fn current_location(&self) -> MallResult<GeoPoint> {
        Err(MallError::permission_denied(
            "location_denied",
            "Location permission denied",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_bucket_truncates_toward_negative_infinity() {
        assert_eq!(GeoPoint::new(12.9, 77.6).area_id(), "1290_7760");
        assert_eq!(GeoPoint::new(0.0, 0.0).area_id(), "0_0");
        assert_eq!(GeoPoint::new(-12.345, 4.999).area_id(), "-1235_499");
    }

    #[tokio::test]
    async fn denied_geolocator_fails_with_permission_error() {
        let err = DeniedGeolocator.current_location().await.unwrap_err();
        assert!(matches!(err, MallError::PermissionDenied { .. }));
    }
}
