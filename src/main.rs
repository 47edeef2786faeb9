use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use cloudmall::context::MallContext;
use cloudmall::geo::GeoPoint;
use cloudmall::identity::LocalIdentityStore;
use cloudmall::moderation::PatternValidator;
use cloudmall::profile::MemoryProfileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let pin_lat = std::env::var("CLOUDMALL_PIN_LAT").unwrap_or_else(|_| "12.9".to_string());
    let pin_lng = std::env::var("CLOUDMALL_PIN_LNG").unwrap_or_else(|_| "77.6".to_string());
    let banned = std::env::var("CLOUDMALL_BANNED").unwrap_or_default();
    info!(
        target: "mall",
        "CloudMall core starting: RUST_LOG='{}', default_pin=({}, {}), extra_banned='{}'",
        rust_log, pin_lat, pin_lng, banned
    );

    let default_pin = GeoPoint::new(
        pin_lat.parse().unwrap_or(12.9),
        pin_lng.parse().unwrap_or(77.6),
    );

    // Default kid-safety list plus any comma-separated additions from env.
    let mut patterns: Vec<String> =
        PatternValidator::DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect();
    patterns.extend(banned.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
    let validator = PatternValidator::with_patterns(&patterns)?;

    let ctx = MallContext::new(
        Arc::new(LocalIdentityStore::new()),
        Arc::new(MemoryProfileStore::new()),
        Arc::new(validator),
    );

    cloudmall::cli::run(Arc::new(ctx), default_pin).await
}
