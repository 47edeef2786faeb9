//! Auth surface form behavior: pre-store validation, profile creation at
//! signup, inline auth failures with no session transition.

use std::sync::Arc;

use anyhow::Result;

use cloudmall::auth::SignupForm;
use cloudmall::context::MallContext;
use cloudmall::geo::GeoPoint;
use cloudmall::identity::{IdentityStore, LocalIdentityStore};
use cloudmall::moderation::PatternValidator;
use cloudmall::profile::MemoryProfileStore;

fn wired() -> (Arc<MallContext>, Arc<LocalIdentityStore>) {
    let identities = Arc::new(LocalIdentityStore::new());
    let ctx = MallContext::new(
        Arc::clone(&identities) as Arc<dyn IdentityStore>,
        Arc::new(MemoryProfileStore::new()),
        Arc::new(PatternValidator::default()),
    );
    (Arc::new(ctx), identities)
}

fn form(username: &str, location: Option<GeoPoint>) -> SignupForm {
    SignupForm {
        email: "kid@cloudmail.com".into(),
        password: "secret1".into(),
        username: username.into(),
        location,
        avatar_id: None,
    }
}

#[tokio::test]
async fn moderated_username_fails_before_any_identity_store_call() -> Result<()> {
    let (ctx, identities) = wired();

    let err = ctx.auth.sign_up(form("violence_kid", Some(GeoPoint::new(12.9, 77.6)))).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(identities.account_count(), 0);
    assert!(ctx.session.current().is_none());
    Ok(())
}

#[tokio::test]
async fn username_and_location_are_required_before_the_store_is_touched() -> Result<()> {
    let (ctx, identities) = wired();

    let err = ctx.auth.sign_up(form("  ", Some(GeoPoint::new(1.0, 2.0)))).await.unwrap_err();
    assert_eq!(err.code_str(), "username_required");

    let err = ctx.auth.sign_up(form("StarRunner", None)).await.unwrap_err();
    assert_eq!(err.code_str(), "location_required");

    assert_eq!(identities.account_count(), 0);
    assert!(ctx.session.current().is_none());
    Ok(())
}

#[tokio::test]
async fn signup_creates_profile_with_incomplete_onboarding_and_derived_area() -> Result<()> {
    let (ctx, _) = wired();

    let identity = ctx.auth.sign_up(form("StarRunner", Some(GeoPoint::new(12.9, 77.6)))).await?;
    assert_eq!(ctx.session.current().map(|id| id.uid), Some(identity.uid.clone()));

    let profile = ctx.profiles().read(&identity.uid).await?.expect("profile written at signup");
    assert_eq!(profile.username, "StarRunner");
    assert_eq!(profile.area_id.as_deref(), Some("1290_7760"));
    assert!(!profile.onboarding_complete);
    assert!(profile.onboarding.is_none());
    assert!(profile.avatar_id.is_none());
    assert_eq!(profile.activity_score, 0);
    Ok(())
}

#[tokio::test]
async fn auth_failures_surface_inline_without_session_transition() -> Result<()> {
    let (ctx, _) = wired();
    ctx.auth.sign_up(form("StarRunner", Some(GeoPoint::new(12.9, 77.6)))).await?;
    ctx.auth.sign_out().await?;

    let err = ctx.auth.sign_in("kid@cloudmail.com", "nope").await.unwrap_err();
    assert!(err.is_auth());
    assert!(ctx.session.current().is_none());

    let err = ctx
        .auth
        .sign_up(form("OtherName", Some(GeoPoint::new(1.0, 1.0))))
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "email_in_use");
    assert!(ctx.session.current().is_none());
    Ok(())
}

#[tokio::test]
async fn sign_out_drops_the_local_identity() -> Result<()> {
    let (ctx, _) = wired();
    ctx.auth.sign_up(form("StarRunner", Some(GeoPoint::new(12.9, 77.6)))).await?;
    assert!(ctx.session.current().is_some());

    ctx.auth.sign_out().await?;
    assert!(ctx.session.current().is_none());
    Ok(())
}
