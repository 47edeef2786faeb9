//! Interaction gate properties: one surface regardless of caller count,
//! batched resolution against a single session transition, cancellation as
//! a valid `None` outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use cloudmall::auth::SignupForm;
use cloudmall::context::MallContext;
use cloudmall::geo::GeoPoint;

fn ctx() -> Arc<MallContext> {
    Arc::new(MallContext::local())
}

fn star_form() -> SignupForm {
    SignupForm {
        email: "star@cloudmail.com".into(),
        password: "secret1".into(),
        username: "StarRunner".into(),
        location: Some(GeoPoint::new(12.9, 77.6)),
        avatar_id: None,
    }
}

// Poll until the condition holds; panics after ~2s so a broken wakeup path
// fails loudly instead of hanging the suite.
async fn wait_for(mut cond: impl FnMut() -> bool, what: &str) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

#[tokio::test]
async fn concurrent_callers_share_one_surface_and_one_batch() -> Result<()> {
    let ctx = ctx();

    let mut handles = Vec::new();
    for _ in 0..3 {
        let ctx = Arc::clone(&ctx);
        handles.push(tokio::spawn(async move { ctx.gate.require_identity().await }));
    }

    wait_for(|| ctx.gate.pending_count() == 3, "three queued requests").await;
    // A late caller joins the queue without reopening anything.
    assert!(ctx.gate.surface_visible());

    let identity = ctx.auth.sign_up(star_form()).await?;

    let resolved = futures::future::join_all(handles).await;
    for outcome in resolved {
        assert_eq!(outcome?.map(|id| id.uid), Some(identity.uid.clone()));
    }
    wait_for(|| !ctx.gate.surface_visible(), "surface to close").await;
    assert_eq!(ctx.gate.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn dismissal_resolves_everyone_with_none_and_leaves_session_signed_out() -> Result<()> {
    let ctx = ctx();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let ctx = Arc::clone(&ctx);
        handles.push(tokio::spawn(async move { ctx.gate.require_identity().await }));
    }
    wait_for(|| ctx.gate.pending_count() == 4, "four queued requests").await;

    ctx.gate.dismiss();

    for outcome in futures::future::join_all(handles).await {
        assert!(outcome?.is_none());
    }
    assert_eq!(ctx.gate.pending_count(), 0);
    assert!(!ctx.gate.surface_visible());
    assert!(ctx.session.current().is_none());
    Ok(())
}

#[tokio::test]
async fn signed_in_caller_resolves_without_suspension() -> Result<()> {
    let ctx = ctx();
    let identity = ctx.auth.sign_up(star_form()).await?;

    let got = ctx.gate.require_identity().await;
    assert_eq!(got.map(|id| id.uid), Some(identity.uid));
    assert!(!ctx.gate.surface_visible());
    assert_eq!(ctx.gate.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn requests_resolved_by_dismissal_are_never_re_resolved() -> Result<()> {
    let ctx = ctx();

    let first = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move { ctx.gate.require_identity().await })
    };
    wait_for(|| ctx.gate.pending_count() == 1, "queued request").await;
    ctx.gate.dismiss();
    assert!(first.await?.is_none());

    // The sign-in that lands after dismissal benefits only new callers.
    let identity = ctx.auth.sign_up(star_form()).await?;
    let second = ctx.gate.require_identity().await;
    assert_eq!(second.map(|id| id.uid), Some(identity.uid));
    Ok(())
}

#[tokio::test]
async fn background_sign_in_with_empty_queue_is_a_no_op() -> Result<()> {
    let ctx = ctx();
    let mut surface_rx = ctx.gate.surface_updates();

    ctx.auth.sign_up(star_form()).await?;
    // Give the watcher a chance to run; nothing should become visible.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!ctx.gate.surface_visible());
    assert!(!*surface_rx.borrow_and_update());
    assert_eq!(ctx.gate.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_sign_in_leaves_the_queue_awaiting_a_retry() -> Result<()> {
    let ctx = ctx();
    ctx.auth.sign_up(star_form()).await?;
    ctx.auth.sign_out().await?;

    let pending = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move { ctx.gate.require_identity().await })
    };
    wait_for(|| ctx.gate.pending_count() == 1, "queued request").await;

    let err = ctx.auth.sign_in("star@cloudmail.com", "wrong-password").await.unwrap_err();
    assert!(err.is_auth());
    // The failure never touched the queue or the surface.
    assert_eq!(ctx.gate.pending_count(), 1);
    assert!(ctx.gate.surface_visible());

    let identity = ctx.auth.sign_in("star@cloudmail.com", "secret1").await?;
    assert_eq!(pending.await?.map(|id| id.uid), Some(identity.uid));
    Ok(())
}
