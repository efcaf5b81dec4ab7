//! Role resolution against a local identity endpoint.

use anyhow::Result;
use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use portal_gate::{
    cli::actions::whoami,
    gate::Workspace,
    identity::{HttpIdentityClient, IdentityClient, IdentityError, RoleResolver},
};
use secrecy::SecretString;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;

async fn me(headers: HeaderMap) -> Response {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match cookie {
        "admin_session=owner" => Json(json!({
            "tenantRole": "OWNER",
            "isPlatformAdmin": false,
        }))
        .into_response(),
        "pm_session=platform" => Json(json!({ "isPlatformAdmin": true })).into_response(),
        "client_session=member" => Json(json!({
            "tenantRole": "MEMBER",
            "isPlatformAdmin": false,
        }))
        .into_response(),
        "admin_session=garbled" => "{\"tenantRole\":".into_response(),
        _ => (StatusCode::UNAUTHORIZED, "  session expired  ").into_response(),
    }
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "isPlatformAdmin": true })).into_response()
}

async fn spawn_identity() -> Result<SocketAddr> {
    let app = Router::new()
        .route("/api/auth/me", get(me))
        .route("/slow/api/auth/me", get(slow));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

fn client(addr: SocketAddr, cookie: &str, token: &str) -> Result<HttpIdentityClient> {
    Ok(HttpIdentityClient::new(&format!("http://{addr}"))?
        .with_session(cookie, SecretString::from(token)))
}

#[tokio::test]
async fn fetch_identity_sends_session_cookie() -> Result<()> {
    let addr = spawn_identity().await?;

    let identity = client(addr, "admin_session", "owner")?
        .fetch_identity()
        .await?;

    assert_eq!(identity.tenant_role.as_deref(), Some("OWNER"));
    assert!(!identity.is_platform_admin);
    assert!(identity.is_privileged());
    Ok(())
}

#[tokio::test]
async fn missing_tenant_role_defaults_to_none() -> Result<()> {
    let addr = spawn_identity().await?;

    let identity = client(addr, "pm_session", "platform")?
        .fetch_identity()
        .await?;

    assert_eq!(identity.tenant_role, None);
    assert!(identity.is_platform_admin);
    Ok(())
}

#[tokio::test]
async fn unauthorized_maps_to_http_error() -> Result<()> {
    let addr = spawn_identity().await?;

    let result = client(addr, "admin_session", "expired")?
        .fetch_identity()
        .await;

    match result {
        Err(IdentityError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "session expired");
        }
        other => panic!("expected http error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn malformed_payload_maps_to_parse_error() -> Result<()> {
    let addr = spawn_identity().await?;

    let result = client(addr, "admin_session", "garbled")?
        .fetch_identity()
        .await;

    assert!(matches!(result, Err(IdentityError::Parse(_))));
    Ok(())
}

#[tokio::test]
async fn slow_endpoint_maps_to_timeout() -> Result<()> {
    let addr = spawn_identity().await?;

    let result = HttpIdentityClient::with_timeout(
        &format!("http://{addr}/slow"),
        Duration::from_millis(100),
    )?
    .fetch_identity()
    .await;

    assert!(matches!(result, Err(IdentityError::Timeout(_))));
    Ok(())
}

#[tokio::test]
async fn resolver_publishes_resolved_snapshot() -> Result<()> {
    let addr = spawn_identity().await?;
    let resolver = RoleResolver::activate(Arc::new(client(addr, "client_session", "member")?));

    let snapshot = resolver.resolved().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.tenant_role.as_deref(), Some("MEMBER"));
    assert!(!snapshot.is_privileged());
    Ok(())
}

#[tokio::test]
async fn resolver_folds_errors_into_anonymous() -> Result<()> {
    let addr = spawn_identity().await?;
    let resolver = RoleResolver::activate(Arc::new(client(addr, "client_session", "nope")?));

    let snapshot = resolver.resolved().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.tenant_role, None);
    assert!(!snapshot.is_platform_admin);
    Ok(())
}

#[tokio::test]
async fn whoami_uses_workspace_cookie() -> Result<()> {
    let addr = spawn_identity().await?;

    let snapshot = whoami::resolve(whoami::Args {
        identity_url: format!("http://{addr}"),
        session_token: SecretString::from("platform"),
        workspace: Workspace::ProjectManager,
        timeout_seconds: 5,
    })
    .await?;

    assert!(snapshot.is_platform_admin);
    assert!(snapshot.is_privileged());

    let json = serde_json::to_value(&snapshot)?;
    assert_eq!(json["loading"], false);
    assert_eq!(json["isPlatformAdmin"], true);
    Ok(())
}
