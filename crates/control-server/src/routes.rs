//! The control server's HTTP API: every endpoint in the public contract
//! (§4.3), plus the bearer-token gated remote tool surface.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use shield_api::{
    AgentRequest, AllowanceInfo, AllowanceList, ApiError, BlockAdd, CheckResult, DelayAdd, DomainList,
    GrantRequest, LockAdd, LockInfo, LockList, StatusResult, ToolCall,
};
use tracing::{info, warn};

use crate::agent_client::AgentClient;
use crate::error::HttpApiError;
use crate::token;

/// The caller-visible cap on grant minutes, enforced at both the REST and
/// tool surfaces (§8 Property 8 covers only the tool surface; this
/// implementation applies it uniformly since no internal caller needs
/// more).
pub const MAX_GRANT_MINUTES: u32 = 30;

pub struct AppState {
    pub store: shield_policy::Store,
    pub agent: AgentClient,
    pub bearer_token: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/api/blocked", get(list_blocked))
        .route("/api/block", post(add_block))
        .route("/api/block/{domain}", delete(remove_block))
        .route("/api/check/{domain}", get(check))
        .route("/api/grant", post(grant))
        .route("/api/grant/{domain}", delete(revoke))
        .route("/api/allowances", get(allowances))
        .route("/api/shield/enable", post(shield_enable))
        .route("/api/shield/disable", post(shield_disable))
        .route("/api/delayed", get(list_delayed))
        .route("/api/delay", post(add_delay))
        .route("/api/delay/{domain}", delete(remove_delay))
        .route("/api/locks", get(list_locks))
        .route("/api/lock", post(add_lock))
        .route("/api/lock/{domain}", delete(remove_lock))
        .route("/api/flush-dns", post(flush_dns))
        .route("/api/tool", post(tool))
        .with_state(state)
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResult> {
    let shield = state.store.shield_enabled();
    let blocked_count = state.store.blocked_count();
    let active_allowances = state.store.active_allowances().map(|a| a.len()).unwrap_or(0);
    let daemon_running = state.agent.call(AgentRequest::Status).await.is_ok();

    Json(StatusResult { running: true, shield, daemon_running, blocked_count, active_allowances })
}

async fn list_blocked(State(state): State<Arc<AppState>>) -> Json<DomainList> {
    Json(DomainList { domains: state.store.effective_block_set() })
}

async fn add_block(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BlockAdd>,
) -> Result<Json<BlockAdd>, HttpApiError> {
    let canonical = state.store.add_block(&body.domain)?;

    if let Err(err) = state.agent.call(AgentRequest::EnforceBlock { domain: canonical.clone() }).await {
        warn!(domain = %canonical, %err, "agent enforce-block failed for a freshly added block");
    }

    info!(domain = %canonical, "added block");
    Ok(Json(BlockAdd { domain: canonical }))
}

async fn remove_block(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
) -> Result<StatusCode, HttpApiError> {
    state.store.remove_block(&domain)?;

    let domains = state.store.effective_block_set();
    if let Err(err) = state.agent.call(AgentRequest::Blocklist { domains }).await {
        warn!(%domain, %err, "agent redrive failed after unblock, rolling back");
        if let Err(restore_err) = state.store.add_block(&domain) {
            warn!(%domain, %restore_err, "failed to restore block after rollback");
        }
        return Err(ApiError::AgentUnavailable { message: err.to_string() }.into());
    }

    info!(%domain, "removed block");
    Ok(StatusCode::OK)
}

async fn check(State(state): State<Arc<AppState>>, Path(domain): Path<String>) -> Result<Json<CheckResult>, HttpApiError> {
    let blocked = state.store.is_blocked(&domain)?;
    let allowance_minutes = state.store.remaining_minutes(&domain)?;
    let locked = state.store.hard_lock(&domain).is_some();
    Ok(Json(CheckResult {
        domain,
        blocked,
        allowance_minutes,
        shield_active: state.store.shield_enabled(),
        locked,
    }))
}

async fn grant(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GrantRequest>,
) -> Result<StatusCode, HttpApiError> {
    let allowance = state.store.grant(&body.domain, body.minutes, body.reason.clone(), MAX_GRANT_MINUTES)?;

    if let Err(err) = state
        .agent
        .call(AgentRequest::Grant {
            domain: allowance.domain.clone(),
            minutes: allowance.granted_minutes,
            reason: body.reason,
        })
        .await
    {
        warn!(domain = %allowance.domain, %err, "agent grant failed, rolling back");
        if let Err(revoke_err) = state.store.revoke(&allowance.domain) {
            warn!(domain = %allowance.domain, %revoke_err, "failed to roll back allowance after agent failure");
        }
        return Err(ApiError::AgentUnavailable { message: err.to_string() }.into());
    }

    info!(domain = %allowance.domain, minutes = allowance.granted_minutes, "granted allowance");
    Ok(StatusCode::OK)
}

async fn revoke(State(state): State<Arc<AppState>>, Path(domain): Path<String>) -> Result<StatusCode, HttpApiError> {
    state.store.revoke(&domain)?;
    if let Err(err) = state.agent.call(AgentRequest::Revoke { domain: domain.clone() }).await {
        warn!(%domain, %err, "agent revoke failed");
    }
    info!(%domain, "revoked allowance");
    Ok(StatusCode::OK)
}

async fn allowances(State(state): State<Arc<AppState>>) -> Result<Json<AllowanceList>, HttpApiError> {
    let active = state.store.active_allowances()?;
    let allowances = active
        .into_iter()
        .map(|a| AllowanceInfo {
            domain: a.domain.clone(),
            remaining_minutes: a.remaining_minutes(jiff::Timestamp::now().as_second()),
            granted_minutes: a.granted_minutes,
            reason: a.reason,
        })
        .collect();
    Ok(Json(AllowanceList { allowances }))
}

async fn shield_enable(State(state): State<Arc<AppState>>) -> Result<StatusCode, HttpApiError> {
    state.store.set_shield(true)?;
    let _ = state.agent.call(AgentRequest::Enable).await;
    Ok(StatusCode::OK)
}

async fn shield_disable(State(state): State<Arc<AppState>>) -> Result<StatusCode, HttpApiError> {
    state.store.set_shield(false)?;
    let _ = state.agent.call(AgentRequest::Disable).await;
    Ok(StatusCode::OK)
}

async fn list_delayed(State(state): State<Arc<AppState>>) -> Json<DomainList> {
    Json(DomainList { domains: state.store.delay_list() })
}

async fn add_delay(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DelayAdd>,
) -> Result<Json<DelayAdd>, HttpApiError> {
    let canonical = state.store.add_delay(&body.domain)?;
    Ok(Json(DelayAdd { domain: canonical }))
}

async fn remove_delay(State(state): State<Arc<AppState>>, Path(domain): Path<String>) -> Result<StatusCode, HttpApiError> {
    state.store.remove_delay(&domain)?;
    Ok(StatusCode::OK)
}

async fn list_locks(State(state): State<Arc<AppState>>) -> Result<Json<LockList>, HttpApiError> {
    let locks = state
        .store
        .active_locks()?
        .into_iter()
        .map(|l| LockInfo { domain: l.domain, until: l.until.to_string() })
        .collect();
    Ok(Json(LockList { locks }))
}

async fn add_lock(State(state): State<Arc<AppState>>, Json(body): Json<LockAdd>) -> Result<StatusCode, HttpApiError> {
    let until: jiff::civil::Date = body
        .until
        .parse()
        .map_err(|_| ApiError::Validation { message: format!("invalid date {:?}", body.until) })?;
    state.store.add_lock(&body.domain, until)?;
    Ok(StatusCode::OK)
}

async fn remove_lock(State(state): State<Arc<AppState>>, Path(domain): Path<String>) -> Result<StatusCode, HttpApiError> {
    state.store.remove_lock(&domain)?;
    Ok(StatusCode::OK)
}

async fn flush_dns(State(state): State<Arc<AppState>>) -> Result<StatusCode, HttpApiError> {
    state
        .agent
        .call(AgentRequest::FlushDns)
        .await
        .map_err(HttpApiError::from)?;
    Ok(StatusCode::OK)
}

/// Re-drive the agent with the current effective set; used after a
/// mutation that doesn't already carry its own agent op (block removal).
async fn redrive(state: &AppState) {
    let domains = state.store.effective_block_set();
    if let Err(err) = state.agent.call(AgentRequest::Blocklist { domains }).await {
        warn!(%err, "failed to re-drive agent after policy change");
    }
}

#[derive(serde::Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

async fn tool(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    Json(call): Json<ToolCall>,
) -> Result<Json<serde_json::Value>, HttpApiError> {
    let header_token = headers.get("authorization").and_then(|v| v.to_str().ok());
    let presented = token::extract_from_header(header_token).or(query.token.as_deref());

    if presented != Some(state.bearer_token.as_str()) {
        return Err(ApiError::Validation { message: "invalid or missing bearer token".to_string() }.into());
    }

    match call.call.as_str() {
        "status" => {
            let shield = state.store.shield_enabled();
            let blocked_count = state.store.blocked_count();
            Ok(Json(serde_json::json!({ "shield": shield, "blocked_count": blocked_count })))
        }
        "list" => Ok(Json(serde_json::json!({ "domains": state.store.effective_block_set() }))),
        "check" => {
            let domain = call
                .args
                .get("domain")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ApiError::Validation { message: "missing domain".to_string() })?;
            let blocked = state.store.is_blocked(domain)?;
            Ok(Json(serde_json::json!({ "domain": domain, "blocked": blocked })))
        }
        "grant" => {
            let domain = call
                .args
                .get("domain")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ApiError::Validation { message: "missing domain".to_string() })?;
            let minutes = call.args.get("minutes").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            let allowance = state.store.grant(domain, minutes, None, MAX_GRANT_MINUTES)?;
            let _ = state
                .agent
                .call(AgentRequest::Grant { domain: allowance.domain.clone(), minutes: allowance.granted_minutes, reason: None })
                .await;
            Ok(Json(serde_json::json!({ "domain": allowance.domain, "minutes": allowance.granted_minutes })))
        }
        "add-block" => {
            let domain = call
                .args
                .get("domain")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ApiError::Validation { message: "missing domain".to_string() })?;
            let canonical = state.store.add_block(domain)?;
            let _ = state.agent.call(AgentRequest::EnforceBlock { domain: canonical.clone() }).await;
            Ok(Json(serde_json::json!({ "domain": canonical })))
        }
        "remove-block" => {
            let domain = call
                .args
                .get("domain")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ApiError::Validation { message: "missing domain".to_string() })?;
            state.store.remove_block(domain)?;
            redrive(&state).await;
            Ok(Json(serde_json::json!({ "domain": domain })))
        }
        other => Err(ApiError::Validation { message: format!("unknown tool call {other:?}") }.into()),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use camino::Utf8PathBuf;
    use shield_api::{AgentOutcome, AgentRequest, AgentStatus};
    use tokio::net::UnixListener;
    use tower::ServiceExt;

    use super::*;

    /// A stand-in for the agent: accepts connections on a temp socket and
    /// acks every request, reporting a fixed status for `status` calls.
    async fn spawn_fake_agent(socket_path: Utf8PathBuf) {
        let listener = UnixListener::bind(&socket_path).unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { return };
                tokio::spawn(async move {
                    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
                    let (read_half, mut write_half) = stream.into_split();
                    let mut reader = BufReader::new(read_half);
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    let request: AgentRequest = serde_json::from_str(&line).unwrap();
                    let outcome = match request {
                        AgentRequest::Status => AgentOutcome::Status(AgentStatus {
                            running: true,
                            shield: true,
                            blocked_count: 0,
                            active_allowances: 0,
                        }),
                        _ => AgentOutcome::Ack,
                    };
                    let response: shield_api::AgentResponse = Ok(outcome);
                    let mut reply = serde_json::to_string(&response).unwrap();
                    reply.push('\n');
                    let _ = write_half.write_all(reply.as_bytes()).await;
                });
            }
        });
    }

    fn test_state(dir: &tempfile::TempDir, socket_path: Utf8PathBuf) -> Arc<AppState> {
        let policy_path = Utf8PathBuf::from_path_buf(dir.path().join("policy.toml")).unwrap();
        let store = shield_policy::Store::load(policy_path, &[]).unwrap();
        Arc::new(AppState {
            store,
            agent: AgentClient::new(socket_path),
            bearer_token: "test-token".to_string(),
        })
    }

    #[tokio::test]
    async fn status_reports_agent_reachability() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = Utf8PathBuf::from_path_buf(dir.path().join("agent.sock")).unwrap();
        spawn_fake_agent(socket_path.clone()).await;

        let state = test_state(&dir, socket_path);
        let app = router(state);

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: StatusResult = serde_json::from_slice(&body).unwrap();
        assert!(status.daemon_running);
    }

    #[tokio::test]
    async fn block_add_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = Utf8PathBuf::from_path_buf(dir.path().join("agent.sock")).unwrap();
        spawn_fake_agent(socket_path.clone()).await;

        let state = test_state(&dir, socket_path);
        let app = router(state);

        let add_body = serde_json::to_vec(&BlockAdd { domain: "youtube.com".to_string() }).unwrap();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/block")
                    .header("content-type", "application/json")
                    .body(Body::from(add_body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/api/blocked").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let list: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_json_diff::assert_json_eq!(list, serde_json::json!({ "domains": ["youtube.com"] }));
    }

    #[tokio::test]
    async fn grant_outside_cap_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = Utf8PathBuf::from_path_buf(dir.path().join("agent.sock")).unwrap();
        spawn_fake_agent(socket_path.clone()).await;

        let state = test_state(&dir, socket_path);
        let app = router(state);

        let body = serde_json::to_vec(&GrantRequest {
            domain: "twitter.com".to_string(),
            minutes: 999,
            reason: None,
        })
        .unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/grant")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tool_call_requires_matching_bearer_token() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = Utf8PathBuf::from_path_buf(dir.path().join("agent.sock")).unwrap();
        spawn_fake_agent(socket_path.clone()).await;

        let state = test_state(&dir, socket_path);
        let app = router(state);

        let call = serde_json::to_vec(&ToolCall { call: "status".to_string(), args: serde_json::Value::Null }).unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/tool")
                    .header("content-type", "application/json")
                    .body(Body::from(call))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
