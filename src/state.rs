//! The agent's in-memory state: its mirror of the policy, its dynamic
//! anchor rules, and the state machine gating IPC acceptance.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use shield_api::{AgentError, AgentOutcome, AgentRequest, AgentResponse, AgentStatus};

use crate::apply;
use crate::config::AgentConfig;
use crate::domain;
use crate::mirror::Mirror;
use crate::surfaces::packetfilter::DynamicRule;

/// `initializing -> restoring -> serving`, plus a terminal `draining` on
/// receipt of a termination signal. Only `serving` accepts IPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Initializing = 0,
    Restoring = 1,
    Serving = 2,
    Draining = 3,
}

impl From<u8> for Phase {
    fn from(value: u8) -> Self {
        match value {
            0 => Phase::Initializing,
            1 => Phase::Restoring,
            2 => Phase::Serving,
            _ => Phase::Draining,
        }
    }
}

struct Inner {
    mirror: Mirror,
    dynamic: Vec<DynamicRule>,
}

pub struct AgentState {
    config: AgentConfig,
    inner: Mutex<Inner>,
    phase: AtomicU8,
}

impl AgentState {
    pub fn new(config: AgentConfig, mirror: Mirror) -> Self {
        AgentState {
            config,
            inner: Mutex::new(Inner { mirror, dynamic: Vec::new() }),
            phase: AtomicU8::new(Phase::Initializing as u8),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        Phase::from(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    fn persist(&self, inner: &Inner) -> Result<(), AgentError> {
        inner
            .mirror
            .save(&self.config.mirror_path)
            .map_err(|message| AgentError::SurfaceApply { message })
    }

    /// Reapply surfaces 1 and 2 from the current mirror, before accepting
    /// IPC. Used on startup recovery (Invariant 5) and exposed for the
    /// `blocklist`, `enable`, and `disable` ops.
    pub async fn reapply(&self) -> Result<(), AgentError> {
        let (shield, domains, dynamic) = {
            let inner = self.inner.lock().unwrap();
            (inner.mirror.shield, inner.mirror.blocklist.iter().cloned().collect::<Vec<_>>(), inner.dynamic.clone())
        };
        apply::reapply_surfaces(&self.config, shield, &domains, &dynamic)
            .await
            .map_err(AgentError::from)
    }

    /// Dispatch one request to completion, returning the response line to
    /// write back over the IPC socket.
    pub async fn handle(&self, request: AgentRequest) -> AgentResponse {
        match request {
            AgentRequest::Status => Ok(AgentOutcome::Status(self.status())),
            AgentRequest::Blocklist { domains } => self.op_blocklist(domains).await,
            AgentRequest::Grant { domain, minutes, reason } => self.op_grant(domain, minutes, reason).await,
            AgentRequest::Revoke { domain } => self.op_revoke(domain).await,
            AgentRequest::EnforceBlock { domain } => self.op_enforce_block(domain).await,
            AgentRequest::Enable => self.op_set_shield(true).await,
            AgentRequest::Disable => self.op_set_shield(false).await,
            AgentRequest::FlushDns => self.op_flush_dns().await,
            AgentRequest::Clear => self.op_clear().await,
        }
    }

    fn status(&self) -> AgentStatus {
        let inner = self.inner.lock().unwrap();
        AgentStatus {
            running: true,
            shield: inner.mirror.shield,
            blocked_count: inner.mirror.blocklist.len(),
            active_allowances: inner.mirror.pending_expiries.len(),
        }
    }

    /// Replace the mirrored effective set and reapply surfaces 1 and 2.
    async fn op_blocklist(&self, domains: Vec<String>) -> AgentResponse {
        let mut canonical = Vec::with_capacity(domains.len());
        for raw in domains {
            canonical.push(normalize(&raw)?);
        }

        let (shield, dynamic) = {
            let mut inner = self.inner.lock().unwrap();
            inner.mirror.blocklist = canonical.iter().cloned().collect();
            self.persist(&inner)?;
            (inner.mirror.shield, inner.dynamic.clone())
        };

        apply::reapply_surfaces(&self.config, shield, &canonical, &dynamic)
            .await
            .map_err(AgentError::from)?;
        Ok(AgentOutcome::Ack)
    }

    async fn op_grant(&self, raw_domain: String, minutes: u32, _reason: Option<String>) -> AgentResponse {
        let canonical = normalize(&raw_domain)?;

        let (shield, domains, mut dynamic) = {
            let mut inner = self.inner.lock().unwrap();
            inner.mirror.blocklist.remove(&canonical);
            let expires_at = jiff::Timestamp::now().as_second() + i64::from(minutes) * 60;
            inner.mirror.pending_expiries.insert(canonical.clone(), expires_at);
            self.persist(&inner)?;
            (
                inner.mirror.shield,
                inner.mirror.blocklist.iter().cloned().collect::<Vec<_>>(),
                inner.dynamic.clone(),
            )
        };

        apply::relax_cascade(&self.config, &canonical, shield, &domains, &mut dynamic)
            .await
            .map_err(AgentError::from)?;
        self.inner.lock().unwrap().dynamic = dynamic;
        Ok(AgentOutcome::Ack)
    }

    /// Shared by `revoke` and the expiry ticker.
    pub async fn op_revoke(&self, raw_domain: String) -> AgentResponse {
        let canonical = normalize(&raw_domain)?;

        let (shield, domains, mut dynamic) = {
            let mut inner = self.inner.lock().unwrap();
            inner.mirror.pending_expiries.remove(&canonical);
            inner.mirror.blocklist.insert(canonical.clone());
            self.persist(&inner)?;
            (
                inner.mirror.shield,
                inner.mirror.blocklist.iter().cloned().collect::<Vec<_>>(),
                inner.dynamic.clone(),
            )
        };

        apply::aggressive_cascade(&self.config, &canonical, shield, &domains, &mut dynamic)
            .await
            .map_err(AgentError::from)?;
        self.inner.lock().unwrap().dynamic = dynamic;
        Ok(AgentOutcome::Ack)
    }

    async fn op_enforce_block(&self, raw_domain: String) -> AgentResponse {
        self.op_revoke(raw_domain).await
    }

    async fn op_set_shield(&self, enabled: bool) -> AgentResponse {
        let (domains, dynamic) = {
            let mut inner = self.inner.lock().unwrap();
            inner.mirror.shield = enabled;
            self.persist(&inner)?;
            (inner.mirror.blocklist.iter().cloned().collect::<Vec<_>>(), inner.dynamic.clone())
        };

        apply::reapply_surfaces(&self.config, enabled, &domains, &dynamic)
            .await
            .map_err(AgentError::from)?;
        Ok(AgentOutcome::Ack)
    }

    async fn op_flush_dns(&self) -> AgentResponse {
        if let Err(err) = crate::surfaces::resolver::flush_cache().await {
            tracing::warn!(%err, "flush-dns failed");
        }
        Ok(AgentOutcome::Ack)
    }

    async fn op_clear(&self) -> AgentResponse {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.mirror.shield = false;
            inner.mirror.pending_expiries.clear();
            inner.dynamic.clear();
            self.persist(&inner)?;
        }
        apply::reapply_surfaces(&self.config, false, &[], &[]).await.map_err(AgentError::from)?;
        Ok(AgentOutcome::Ack)
    }

    /// The domains whose expiry is due, per the expiry ticker's
    /// `prev_active_set \ curr_active_set` rule (§4.2).
    pub fn sweep_expired(&self, now: i64) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap();
        let expired: Vec<String> = inner
            .mirror
            .pending_expiries
            .iter()
            .filter(|(_, expires_at)| now >= **expires_at)
            .map(|(domain, _)| domain.clone())
            .collect();
        for domain in &expired {
            inner.mirror.pending_expiries.remove(domain);
        }
        expired
    }
}

fn normalize(raw: &str) -> Result<String, AgentError> {
    domain::normalize(raw).map_err(|message| AgentError::Validation { message })
}
