//! The agent's primary expiry sweep (§4.2): a timer with period ≤ 30 s
//! that re-blocks any domain whose allowance has expired since the last
//! sweep.

use std::sync::Arc;
use std::time::Duration;

use crate::state::AgentState;

pub const SWEEP_PERIOD: Duration = Duration::from_secs(30);

pub async fn run(state: Arc<AgentState>) {
    let mut interval = tokio::time::interval(SWEEP_PERIOD);
    loop {
        interval.tick().await;
        if state.phase() != crate::state::Phase::Serving {
            continue;
        }

        let now = jiff::Timestamp::now().as_second();
        for domain in state.sweep_expired(now) {
            tracing::debug!(domain, "allowance expired, re-enforcing");
            if let Err(err) = state.op_revoke(domain.clone()).await {
                tracing::warn!(domain, %err, "expiry revoke cascade failed");
            }
        }
    }
}
