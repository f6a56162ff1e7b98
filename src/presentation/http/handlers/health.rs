//! Health Check Handlers
//!
//! `GET /health` answers cheaply for load balancers. `/health/live` and
//! `/health/ready` back Kubernetes-style probes; readiness checks the
//! real dependencies and reports per-service detail.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::startup::AppState;

/// Process start marker, fixed the first time anything touches it.
struct Boot {
    instant: Instant,
    at: DateTime<Utc>,
}

static BOOT: Lazy<Boot> = Lazy::new(|| Boot {
    instant: Instant::now(),
    at: Utc::now(),
});

/// Pin the boot marker early so uptime counts from process start, not
/// from the first readiness call.
pub fn init_server_start() {
    Lazy::force(&BOOT);
}

/// Health of one service or of the process as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Healthy,
    Degraded,
    Unhealthy,
}

/// One checked dependency.
#[derive(Debug, Serialize)]
pub struct DependencyReport {
    pub status: Condition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DependencyReport {
    /// Classify a successful round trip by latency.
    fn ok(latency_ms: u64, degraded_above_ms: u64) -> Self {
        let status = if latency_ms < degraded_above_ms {
            Condition::Healthy
        } else {
            Condition::Degraded
        };
        Self {
            status,
            latency_ms: Some(latency_ms),
            message: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            status: Condition::Unhealthy,
            latency_ms: None,
            message: Some(message),
        }
    }
}

/// Event hub load, reported for visibility rather than gating.
#[derive(Debug, Serialize)]
pub struct HubReport {
    pub status: Condition,
    pub active_subscribers: usize,
    pub channels: usize,
}

#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub status: Condition,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub database: DependencyReport,
    pub redis: DependencyReport,
    pub events: HubReport,
}

/// Basic health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe; answering at all is the signal
pub async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

/// Readiness probe. Returns 503 while a hard dependency is down so the
/// orchestrator keeps traffic away.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(&state).await;
    let redis = check_redis(&state).await;

    // The in-process hub cannot fail on its own; report its load
    let events = HubReport {
        status: Condition::Healthy,
        active_subscribers: state.hub.subscriber_count(),
        channels: state.hub.channel_count(),
    };

    let status = overall(&database, &redis);
    let http_status = match status {
        Condition::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    let report = ReadinessReport {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: BOOT.instant.elapsed().as_secs(),
        started_at: BOOT.at.to_rfc3339(),
        checks: ReadinessChecks {
            database,
            redis,
            events,
        },
    };

    (http_status, Json(report))
}

async fn check_database(state: &AppState) -> DependencyReport {
    let start = Instant::now();
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => DependencyReport::ok(start.elapsed().as_millis() as u64, 100),
        Err(e) => DependencyReport::failed(format!("Database connection failed: {}", e)),
    }
}

async fn check_redis(state: &AppState) -> DependencyReport {
    let start = Instant::now();
    let mut conn = state.redis.clone();
    match redis::cmd("PING").query_async::<String>(&mut conn).await {
        Ok(_) => DependencyReport::ok(start.elapsed().as_millis() as u64, 50),
        Err(e) => DependencyReport::failed(format!("Redis connection failed: {}", e)),
    }
}

/// A dead database blocks traffic outright. A slow database or any Redis
/// trouble only degrades: requests still work, push delivery may not.
fn overall(db: &DependencyReport, redis: &DependencyReport) -> Condition {
    if db.status == Condition::Unhealthy {
        return Condition::Unhealthy;
    }
    if db.status == Condition::Degraded || redis.status != Condition::Healthy {
        return Condition::Degraded;
    }
    Condition::Healthy
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn condition_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Condition::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test]
    fn fast_round_trip_is_healthy() {
        let report = DependencyReport::ok(3, 100);
        assert_eq!(report.status, Condition::Healthy);
        assert_eq!(report.latency_ms, Some(3));
    }

    #[test]
    fn slow_round_trip_is_degraded() {
        assert_eq!(DependencyReport::ok(250, 100).status, Condition::Degraded);
    }

    #[test]
    fn overall_rules() {
        let healthy = DependencyReport::ok(5, 100);
        let degraded = DependencyReport::ok(500, 100);
        let dead = DependencyReport::failed("gone".into());

        assert_eq!(overall(&healthy, &healthy), Condition::Healthy);
        assert_eq!(overall(&degraded, &healthy), Condition::Degraded);
        assert_eq!(overall(&healthy, &dead), Condition::Degraded);
        assert_eq!(overall(&dead, &healthy), Condition::Unhealthy);
    }
}
