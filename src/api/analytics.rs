//! Admin analytics endpoint
//!
//! Dashboard numbers: content counts by status, submission queue depth,
//! process/system resource usage, and the request counters collected by
//! the stats middleware. Gated by `analytics.view`.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::process;
use sysinfo::{Pid, System};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::models::{permissions, PostStatus, VoiceStatus};

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Admin analytics routes (mounted behind the auth middleware)
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/", get(get_analytics))
}

/// Analytics response payload
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub content: ContentStats,
    pub system: SystemStats,
    pub requests: RequestCounters,
}

/// Content counts by status
#[derive(Debug, Serialize)]
pub struct ContentStats {
    pub posts_draft: i64,
    pub posts_published: i64,
    pub posts_archived: i64,
    pub voices_pending: i64,
    pub voices_published: i64,
    pub voices_rejected: i64,
    pub total_users: i64,
}

/// Process and host resource usage
#[derive(Debug, Serialize)]
pub struct SystemStats {
    pub version: String,
    /// Process memory usage in bytes
    pub memory_bytes: u64,
    /// Process memory usage formatted (e.g., "45.2 MB")
    pub memory_formatted: String,
    pub system_total_memory: u64,
    pub system_used_memory: u64,
    pub os_name: String,
}

/// Counters from the request stats middleware
#[derive(Debug, Serialize)]
pub struct RequestCounters {
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
    pub uptime_seconds: u64,
    /// Uptime formatted (e.g., "2h 15m")
    pub uptime_formatted: String,
}

/// GET /api/admin/analytics
async fn get_analytics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<AnalyticsResponse>>, ApiError> {
    user.require_permission(permissions::ANALYTICS_VIEW)?;

    let content = ContentStats {
        posts_draft: state.post_service.count_by_status(PostStatus::Draft).await?,
        posts_published: state
            .post_service
            .count_by_status(PostStatus::Published)
            .await?,
        posts_archived: state
            .post_service
            .count_by_status(PostStatus::Archived)
            .await?,
        voices_pending: state
            .voice_service
            .count_by_status(VoiceStatus::Pending)
            .await?,
        voices_published: state
            .voice_service
            .count_by_status(VoiceStatus::Published)
            .await?,
        voices_rejected: state
            .voice_service
            .count_by_status(VoiceStatus::Rejected)
            .await?,
        total_users: state.auth_service.count_users().await?,
    };

    let mut sys = System::new_all();
    sys.refresh_all();

    let pid = Pid::from_u32(process::id());
    let memory_bytes = sys.process(pid).map(|p| p.memory()).unwrap_or(0);

    let system = SystemStats {
        version: APP_VERSION.to_string(),
        memory_bytes,
        memory_formatted: format_bytes(memory_bytes),
        system_total_memory: sys.total_memory(),
        system_used_memory: sys.used_memory(),
        os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
    };

    let uptime_seconds = state.request_stats.uptime_seconds();
    let requests = RequestCounters {
        total_requests: state.request_stats.total_requests(),
        avg_response_time_ms: state.request_stats.avg_response_time_us() / 1000.0,
        uptime_seconds,
        uptime_formatted: format_uptime(uptime_seconds),
    };

    Ok(Json(ApiResponse::ok(AnalyticsResponse {
        content,
        system,
        requests,
    })))
}

/// Format uptime to human readable string
fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Format a byte count to a human readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(150), "2m");
        assert_eq!(format_uptime(8100), "2h 15m");
        assert_eq!(format_uptime(90_061), "1d 1h 1m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(47_395_635), "45.20 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
