// === utils.rs ===

use chrono::Utc;
use serde_json::json;
use warp::http::StatusCode;

/// Returns the current UTC timestamp in nanoseconds.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

/// Standard status-message reply used across both REST surfaces.
pub fn json_status(status: StatusCode, message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&json!({ "message": message })), status)
}

/// Maps filter rejections (bad JSON bodies, wrong methods, unknown paths)
/// onto the generic failure reply.
pub async fn handle_rejection(
    err: warp::Rejection,
) -> Result<impl warp::Reply, std::convert::Infallible> {
    if err.is_not_found() {
        return Ok(json_status(StatusCode::NOT_FOUND, "fail"));
    }
    Ok(json_status(StatusCode::BAD_REQUEST, "fail"))
}
