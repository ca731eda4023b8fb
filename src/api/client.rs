use axum::http::HeaderMap;

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const DEFAULT_CLIENT_ID: &str = "default";

const MAX_CLIENT_ID_LEN: usize = 128;

/// Namespace for persisted explorer state, taken from `x-client-id`.
/// Missing, empty or oversized values fall back to `default`.
pub fn client_id(headers: &HeaderMap) -> String {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_CLIENT_ID_LEN)
        .unwrap_or(DEFAULT_CLIENT_ID)
        .to_string()
}
