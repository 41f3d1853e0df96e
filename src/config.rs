use std::path::Path;

use crate::error::AppError;

/// Base URL of the habit service: `--api-url` flag, then HABITDASH_API_URL.
/// There is no default; the client is useless without a backend.
pub fn resolve_api_base_url(cli_api_url: Option<&str>) -> Result<String, AppError> {
    if let Some(u) = cli_api_url.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return Ok(u.trim_end_matches('/').to_string());
    }

    if let Ok(u) = std::env::var("HABITDASH_API_URL") {
        let u = u.trim().to_string();
        if !u.is_empty() {
            return Ok(u.trim_end_matches('/').to_string());
        }
    }

    Err(AppError::usage(
        "API base URL is required (--api-url or HABITDASH_API_URL)",
    ))
}

/// Session file path: `--session` flag, then HABITDASH_SESSION_PATH, then
/// XDG data dir, then ~/.local/share.
pub fn resolve_session_path(cli_session_path: Option<&str>) -> Result<String, AppError> {
    if let Some(p) = cli_session_path.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return Ok(p.to_string());
    }

    if let Ok(p) = std::env::var("HABITDASH_SESSION_PATH") {
        let p = p.trim().to_string();
        if !p.is_empty() {
            return Ok(p);
        }
    }

    let base = std::env::var("XDG_DATA_HOME")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let home = std::env::var("HOME")
        .ok()
        .or_else(|| std::env::var("USERPROFILE").ok());

    let base = match (base, home) {
        (Some(b), _) => b,
        (None, Some(h)) => Path::new(&h)
            .join(".local")
            .join("share")
            .to_string_lossy()
            .to_string(),
        (None, None) => return Err(AppError::io("Cannot resolve a session path")),
    };

    Ok(Path::new(&base)
        .join("habitdash")
        .join("session.json")
        .to_string_lossy()
        .to_string())
}
