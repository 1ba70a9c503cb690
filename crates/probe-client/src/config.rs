/// Base URL used when `HODOR_URL` is unset or empty.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding the gateway base URL.
pub const BASE_URL_ENV: &str = "HODOR_URL";

/// Pick the gateway base URL from an optional override.
///
/// A non-empty override is returned verbatim: no trimming, no trailing-slash normalization and
/// no URL validation. Endpoint paths are appended to it as plain strings.
#[must_use]
pub fn resolve_base_url(override_value: Option<String>) -> String {
    match override_value {
        Some(v) if !v.is_empty() => v,
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

/// Resolve the base URL from `HODOR_URL`.
///
/// A value that is not valid unicode is treated as unset.
#[must_use]
pub fn base_url_from_env() -> String {
    resolve_base_url(std::env::var(BASE_URL_ENV).ok())
}

/// A command-line value wins over the environment; either one empty counts as absent.
#[must_use]
pub fn resolve_flag_or_env(flag: Option<String>, env_value: Option<String>) -> String {
    resolve_base_url(flag.filter(|v| !v.is_empty()).or(env_value))
}
