/// Header carrying the caller's API key on every authenticated route.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Returns the trimmed key, or `None` when the header value is missing or blank.
pub fn extract_api_key(header_value: Option<&str>) -> Option<&str> {
    header_value.map(str::trim).filter(|key| !key.is_empty())
}
