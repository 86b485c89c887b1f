use http::header::AUTHORIZATION;
use http::HeaderMap;
use http::HeaderName;

use crate::errors::TokenError;

pub const ACCESS_HEADER: &str = "Authorization";
pub const REFRESH_HEADER: &str = "Refresh";
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer token from the `Authorization` header.
///
/// # Errors
/// * `MissingHeader` - Header absent
/// * `MalformedHeader` - Header is not text, lacks the `Bearer ` prefix, or
///   carries an empty token
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = header_str(headers, &AUTHORIZATION, ACCESS_HEADER)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(TokenError::MalformedHeader(ACCESS_HEADER))?;

    if token.is_empty() {
        return Err(TokenError::MalformedHeader(ACCESS_HEADER));
    }
    Ok(token)
}

/// Extract the raw refresh token from the `Refresh` header.
///
/// # Errors
/// * `MissingHeader` - Header absent
/// * `MalformedHeader` - Header is not text or is empty
pub fn extract_refresh_header(headers: &HeaderMap) -> Result<&str, TokenError> {
    let name = HeaderName::from_static("refresh");
    let token = header_str(headers, &name, REFRESH_HEADER)?.trim();

    if token.is_empty() {
        return Err(TokenError::MalformedHeader(REFRESH_HEADER));
    }
    Ok(token)
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &HeaderName,
    label: &'static str,
) -> Result<&'a str, TokenError> {
    headers
        .get(name)
        .ok_or(TokenError::MissingHeader(label))?
        .to_str()
        .map_err(|_| TokenError::MalformedHeader(label))
}
