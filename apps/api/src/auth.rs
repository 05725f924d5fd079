//! HTTP Basic authentication for admin endpoints.

use base64::prelude::*;
use pokebot_core::{AppError, AppResult, NonEmptyString};

/// Realm advertised in `WWW-Authenticate` challenges.
pub const ADMIN_REALM: &str = "PokeBot Admin";

/// Admin username and password, configured once at startup.
#[derive(Clone)]
pub struct AdminCredentials {
    username: NonEmptyString,
    password: NonEmptyString,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            username: NonEmptyString::new(username)
                .map_err(|_| AppError::Validation("ADMIN_USER must not be blank".to_owned()))?,
            password: NonEmptyString::new(password)
                .map_err(|_| AppError::Validation("ADMIN_PASS must not be blank".to_owned()))?,
        })
    }

    /// Checks an `Authorization` header value against the configured pair.
    pub fn verify(&self, authorization: Option<&str>) -> AppResult<()> {
        let header = authorization.ok_or_else(|| {
            AppError::Unauthorized("admin credentials required".to_owned())
        })?;
        let (username, password) = parse_basic_auth_header(header)?;

        if username == self.username.as_str() && password == self.password.as_str() {
            Ok(())
        } else {
            Err(AppError::Unauthorized("invalid admin credentials".to_owned()))
        }
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AdminCredentials")
            .field("username", &self.username.as_str())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parses `Basic <base64(username:password)>`. The password may itself
/// contain `:`.
pub fn parse_basic_auth_header(header: &str) -> AppResult<(String, String)> {
    let encoded = header
        .strip_prefix("Basic ")
        .ok_or_else(|| AppError::Unauthorized("expected Basic authorization".to_owned()))?;

    let decoded = BASE64_STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|error| AppError::Unauthorized(format!("invalid base64 credentials: {error}")))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AppError::Unauthorized("credentials must be UTF-8".to_owned()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| AppError::Unauthorized("credentials must be 'user:pass'".to_owned()))?;

    Ok((username.to_owned(), password.to_owned()))
}

#[cfg(test)]
mod tests {
    use base64::prelude::*;

    use super::{AdminCredentials, parse_basic_auth_header};

    fn basic(value: &str) -> String {
        format!("Basic {}", BASE64_STANDARD.encode(value))
    }

    fn credentials() -> AdminCredentials {
        AdminCredentials::new("ash", "pallet:town").unwrap_or_else(|_| panic!("test"))
    }

    #[test]
    fn password_may_contain_colons() {
        let parsed = parse_basic_auth_header(&basic("ash:pallet:town"));
        assert_eq!(
            parsed.ok(),
            Some(("ash".to_owned(), "pallet:town".to_owned()))
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(parse_basic_auth_header("Bearer abc").is_err());
        assert!(parse_basic_auth_header("Basic !!!").is_err());
        assert!(parse_basic_auth_header(&basic("no-colon")).is_err());
    }

    #[test]
    fn verify_accepts_only_the_configured_pair() {
        let credentials = credentials();

        assert!(credentials.verify(Some(&basic("ash:pallet:town"))).is_ok());
        assert!(credentials.verify(Some(&basic("ash:wrong"))).is_err());
        assert!(credentials.verify(Some(&basic("gary:pallet:town"))).is_err());
        assert!(credentials.verify(None).is_err());
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("pallet"));
    }
}
