use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claims carried by a session token.
///
/// Only `exp` drives the gate; the rest is passed along to collaborators
/// (the permission store reads `role`, the whoami endpoint echoes everything).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Expiry as a NumericDate: seconds since epoch, possibly fractional
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default)]
    pub sub: Option<String>,
    /// Role identifier used to pick a permission document
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionClaims {
    /// A token is live iff `exp * 1000 > now` in milliseconds
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => exp * 1000.0 > now.timestamp_millis() as f64,
            None => false,
        }
    }

    /// Expiry as a timestamp, when present and representable
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp
            .filter(|exp| exp.is_finite())
            .and_then(|exp| DateTime::from_timestamp_millis((exp * 1000.0) as i64))
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is not in header.payload.signature form")]
    Malformed,

    #[error("invalid base64url in token {segment}: {source}")]
    Encoding {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("invalid JSON in token {segment}: {source}")]
    Json {
        segment: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn decode_segment<T: serde::de::DeserializeOwned>(raw: &str, segment: &'static str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(raw.trim_end_matches('='))
        .map_err(|source| TokenError::Encoding { segment, source })?;
    serde_json::from_slice(&bytes).map_err(|source| TokenError::Json { segment, source })
}

/// Decode a token's claims without verifying its signature.
///
/// The header must be a JSON object but its `alg` is never interpreted, so
/// unsigned (`alg: none`) tokens decode like any other. The verdict derived
/// from this is advisory and only drives page routing; the backend that
/// issued the token remains responsible for enforcing it.
pub fn decode_unverified(token: &str) -> Result<SessionClaims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let _: Map<String, Value> = decode_segment(header, "header")?;
    decode_segment(payload, "payload")
}

/// Outcome of inspecting the session token
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthVerdict {
    pub authenticated: bool,
    /// Decoded claims, present whenever the token decoded (even if expired)
    pub claims: Option<SessionClaims>,
}

impl AuthVerdict {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<&str> {
        self.claims.as_ref().and_then(|c| c.role.as_deref())
    }
}

/// Authenticate a session token against the given clock.
///
/// Decode failures are logged and treated as an absent token.
pub fn authenticate_at(token: Option<&str>, now: DateTime<Utc>) -> AuthVerdict {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return AuthVerdict::anonymous(),
    };

    match decode_unverified(token) {
        Ok(claims) => {
            let authenticated = claims.is_live_at(now);
            if !authenticated {
                tracing::debug!("Session token expired (exp: {:?})", claims.exp);
            }
            AuthVerdict {
                authenticated,
                claims: Some(claims),
            }
        }
        Err(e) => {
            tracing::warn!("Failed to decode session token: {}", e);
            AuthVerdict::anonymous()
        }
    }
}

pub fn authenticate(token: Option<&str>) -> AuthVerdict {
    authenticate_at(token, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn mint(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"issuer-secret")).unwrap()
    }

    #[test]
    fn test_missing_token() {
        assert!(!authenticate(None).authenticated);
        assert!(!authenticate(Some("")).authenticated);
        assert!(!authenticate(Some("   ")).authenticated);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let past = mint(json!({ "exp": (now - Duration::seconds(1)).timestamp() }));
        let future = mint(json!({ "exp": (now + Duration::seconds(1)).timestamp() }));

        assert!(!authenticate_at(Some(&past), now).authenticated);
        assert!(authenticate_at(Some(&future), now).authenticated);
    }

    #[test]
    fn test_exp_compared_in_milliseconds() {
        let now = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_500).unwrap();

        let same_second = mint(json!({ "exp": 1_700_000_000 }));
        assert!(!authenticate_at(Some(&same_second), now).authenticated);

        let next_second = mint(json!({ "exp": 1_700_000_001 }));
        assert!(authenticate_at(Some(&next_second), now).authenticated);
    }

    #[test]
    fn test_undecodable_token() {
        let verdict = authenticate(Some("definitely-not-a-jwt"));
        assert!(!verdict.authenticated);
        assert!(verdict.claims.is_none());

        let verdict = authenticate(Some("aaa.bbb.ccc"));
        assert!(!verdict.authenticated);
    }

    #[test]
    fn test_signature_is_not_verified() {
        let token = encode(
            &Header::default(),
            &json!({ "exp": (Utc::now() + Duration::hours(1)).timestamp(), "role": "admin" }),
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        let verdict = authenticate(Some(&token));
        assert!(verdict.authenticated);
        assert_eq!(verdict.role(), Some("admin"));
    }

    #[test]
    fn test_missing_exp_is_not_live() {
        let token = mint(json!({ "sub": "u-1" }));
        let verdict = authenticate(Some(&token));
        assert!(!verdict.authenticated);
        assert_eq!(verdict.claims.unwrap().sub.as_deref(), Some("u-1"));
    }

    fn unsigned(header: Value, claims: Value) -> String {
        format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    #[test]
    fn test_unsigned_token_is_decoded() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = unsigned(json!({ "alg": "none", "typ": "JWT" }), json!({ "exp": exp, "role": "staff" }));

        let verdict = authenticate(Some(&token));
        assert!(verdict.authenticated);
        assert_eq!(verdict.role(), Some("staff"));
    }

    #[test]
    fn test_unknown_algorithm_is_decoded() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = unsigned(json!({ "alg": "XS999" }), json!({ "exp": exp }));

        assert!(authenticate(Some(&token)).authenticated);
    }

    #[test]
    fn test_fractional_exp() {
        let now = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_500).unwrap();
        let header = json!({ "alg": "HS256" });

        let live = unsigned(header.clone(), json!({ "exp": 1_700_000_000.75 }));
        assert!(authenticate_at(Some(&live), now).authenticated);

        let dead = unsigned(header, json!({ "exp": 1_700_000_000.25 }));
        assert!(!authenticate_at(Some(&dead), now).authenticated);
    }

    #[test]
    fn test_header_must_be_json() {
        let token = format!("not-json.{}.sig", URL_SAFE_NO_PAD.encode(r#"{"exp":9999999999}"#));
        assert!(matches!(decode_unverified(&token), Err(TokenError::Json { segment: "header", .. })));
        assert!(matches!(decode_unverified("only.two"), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_extra_claims_are_kept() {
        let token = mint(json!({
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
            "company": "acme",
            "aud": "web"
        }));

        let claims = authenticate(Some(&token)).claims.unwrap();
        assert_eq!(claims.extra["company"], "acme");
        assert_eq!(claims.extra["aud"], "web");
    }
}
