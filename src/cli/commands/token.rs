use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::auth::{authenticate_at, decode_unverified};
use crate::cli::utils::{output_details, output_error, output_success};
use crate::cli::OutputFormat;

/// Decoded claims plus the liveness verdict at `now`.
///
/// `Err` carries the decode failure so the caller can report it.
pub fn report(token: &str, now: DateTime<Utc>) -> Result<Value, String> {
    let claims = decode_unverified(token).map_err(|e| e.to_string())?;
    let verdict = authenticate_at(Some(token), now);

    let expires_at = claims.expires_at().map(|at| at.to_rfc3339());

    Ok(json!({
        "authenticated": verdict.authenticated,
        "expires_at": expires_at,
        "role": claims.role,
        "claims": claims,
    }))
}

pub fn handle(token: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let data = match report(token, Utc::now()) {
        Ok(data) => data,
        Err(reason) => {
            return output_error(
                &output_format,
                &format!("Token could not be decoded: {}", reason),
                Some("TOKEN_UNDECODABLE"),
                None,
            );
        }
    };

    if data["authenticated"] == true {
        output_success(&output_format, "Token is live", Some(data.clone()))?;
    } else {
        output_error(&output_format, "Token is expired", Some("TOKEN_EXPIRED"), Some(data.clone()))?;
    }

    output_details(
        &output_format,
        &[
            ("expires", data["expires_at"].as_str().unwrap_or("never").to_string()),
            ("role", data["role"].as_str().unwrap_or("-").to_string()),
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"any")).unwrap()
    }

    #[test]
    fn test_live_token() {
        let now = Utc::now();
        let token = mint(json!({ "exp": (now + Duration::minutes(5)).timestamp(), "role": "staff" }));

        let data = report(&token, now).unwrap();
        assert_eq!(data["authenticated"], true);
        assert_eq!(data["role"], "staff");
        assert!(data["expires_at"].is_string());
    }

    #[test]
    fn test_expired_token_still_reports_claims() {
        let now = Utc::now();
        let token = mint(json!({ "exp": (now - Duration::minutes(5)).timestamp(), "role": "staff" }));

        let data = report(&token, now).unwrap();
        assert_eq!(data["authenticated"], false);
        assert_eq!(data["claims"]["role"], "staff");
    }

    #[test]
    fn test_garbage_token() {
        assert!(report("not-a-jwt", Utc::now()).is_err());
    }
}
