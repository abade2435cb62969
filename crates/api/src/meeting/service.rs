//! Meeting SDK token issuance

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::signer::{sign_token, SignError, TokenHeader};

/// Backdate `iat` to tolerate clock skew on the consumer side
pub const ISSUED_AT_SKEW_SECS: i64 = 30;

/// Token lifetime counted from `iat`
pub const TOKEN_VALIDITY_SECS: i64 = 60 * 60 * 2;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("meetingNumber is required")]
    MissingParameter,
    #[error("Meeting signing key is not configured")]
    SigningKeyUnavailable,
    #[error("Token encoding failed: {0}")]
    Encoding(#[from] SignError),
}

/// Claims understood by the meeting SDK
///
/// Field order and names are what the SDK expects; `exp` is repeated as
/// `tokenExp` and the key as `appKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingClaims {
    #[serde(rename = "sdkKey")]
    pub signer_key: String,
    #[serde(rename = "mn")]
    pub meeting_number: String,
    pub role: i64,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "appKey")]
    pub audience_key: String,
    #[serde(rename = "tokenExp")]
    pub token_expires_at: i64,
}

/// A signed token together with the parts it was built from
#[derive(Debug, Clone)]
pub struct MeetingToken {
    pub header: TokenHeader,
    pub claims: MeetingClaims,
    pub token: String,
}

impl fmt::Display for MeetingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Coerce a loosely-typed role to an integer, defaulting to 0
pub fn coerce_role(role: Option<&Value>) -> i64 {
    match role {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[derive(Clone)]
pub struct MeetingTokenService {
    signer_key: Option<String>,
    secret: Option<Arc<[u8]>>,
}

impl fmt::Debug for MeetingTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeetingTokenService")
            .field("signer_key", &self.signer_key)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl MeetingTokenService {
    /// Empty values count as not configured
    pub fn new(signer_key: Option<String>, secret: Option<String>) -> Self {
        Self {
            signer_key: signer_key.filter(|k| !k.is_empty()),
            secret: secret
                .filter(|s| !s.is_empty())
                .map(|s| Arc::from(s.into_bytes())),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.signer_key.is_some() && self.secret.is_some()
    }

    /// Issue a token valid from now (minus skew) for two hours
    pub fn issue_token(&self, meeting_number: &str, role: i64) -> Result<MeetingToken, TokenError> {
        self.issue_token_at(meeting_number, role, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Issue a token as if the current Unix time were `now`
    pub fn issue_token_at(
        &self,
        meeting_number: &str,
        role: i64,
        now: i64,
    ) -> Result<MeetingToken, TokenError> {
        let meeting_number = meeting_number.trim();
        if meeting_number.is_empty() {
            return Err(TokenError::MissingParameter);
        }

        let (Some(signer_key), Some(secret)) = (&self.signer_key, &self.secret) else {
            tracing::error!("Meeting token requested but ZOOM_SDK_KEY/ZOOM_SDK_SECRET are not set");
            return Err(TokenError::SigningKeyUnavailable);
        };

        let iat = now - ISSUED_AT_SKEW_SECS;
        let exp = iat + TOKEN_VALIDITY_SECS;

        let header = TokenHeader::default();
        let claims = MeetingClaims {
            signer_key: signer_key.clone(),
            meeting_number: meeting_number.to_string(),
            role,
            iat,
            exp,
            audience_key: signer_key.clone(),
            token_expires_at: exp,
        };

        let token = sign_token(&header, &claims, secret)?;

        tracing::debug!(meeting_number = %meeting_number, role, iat, exp, "Issued meeting token");

        Ok(MeetingToken {
            header,
            claims,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use hmac::{Hmac, Mac};
    use serde_json::json;
    use sha2::Sha256;

    const SECRET: &str = "test-sdk-secret";

    fn service() -> MeetingTokenService {
        MeetingTokenService::new(Some("test-sdk-key".to_string()), Some(SECRET.to_string()))
    }

    fn decode(segment: &str) -> Value {
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
    }

    #[test]
    fn test_issue_token_structure() {
        let token = service().issue_token("12345678901", 1).unwrap();
        let parts: Vec<&str> = token.token.split('.').collect();
        assert_eq!(parts.len(), 3);

        assert_eq!(decode(parts[0]), json!({"alg": "HS256", "typ": "JWT"}));

        let payload = decode(parts[1]);
        assert_eq!(payload["mn"], "12345678901");
        assert_eq!(payload["role"], 1);
        assert_eq!(payload["sdkKey"], "test-sdk-key");
        assert_eq!(payload["appKey"], "test-sdk-key");
        let iat = payload["iat"].as_i64().unwrap();
        assert_eq!(payload["exp"].as_i64().unwrap(), iat + 7200);
        assert_eq!(payload["tokenExp"], payload["exp"]);
    }

    #[test]
    fn test_signature_verifies_with_secret() {
        let token = service().issue_token("12345678901", 1).unwrap();
        let (signing_input, signature) = token.token.rsplit_once('.').unwrap();

        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&URL_SAFE_NO_PAD.decode(signature).unwrap())
            .expect("signature must verify");
    }

    #[test]
    fn test_signature_verifies_as_standard_jwt() {
        let token = service().issue_token("12345678901", 0).unwrap();

        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let decoded = jsonwebtoken::decode::<MeetingClaims>(
            &token.token,
            &jsonwebtoken::DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims, token.claims);
    }

    #[test]
    fn test_issue_token_at_is_deterministic() {
        let a = service().issue_token_at("987", 0, 1_700_000_000).unwrap();
        let b = service().issue_token_at("987", 0, 1_700_000_000).unwrap();
        assert_eq!(a.token, b.token);
        assert_eq!(a.claims.iat, 1_700_000_000 - 30);
        assert_eq!(a.claims.exp, 1_700_000_000 - 30 + 7200);
    }

    #[test]
    fn test_payload_field_order() {
        let token = service().issue_token_at("1", 0, 100).unwrap();
        let payload = token.token.split('.').nth(1).unwrap();
        let raw = String::from_utf8(URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(
            raw,
            r#"{"sdkKey":"test-sdk-key","mn":"1","role":0,"iat":70,"exp":7270,"appKey":"test-sdk-key","tokenExp":7270}"#
        );
    }

    #[test]
    fn test_missing_meeting_number() {
        assert!(matches!(
            service().issue_token("", 0),
            Err(TokenError::MissingParameter)
        ));
        assert!(matches!(
            service().issue_token("  ", 0),
            Err(TokenError::MissingParameter)
        ));
    }

    #[test]
    fn test_missing_secret_fails_issuance_only() {
        let service = MeetingTokenService::new(Some("key".to_string()), None);
        assert!(!service.is_configured());
        assert!(matches!(
            service.issue_token("123", 0),
            Err(TokenError::SigningKeyUnavailable)
        ));

        let service = MeetingTokenService::new(Some("key".to_string()), Some(String::new()));
        assert!(matches!(
            service.issue_token("123", 0),
            Err(TokenError::SigningKeyUnavailable)
        ));
    }

    #[test]
    fn test_missing_meeting_number_checked_before_key() {
        let service = MeetingTokenService::new(None, None);
        assert!(matches!(
            service.issue_token("", 0),
            Err(TokenError::MissingParameter)
        ));
    }

    #[test]
    fn test_coerce_role() {
        assert_eq!(coerce_role(None), 0);
        assert_eq!(coerce_role(Some(&json!(1))), 1);
        assert_eq!(coerce_role(Some(&json!("1"))), 1);
        assert_eq!(coerce_role(Some(&json!(" 5 "))), 5);
        assert_eq!(coerce_role(Some(&json!(1.0))), 1);
        assert_eq!(coerce_role(Some(&json!("host"))), 0);
        assert_eq!(coerce_role(Some(&json!(1.5))), 0);
        assert_eq!(coerce_role(Some(&Value::Null)), 0);
        assert_eq!(coerce_role(Some(&json!(true))), 0);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", service());
        assert!(!rendered.contains(SECRET));
    }
}
