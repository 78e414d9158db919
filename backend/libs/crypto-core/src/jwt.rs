/// Signed tokens for ProPulse services
///
/// Two kinds of token are issued with the same key material:
///
/// - **Session tokens** identify a logged-in user and carry their current job
///   memberships. They have no expiry and are re-issued whenever the
///   membership set changes (job creation, invitation acceptance, profile
///   update).
/// - **Invitation tokens** are unpersisted capabilities that let one specific
///   user join one specific job. They expire after a configured TTL.
///
/// Every token carries a `token_type` claim and verification rejects a token
/// of the other kind, so an invitation can never be replayed as a session and
/// vice versa.
///
/// ## Usage
///
/// Keys are built once at startup and passed to whoever needs them:
///
/// ```rust,ignore
/// use crypto_core::jwt::{SessionClaims, TokenKeys};
///
/// let keys = TokenKeys::from_secret("secret-dev")?;
/// let token = keys.issue_session_token(&SessionClaims::new(1, "u1@example.com", vec![1, 4]))?;
/// let claims = keys.verify_session_token(&token)?;
/// assert_eq!(claims.jobs(), &[1, 4]);
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Placed in a session token instead of `jobs` when the user has no memberships
pub const NO_JOBS_MESSAGE: &str = "The user is not associated with any projects";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("failed to encode token: {0}")]
    Encode(String),

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,

    #[error("expected a {expected} token, found a {found} token")]
    WrongType { expected: TokenType, found: TokenType },
}

pub type Result<T> = std::result::Result<T, TokenError>;

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Session,
    Invitation,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Session => write!(f, "session"),
            TokenType::Invitation => write!(f, "invitation"),
        }
    }
}

/// Membership section of a session token.
///
/// Serialized either as `"jobs": [..]` or as `"message": "<no jobs>"`; the two
/// shapes never appear together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Memberships {
    Jobs { jobs: Vec<i32> },
    NoJobs { message: String },
}

/// Claims of a session (bearer) token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub id: i32,
    pub email: String,
    #[serde(flatten)]
    pub memberships: Memberships,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub token_type: TokenType,
}

impl SessionClaims {
    /// Build claims for a user, choosing the no-jobs marker for an empty job list
    pub fn new(id: i32, email: impl Into<String>, jobs: Vec<i32>) -> Self {
        let memberships = if jobs.is_empty() {
            Memberships::NoJobs {
                message: NO_JOBS_MESSAGE.to_string(),
            }
        } else {
            Memberships::Jobs { jobs }
        };

        Self {
            id,
            email: email.into(),
            memberships,
            iat: Utc::now().timestamp(),
            token_type: TokenType::Session,
        }
    }

    /// Job ids embedded in the token; empty for the no-jobs shape
    pub fn jobs(&self) -> &[i32] {
        match &self.memberships {
            Memberships::Jobs { jobs } => jobs,
            Memberships::NoJobs { .. } => &[],
        }
    }
}

/// Whether an invitation grants trusted privilege on acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivilegeGrant {
    Yes,
    No,
}

impl PrivilegeGrant {
    pub fn is_granted(self) -> bool {
        matches!(self, PrivilegeGrant::Yes)
    }
}

impl From<bool> for PrivilegeGrant {
    fn from(granted: bool) -> Self {
        if granted {
            PrivilegeGrant::Yes
        } else {
            PrivilegeGrant::No
        }
    }
}

/// Claims of an invitation capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationClaims {
    /// Id of the invited user
    pub invited: i32,
    pub privilege: PrivilegeGrant,
    #[serde(rename = "jobId")]
    pub job_id: i32,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenType,
}

impl InvitationClaims {
    pub fn new(invited: i32, job_id: i32, privilege: PrivilegeGrant, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            invited,
            privilege,
            job_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: TokenType::Invitation,
        }
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Signing and verification keys for one process.
///
/// Built from configuration at startup and shared (behind `web::Data`) with
/// every component that issues or checks tokens. Tests construct their own
/// instance with a throwaway secret.
#[derive(Clone)]
pub struct TokenKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("algorithm", &self.algorithm)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl TokenKeys {
    /// HS256 keys from a shared secret
    pub fn from_secret(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(TokenError::InvalidKey("secret must not be empty".into()));
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// RS256 keys from PEM-encoded RSA key material
    pub fn from_rsa_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(format!("RSA private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(format!("RSA public key: {e}")))?;

        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding,
            decoding,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    // ------------------------------------------------------------------------
    // Session tokens
    // ------------------------------------------------------------------------

    pub fn issue_session_token(&self, claims: &SessionClaims) -> Result<String> {
        self.sign(claims)
    }

    /// Verify a bearer token. Session tokens carry no `exp`, so none is required.
    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims: SessionClaims = self.verify(token, &validation)?;
        ensure_type(TokenType::Session, claims.token_type)?;
        Ok(claims)
    }

    // ------------------------------------------------------------------------
    // Invitation tokens
    // ------------------------------------------------------------------------

    pub fn issue_invitation_token(&self, claims: &InvitationClaims) -> Result<String> {
        self.sign(claims)
    }

    /// Verify an invitation capability, rejecting expired or foreign tokens
    pub fn verify_invitation_token(&self, token: &str) -> Result<InvitationClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        let claims: InvitationClaims = self.verify(token, &validation)?;
        ensure_type(TokenType::Invitation, claims.token_type)?;
        Ok(claims)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        encode(&Header::new(self.algorithm), claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, validation: &Validation) -> Result<T> {
        decode::<T>(token, &self.decoding, validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

fn ensure_type(expected: TokenType, found: TokenType) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        tracing::debug!(%expected, %found, "rejected token of the wrong type");
        Err(TokenError::WrongType { expected, found })
    }
}

// ============================================================================
// Tests
// ============================================================================
