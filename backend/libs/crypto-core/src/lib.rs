//! Cryptographic building blocks for ProPulse services
//!
//! ## Modules
//! - `jwt`: signing keys plus session and invitation token claims
//! - `password`: Argon2id password hashing

pub mod jwt;
pub mod password;

pub use jwt::{
    InvitationClaims, Memberships, PrivilegeGrant, SessionClaims, TokenError, TokenKeys,
    TokenType, NO_JOBS_MESSAGE,
};
