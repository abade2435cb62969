//! Meeting authorization tokens

pub mod service;
pub mod signer;

pub use service::{
    coerce_role, MeetingClaims, MeetingToken, MeetingTokenService, TokenError,
    ISSUED_AT_SKEW_SECS, TOKEN_VALIDITY_SECS,
};
pub use signer::{sign_token, SignError, TokenHeader};
