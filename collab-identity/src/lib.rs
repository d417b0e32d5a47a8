//! Token verification (§2 Token Verifier / component A) and the shared
//! session authenticator (§4.2 / component F).
//!
//! Chat and video engines never parse or mint credentials themselves;
//! they depend on a `dyn TokenVerifier`, injected as a capability rather
//! than reached for as a global (Design Notes, §9), and call into
//! [`session`] to resolve a request or handshake payload down to a
//! [`collab_types::UserDescriptor`].

pub mod hmac_jwt;
pub mod http;
pub mod session;
pub mod verifier;

pub use verifier::{TokenVerifier, VerifyError};
