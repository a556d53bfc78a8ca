//! Credential-domain models: redacted secrets, cached access tokens, and cache identities.

pub mod identity;
pub mod token;

pub use identity::*;
pub use token::{access::*, secret::*};
