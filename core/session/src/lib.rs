//! Credential session management.
//!
//! A session is the local record of one `init`: a random id/key/salt
//! triple, the base credential variables that were installed, and
//! optionally an assumed role. The triple is exported to the shell; the rest
//! is sealed under the key and persisted, so the next command can find it.
//!
//! At most one session is current in a shell. A fresh init supersedes the
//! previous one completely before installing anything new.

pub mod manager;
pub mod names;
pub mod session;

pub use manager::SessionManager;
pub use names::{
    ASSUMED_ROLE_ALIAS_VAR, ASSUMED_ROLE_ARN_VAR, ASSUMED_ROLE_EXPIRATION_VAR, ASSUMED_ROLE_VARS,
    IDENTITY_VARS, SESSION_ID_VAR, SESSION_KEY_VAR, SESSION_SALT_VAR, SESSION_VARS_VAR,
};
pub use session::{AssumedRole, Session};
