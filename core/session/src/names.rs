//! Environment variable names owned by Rapture.

/// Session identifier.
pub const SESSION_ID_VAR: &str = "RAPTURE_SESSION_ID";
/// Base64 session key.
pub const SESSION_KEY_VAR: &str = "RAPTURE_SESSION_KEY";
/// Base64 session salt.
pub const SESSION_SALT_VAR: &str = "RAPTURE_SESSION_SALT";

/// Comma-separated names of the credential variables the session installed.
///
/// Lets the next init clear them even when the session record can't be
/// read.
pub const SESSION_VARS_VAR: &str = "RAPTURE_SESSION_VARS";

/// ARN of the currently assumed role.
pub const ASSUMED_ROLE_ARN_VAR: &str = "RAPTURE_ASSUMED_ROLE_ARN";
/// Alias the role was assumed by.
pub const ASSUMED_ROLE_ALIAS_VAR: &str = "RAPTURE_ASSUMED_ROLE_ALIAS";
/// RFC 3339 expiration of the assumed role credentials.
pub const ASSUMED_ROLE_EXPIRATION_VAR: &str = "RAPTURE_ASSUMED_ROLE_EXPIRATION";

/// Variables identifying the current session.
pub const IDENTITY_VARS: [&str; 3] = [SESSION_ID_VAR, SESSION_KEY_VAR, SESSION_SALT_VAR];

/// Variables describing an assumed role.
pub const ASSUMED_ROLE_VARS: [&str; 3] = [
    ASSUMED_ROLE_ARN_VAR,
    ASSUMED_ROLE_ALIAS_VAR,
    ASSUMED_ROLE_EXPIRATION_VAR,
];

/// Whether `name` is reserved and can't be supplied by a vault.
pub fn is_reserved(name: &str) -> bool {
    name == SESSION_VARS_VAR || IDENTITY_VARS.contains(&name) || ASSUMED_ROLE_VARS.contains(&name)
}
