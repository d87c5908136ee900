//! Domain-wide constants.

/// Delimiter joining [`crate::FlowState`] fields inside the provider `state`
/// parameter.
pub const STATE_DELIMITER: char = ':';

/// Number of fields an encoded [`crate::FlowState`] carries.
pub const STATE_FIELD_COUNT: usize = 5;

/// Default lifetime of a signed assertion (24 hours).
pub const DEFAULT_ASSERTION_TTL_SECS: u64 = 24 * 60 * 60;

/// Default lifetime of an unconsumed challenge (10 minutes).
pub const DEFAULT_CHALLENGE_TTL_SECS: u64 = 10 * 60;

/// Default lifetime of unclaimed ephemeral tokens (10 minutes).
pub const DEFAULT_EPHEMERAL_TTL_SECS: u64 = 10 * 60;

/// Deep-link scheme used when a mobile client did not supply one.
pub const DEFAULT_RETURN_SCHEME: &str = "authbridge";

/// Host/path portion of the mobile deep link (`{scheme}://auth/callback`).
pub const DEFAULT_MOBILE_CALLBACK_PATH: &str = "auth/callback";

/// Default HTTP listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9090";

/// Default SQLite database file.
pub const DEFAULT_DB_PATH: &str = "./oauth2.db";

/// Default connection pool size.
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
