//! Constants used throughout Yellows

/// Name of the session cookie set on successful login
pub const AUTH_COOKIE: &str = "yellows-auth";

/// Session lifetime in seconds (cookie Max-Age and JWT exp are kept in lockstep)
pub const SESSION_TTL_SECS: i64 = 86_400;

/// Path the identity provider redirects back to after authorization
pub const LOGIN_FINISH_PATH: &str = "/api/auth/login-finish";

/// OAuth scopes requested from the identity provider
pub const PROVIDER_SCOPES: &[&str] = &["identify", "email"];

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "yellows.config.json";

/// Default timeout for outbound identity provider calls, in seconds
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 5;

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Hard ceiling for caller-supplied page sizes
pub const MAX_PAGE_SIZE: usize = 100;
