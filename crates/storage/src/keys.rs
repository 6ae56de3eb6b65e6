//! Names of the persisted entries

/// Bearer token of the current session
pub const TOKEN: &str = "token";

/// JSON-serialized profile of the signed-in user
pub const USER: &str = "user";

/// Theme preference, `"light"` or `"dark"`
pub const THEME: &str = "theme";
