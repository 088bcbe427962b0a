//! Administrator identity loaded from the environment.
//!
//! The shop has exactly one operator. Their chat user ID is read from `ADMIN_USER_ID`
//! and every privileged command is checked against it in the core layer.

use crate::core::UserId;
use crate::errors::{Error, Result};

/// Environment variable holding the administrator's user ID
pub const ADMIN_USER_ID_VAR: &str = "ADMIN_USER_ID";

/// Parses an administrator ID string.
///
/// # Errors
/// Returns `Error::Config` if the value is not an integer.
pub fn parse_admin_id(raw: &str) -> Result<UserId> {
    raw.trim().parse::<UserId>().map_err(|e| Error::Config {
        message: format!("{ADMIN_USER_ID_VAR} must be an integer user ID: {e}"),
    })
}

/// Reads the administrator's user ID from `ADMIN_USER_ID`.
///
/// # Errors
/// Returns an error if the variable is missing or is not an integer.
pub fn get_admin_user_id() -> Result<UserId> {
    let raw = std::env::var(ADMIN_USER_ID_VAR)?;
    parse_admin_id(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_id() {
        assert!(matches!(parse_admin_id("123456789"), Ok(123_456_789)));
        assert!(matches!(parse_admin_id(" 42\n"), Ok(42)));
    }

    #[test]
    fn test_parse_admin_id_rejects_garbage() {
        assert!(matches!(
            parse_admin_id("not-a-number"),
            Err(Error::Config { message: _ })
        ));
        assert!(matches!(parse_admin_id(""), Err(Error::Config { message: _ })));
    }
}
