use crate::error::{Error, Result};

/// Permission applied to new files and directories when none is given
pub const DEFAULT_PERMISSION: &str = "755";

/// Check an octal permission string before it is sent anywhere
///
/// Accepts three octal digits, optionally preceded by a `0` or `1` (the sticky
/// bit): `755`, `0644`, `1777`.
pub fn validate_permission(permission: &str) -> Result<()> {
    let digits = permission.as_bytes();
    let mode = match digits.len() {
        3 => digits,
        4 if matches!(digits[0], b'0' | b'1') => &digits[1..],
        _ => return Err(invalid(permission)),
    };

    if mode.iter().all(|d| (b'0'..=b'7').contains(d)) {
        Ok(())
    } else {
        Err(invalid(permission))
    }
}

fn invalid(permission: &str) -> Error {
    Error::InvalidPermission {
        value: permission.to_string(),
    }
}
