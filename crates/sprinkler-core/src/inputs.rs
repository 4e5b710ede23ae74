use crate::error::{Result, SprinklerError};
use std::path::Path;

/// Length of a raw hex-encoded secp256k1 private key, without 0x prefix.
const KEY_LEN: usize = 64;

/// Load sender private keys, one per line. Lines are trimmed and anything
/// that is not exactly 64 hex characters is dropped, so comments and blank
/// lines are tolerated.
pub fn load_keys(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    let keys: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| line.len() == KEY_LEN && line.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_string)
        .collect();
    if keys.is_empty() {
        return Err(SprinklerError::NoKeys(path.to_path_buf()));
    }
    Ok(keys)
}

/// Load recipient addresses, one per line, keeping every non-empty trimmed
/// line. Address validity is the transfer operation's concern.
pub fn load_recipients(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    let recipients: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if recipients.is_empty() {
        return Err(SprinklerError::NoRecipients(path.to_path_buf()));
    }
    Ok(recipients)
}
