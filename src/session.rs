//! Wallet session stand-in.
//!
//! The web app delegates sign-in to the Stacks wallet SDK and only ever
//! reads the signed-in address back out of the session. Here that
//! collapses to a connected address kept in `{data_dir}/config.toml`;
//! connect and disconnect rewrite the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Contents of `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Address treated as signed in, if any.
    #[serde(default)]
    pub connected_address: Option<String>,
}

#[derive(Debug)]
pub enum SessionError {
    Io(std::io::Error),
    Toml(String),
    InvalidAddress(String),
    NotConnected,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "io error: {e}"),
            SessionError::Toml(e) => write!(f, "config error: {e}"),
            SessionError::InvalidAddress(addr) => {
                write!(f, "not a Stacks address: {addr}")
            }
            SessionError::NotConnected => write!(f, "no wallet connected"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Io(e)
    }
}

fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Load the session file, returning defaults if it doesn't exist.
pub fn load(data_dir: &Path) -> Result<SessionConfig, SessionError> {
    let path = config_path(data_dir);
    if !path.exists() {
        return Ok(SessionConfig::default());
    }
    let contents = fs::read_to_string(&path)?;
    toml::from_str(&contents).map_err(|e| SessionError::Toml(e.to_string()))
}

fn save(data_dir: &Path, config: &SessionConfig) -> Result<(), SessionError> {
    fs::create_dir_all(data_dir)?;
    let contents =
        toml::to_string_pretty(config).map_err(|e| SessionError::Toml(e.to_string()))?;
    fs::write(config_path(data_dir), contents)?;
    Ok(())
}

/// Shape check for a Stacks c32 principal: `S` prefix, uppercase
/// alphanumeric. Deliberately loose; real validation belongs to the
/// wallet, which is out of scope here.
pub fn looks_like_stacks_address(address: &str) -> bool {
    address.len() > 1
        && address.starts_with('S')
        && address
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

/// Mark `address` as the signed-in wallet.
pub fn connect(data_dir: &Path, address: &str) -> Result<(), SessionError> {
    if !looks_like_stacks_address(address) {
        return Err(SessionError::InvalidAddress(address.to_string()));
    }
    let mut config = load(data_dir)?;
    config.connected_address = Some(address.to_string());
    save(data_dir, &config)
}

/// Sign out. A no-op when nothing is connected.
pub fn disconnect(data_dir: &Path) -> Result<(), SessionError> {
    let mut config = load(data_dir)?;
    config.connected_address = None;
    save(data_dir, &config)
}

/// The signed-in address, if any.
pub fn current(data_dir: &Path) -> Result<Option<String>, SessionError> {
    Ok(load(data_dir)?.connected_address)
}

/// The signed-in address, or [`SessionError::NotConnected`].
pub fn require_connected(data_dir: &Path) -> Result<String, SessionError> {
    current(data_dir)?.ok_or(SessionError::NotConnected)
}
