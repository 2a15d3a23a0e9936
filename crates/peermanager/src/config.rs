//! Peer manager configuration: conflict cooldown, proof replacement,
//! and pool size caps. Plain typed struct with serde defaults plus a
//! small TOML file loader so node operators can override fields
//! selectively.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

/// Default seconds a peer is protected from conflicting registrations.
pub const DEFAULT_CONFLICTING_PROOF_COOLDOWN_SECS: u64 = 60;

/// Default maximum number of live peers (valid-pool cap).
pub const DEFAULT_VALID_POOL_CAP: usize = 8_192;

/// Default maximum number of conflicting-pool entries.
pub const DEFAULT_CONFLICTING_POOL_CAP: usize = 128;

/// Default maximum number of orphan-pool entries.
pub const DEFAULT_ORPHAN_POOL_CAP: usize = 4_096;

/// Tunables of the peer manager.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeerManagerConfig {
    /// Minimum seconds between accepted conflicts against the same
    /// peer. `0` disables the cooldown entirely.
    pub conflicting_proof_cooldown_secs: u64,

    /// When `true`, a polite registration that beats *every* valid-pool
    /// proof it conflicts with replaces them. When `false`, only
    /// force-accept performs replacement.
    pub enable_proof_replacement: bool,

    /// Maximum live peers. The lowest-score peer is the first evicted.
    pub valid_pool_cap: usize,

    /// Maximum conflicting-pool entries. Worst entry evicted first.
    pub conflicting_pool_cap: usize,

    /// Maximum orphan-pool entries. Oldest entry evicted first.
    pub orphan_pool_cap: usize,
}

impl Default for PeerManagerConfig {
    fn default() -> Self {
        PeerManagerConfig {
            conflicting_proof_cooldown_secs: DEFAULT_CONFLICTING_PROOF_COOLDOWN_SECS,
            enable_proof_replacement: false,
            valid_pool_cap: DEFAULT_VALID_POOL_CAP,
            conflicting_pool_cap: DEFAULT_CONFLICTING_POOL_CAP,
            orphan_pool_cap: DEFAULT_ORPHAN_POOL_CAP,
        }
    }
}

impl PeerManagerConfig {
    /// Whether the conflict cooldown is active.
    #[must_use]
    pub fn cooldown_enabled(&self) -> bool {
        self.conflicting_proof_cooldown_secs > 0
    }
}

/// Errors from [`load_from_file`].
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(io::Error),
    /// The file is not valid TOML for [`PeerManagerConfig`].
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse config file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Loads a config from a TOML file. Absent fields take their defaults.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<PeerManagerConfig, ConfigError> {
    let raw = fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
    toml::from_str(&raw).map_err(ConfigError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = PeerManagerConfig::default();
        assert_eq!(cfg.conflicting_proof_cooldown_secs, 60);
        assert!(!cfg.enable_proof_replacement);
        assert_eq!(cfg.valid_pool_cap, DEFAULT_VALID_POOL_CAP);
        assert_eq!(cfg.conflicting_pool_cap, DEFAULT_CONFLICTING_POOL_CAP);
        assert_eq!(cfg.orphan_pool_cap, DEFAULT_ORPHAN_POOL_CAP);
        assert!(cfg.cooldown_enabled());
    }

    #[test]
    fn test_zero_cooldown_disables() {
        let cfg = PeerManagerConfig {
            conflicting_proof_cooldown_secs: 0,
            ..PeerManagerConfig::default()
        };
        assert!(!cfg.cooldown_enabled());
    }

    #[test]
    fn test_load_from_file_partial_override() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "conflicting_proof_cooldown_secs = 100\nenable_proof_replacement = true\n"
        )
        .expect("write config");

        let cfg = load_from_file(file.path()).expect("load config");
        assert_eq!(cfg.conflicting_proof_cooldown_secs, 100);
        assert!(cfg.enable_proof_replacement);
        // Untouched fields keep defaults.
        assert_eq!(cfg.orphan_pool_cap, DEFAULT_ORPHAN_POOL_CAP);
    }

    #[test]
    fn test_load_from_file_missing() {
        let err = load_from_file("/definitely/not/here.toml");
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "conflicting_proof_cooldown_secs = \"soon\"").expect("write config");
        let err = load_from_file(file.path());
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }
}
