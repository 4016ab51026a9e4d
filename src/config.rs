//! Node configuration.
//!
//! Options are plain serde structs read from TOML. Every field has a default,
//! so an empty file is a valid production configuration.
//!
//! ```toml
//! dev_mode = true
//! trace_transitions = true
//! history_limit = 128
//! ```

use crate::error::Result;
use ledgerflow_statemachine::StateMachineOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Node options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeOptions {
    /// Development mode: per-flow history and checkpoint verification.
    #[serde(default)]
    pub dev_mode: bool,

    /// Verify checkpoints in the background; follows `dev_mode` when unset.
    #[serde(default)]
    pub verify_checkpoints: Option<bool>,

    /// Log every transition.
    #[serde(default)]
    pub trace_transitions: bool,

    /// Transitions kept per flow in development mode.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    64
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            dev_mode: false,
            verify_checkpoints: None,
            trace_transitions: false,
            history_limit: default_history_limit(),
        }
    }
}

impl NodeOptions {
    /// Development preset: history, verification and transition tracing.
    pub fn development() -> Self {
        Self {
            dev_mode: true,
            trace_transitions: true,
            ..Self::default()
        }
    }

    /// Production preset: the terminal executor only.
    pub fn production() -> Self {
        Self::default()
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Whether checkpoints are verified.
    pub fn verifies_checkpoints(&self) -> bool {
        self.verify_checkpoints.unwrap_or(self.dev_mode)
    }

    /// Executor chain options.
    pub fn state_machine(&self) -> StateMachineOptions {
        StateMachineOptions {
            dev_mode: self.dev_mode,
            verify_checkpoints: self.verifies_checkpoints(),
            trace_transitions: self.trace_transitions,
            history_limit: self.history_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;

    #[test]
    fn test_empty_is_production() {
        let options = NodeOptions::from_toml_str("").unwrap();
        assert_eq!(options, NodeOptions::production());
        assert!(!options.verifies_checkpoints());
        assert_eq!(options.history_limit, 64);
    }

    #[test]
    fn test_verification_follows_dev_mode() {
        let dev = NodeOptions::development();
        assert!(dev.verifies_checkpoints());
        assert!(dev.state_machine().verify_checkpoints);

        let opted_out = NodeOptions::from_toml_str("dev_mode = true\nverify_checkpoints = false").unwrap();
        assert!(!opted_out.verifies_checkpoints());

        let opted_in = NodeOptions::from_toml_str("verify_checkpoints = true").unwrap();
        assert!(opted_in.verifies_checkpoints());
        assert!(!opted_in.dev_mode);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = NodeOptions::from_toml_str("dev_mod = true").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trace_transitions = true").unwrap();
        writeln!(file, "history_limit = 5").unwrap();
        let options = NodeOptions::load(file.path()).unwrap();
        assert!(options.trace_transitions);
        assert_eq!(options.history_limit, 5);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NodeOptions::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
