//! Runtime configuration for registration limits, allocation hints, and
//! diagnostics.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//! ```toml
//! max_subsystems = 100
//! nnz_per_row_factor = 5
//!
//! [diagnostics]
//! dense_hamiltonian = true
//! designated_rank = 0
//! output = "ham"
//! ```

use std::path::{ Path, PathBuf };
use serde::Deserialize;
use crate::error::{ Error, Result };

fn default_max_subsystems() -> usize { 100 }

fn default_nnz_per_row_factor() -> usize { 5 }

fn default_dense_hamiltonian() -> bool { true }

fn default_output() -> PathBuf { PathBuf::from("ham") }

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum number of subsystems the registry will accept.
    #[serde(default = "default_max_subsystems")]
    pub max_subsystems: usize,

    /// The superoperator is allocated with `nnz_per_row_factor *
    /// total_levels` nonzeros reserved per row.
    #[serde(default = "default_nnz_per_row_factor")]
    pub nnz_per_row_factor: usize,

    /// Settings for the dense operator-space Hamiltonian.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Settings for the dense, operator-space Hamiltonian kept for debugging.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Whether to build the dense Hamiltonian at all.
    #[serde(default = "default_dense_hamiltonian")]
    pub dense_hamiltonian: bool,

    /// The only rank that builds and writes the dense Hamiltonian.
    #[serde(default)]
    pub designated_rank: usize,

    /// Default path of the text dump.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            dense_hamiltonian: default_dense_hamiltonian(),
            designated_rank: 0,
            output: default_output(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_subsystems: default_max_subsystems(),
            nnz_per_row_factor: default_nnz_per_row_factor(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl Config {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a configuration file.
    pub fn load<P>(path: P) -> Result<Self>
    where P: AsRef<Path>
    {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_subsystems == 0 {
            return Err(Error::Config("max_subsystems must be at least 1".into()));
        }
        if self.nnz_per_row_factor == 0 {
            return Err(
                Error::Config("nnz_per_row_factor must be at least 1".into())
            );
        }
        Ok(())
    }

    /// Set the registry capacity.
    pub fn with_max_subsystems(mut self, max_subsystems: usize) -> Self {
        self.max_subsystems = max_subsystems;
        self
    }

    /// Enable or disable the dense diagnostic Hamiltonian.
    pub fn with_dense_hamiltonian(mut self, enabled: bool) -> Self {
        self.diagnostics.dense_hamiltonian = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_subsystems, 100);
        assert_eq!(config.nnz_per_row_factor, 5);
        assert!(config.diagnostics.dense_hamiltonian);
        assert_eq!(config.diagnostics.output, PathBuf::from("ham"));
    }

    #[test]
    fn partial_document() {
        let src = r#"
            max_subsystems = 4

            [diagnostics]
            dense_hamiltonian = false
            designated_rank = 2
        "#;
        let config = Config::from_toml_str(src).unwrap();
        assert_eq!(config.max_subsystems, 4);
        assert_eq!(config.nnz_per_row_factor, 5);
        assert!(!config.diagnostics.dense_hamiltonian);
        assert_eq!(config.diagnostics.designated_rank, 2);
    }

    #[test]
    fn rejects_zero_capacity() {
        let res = Config::from_toml_str("max_subsystems = 0");
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn rejects_unknown_keys() {
        let res = Config::from_toml_str("max_subsytems = 3");
        assert!(matches!(res, Err(Error::Toml(_))));
    }
}
