//! Delegation options
//!
//! ```toml
//! [delegator]
//! lookback_depth = 5
//! log_operations = true
//! ```
//!
//! The `[delegator]` header is optional; a bare table is read the same way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::caller::DEFAULT_LOOKBACK_DEPTH;

const SECTION: &str = "delegator";

/// Options errors
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Input is not valid TOML or does not match the options shape
    #[error("Invalid delegator options: {0}")]
    Parse(#[from] toml::de::Error),

    /// Caller resolution needs at least one frame
    #[error("lookback_depth must be at least 1")]
    ZeroLookback,
}

/// Tunables for a delegating class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DelegatorOptions {
    /// Frames inspected when resolving a caller from the stack
    pub lookback_depth: usize,
    /// Route lazily built delegatees through the host's logger
    pub log_operations: bool,
}

impl Default for DelegatorOptions {
    fn default() -> Self {
        Self {
            lookback_depth: DEFAULT_LOOKBACK_DEPTH,
            log_operations: true,
        }
    }
}

impl DelegatorOptions {
    /// Parse from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self, OptionsError> {
        let mut table: toml::Table = input.parse()?;
        let section = match table.remove(SECTION) {
            Some(toml::Value::Table(section)) => section,
            Some(other) => {
                table.insert(SECTION.to_string(), other);
                table
            }
            None => table,
        };
        let options: DelegatorOptions = toml::Value::Table(section).try_into()?;
        options.validate()?;
        Ok(options)
    }

    /// Check invariants
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.lookback_depth == 0 {
            return Err(OptionsError::ZeroLookback);
        }
        Ok(())
    }

    /// These options, with an invalid lookback depth replaced by the default
    pub fn sanitized(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(err) => {
                tracing::warn!(%err, "invalid delegator options, using default lookback depth");
                Self {
                    lookback_depth: DEFAULT_LOOKBACK_DEPTH,
                    ..self
                }
            }
        }
    }
}
