//! Content hash identifying a chip configuration.

use std::fmt;

use chipdeck_types::ChipConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Result;

/// SHA-256 of a configuration's canonical JSON, hex encoded.
///
/// Two chips with equal configurations share a hash, which is what lets a
/// remounted chip pick up the results of an earlier identical one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigHash(String);

impl ConfigHash {
    /// Hash a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn of(config: &ChipConfig) -> Result<Self> {
        let canonical = serde_json::to_vec(config)?;
        Ok(Self(hex::encode(Sha256::digest(&canonical))))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
