//! Run fingerprinting — deterministic identification of analysis runs.
//!
//! - `DatasetHash`: content hash of the analysed price series.
//! - `ConfigHash`: hash of the canonical JSON of an [`EngineConfig`].
//! - `RunId`: hash of config + dataset. Identical inputs give identical ids
//!   across processes and platforms.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::PriceSeries;
use crate::engine::EngineConfig;

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn from_bytes(bytes: &[u8]) -> Self {
                Self(blake3::hash(bytes).to_hex().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First 12 hex characters, for logs and directory names.
            pub fn short(&self) -> &str {
                &self.0[..self.0.len().min(12)]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

hash_id!(
    /// BLAKE3 of the series symbol and every bar.
    DatasetHash
);
hash_id!(
    /// BLAKE3 of the canonical engine configuration.
    ConfigHash
);
hash_id!(
    /// BLAKE3 of config hash + dataset hash.
    RunId
);

impl DatasetHash {
    pub fn of_series(series: &PriceSeries) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(series.symbol().as_bytes());
        for p in series.points() {
            hasher.update(p.date.to_string().as_bytes());
            for v in [p.open, p.high, p.low, p.close] {
                hasher.update(&v.to_le_bytes());
            }
            hasher.update(&p.volume.to_le_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl ConfigHash {
    pub fn of_config(config: &EngineConfig) -> Self {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        match serde_json::to_string(config) {
            Ok(json) => Self::from_bytes(json.as_bytes()),
            Err(_) => Self::from_bytes(format!("{config:?}").as_bytes()),
        }
    }
}

impl RunId {
    pub fn derive(config: &ConfigHash, dataset: &DatasetHash) -> Self {
        Self::from_bytes(format!("{config}+{dataset}").as_bytes())
    }
}
