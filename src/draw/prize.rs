//! Prize records

use serde::{Deserialize, Serialize};

/// Small prizes each theme keeps for padding short lists
pub const FALLBACK_POOL_LEN: usize = 5;

/// A single prize. `value` is display text ("£250"), never parsed as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prize {
    pub name: String,
    pub value: String,
}

impl Prize {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Prize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.value)
    }
}
