//! Vehicle class codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard European vehicle-size codes.
///
/// A: mini, B: small, C: medium (golf class), D: large, E: executive,
/// F: luxury, J: sport utility, M: multi-purpose, S: sports coupe.
pub const STANDARD_VEHICLE_CLASSES: [&str; 9] = ["A", "B", "C", "D", "E", "F", "J", "M", "S"];

/// A vehicle class code as reported by the user service.
///
/// Codes outside the standard set are carried as-is: rule tables are keyed by
/// free-form strings, so an unknown code simply misses on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleClass(String);

impl VehicleClass {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the code belongs to the standard European taxonomy.
    pub fn is_standard(&self) -> bool {
        is_standard_code(&self.0)
    }
}

pub fn is_standard_code(code: &str) -> bool {
    STANDARD_VEHICLE_CLASSES.contains(&code)
}

impl From<&str> for VehicleClass {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for VehicleClass {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
