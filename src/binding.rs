//! Binding names: which engine a request talks to.

use crate::error::WaypointError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database binding target for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// Primary, writable database.
    Master,
    /// Replica, read-only and possibly lagging.
    Slave,
}

impl Binding {
    pub const ALL: [Binding; 2] = [Binding::Master, Binding::Slave];

    pub fn as_str(&self) -> &'static str {
        match self {
            Binding::Master => "master",
            Binding::Slave => "slave",
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Binding {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(Binding::Master),
            "slave" => Ok(Binding::Slave),
            _ => Err(WaypointError::InvalidBindingName(s.to_string())),
        }
    }
}
