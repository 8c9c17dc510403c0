//! Playable races.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// A playable race as reported by replay metadata.
///
/// `Random` only appears as a *requested* race; replays always report the
/// race actually played, so extraction never sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    /// Terran.
    Terran,
    /// Zerg.
    Zerg,
    /// Protoss.
    Protoss,
    /// Random (request-only).
    Random,
}

impl Race {
    /// Canonical engine name (`"Terran"`, `"Zerg"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Terran => "Terran",
            Self::Zerg => "Zerg",
            Self::Protoss => "Protoss",
            Self::Random => "Random",
        }
    }

    /// Matchup label with the two races sorted by name, e.g.
    /// `Protoss_vs_Terran`. Used to key the replay library.
    pub fn matchup_key(a: Race, b: Race) -> String {
        let (lo, hi) = if a.name() <= b.name() { (a, b) } else { (b, a) };
        format!("{}_vs_{}", lo.name(), hi.name())
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A race name could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRaceError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParseRaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown race '{}'", self.input)
    }
}

impl Error for ParseRaceError {}

impl FromStr for Race {
    type Err = ParseRaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terran" | "t" => Ok(Self::Terran),
            "zerg" | "z" => Ok(Self::Zerg),
            "protoss" | "p" => Ok(Self::Protoss),
            "random" | "r" => Ok(Self::Random),
            _ => Err(ParseRaceError {
                input: s.to_string(),
            }),
        }
    }
}
