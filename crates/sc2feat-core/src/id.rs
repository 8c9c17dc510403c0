//! Strongly-typed identifiers used across the pipeline.
//!
//! The engine reports every identifier as a bare integer. Wrapping them
//! keeps unit types, upgrades, abilities and instance tags from being
//! mixed up when they flow through the extractors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a unit type in the engine's catalog.
///
/// Several ids may describe the same unit in different states (a sieged
/// and an unsieged tank, a burrowed and an unburrowed roach). The
/// canonicalizer in `sc2feat-obs` collapses those onto one base id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTypeId(pub u32);

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UnitTypeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an upgrade or research item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub u32);

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UpgradeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a named ability (function) in the engine's action catalog.
///
/// This is the id produced by reverse-mapping a raw action, not the raw
/// command id carried inside the action itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub u32);

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AbilityId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Unique per-instance identifier of one simulated unit.
///
/// Stable across steps until the unit is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub u64);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Tag {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Player slot within a replay (1-based in the engine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlayerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
