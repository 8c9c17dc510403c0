//! Traits through which the simulation engine is driven.
//!
//! The engine itself is an external collaborator. An [`Engine`] is a
//! shareable factory (one per pipeline run) that launches [`Controller`]
//! sessions; each worker owns exactly one controller at a time.
//! Controllers are `!Sync` by assumption and never shared.

use std::path::Path;

use crate::catalog::GameCatalog;
use crate::error::EngineError;
use crate::id::{AbilityId, PlayerId};
use crate::interface::InterfaceOptions;
use crate::observation::{Observation, RawAction};
use crate::replay_info::ReplayInfo;

/// Everything needed to start a replay session.
#[derive(Clone, Copy, Debug)]
pub struct StartReplay<'a> {
    /// Replay file bytes.
    pub replay_data: &'a [u8],
    /// Map bytes for custom maps.
    pub map_data: Option<&'a [u8]>,
    /// What each observation should contain.
    pub options: &'a InterfaceOptions,
    /// Whose perspective to observe from.
    pub observed_player_id: PlayerId,
}

/// One running engine instance.
pub trait Controller {
    /// Read replay metadata without starting a session.
    fn replay_info(&mut self, replay_data: &[u8]) -> Result<ReplayInfo, EngineError>;

    /// Start replaying from the first frame.
    fn start_replay(&mut self, request: StartReplay<'_>) -> Result<(), EngineError>;

    /// Advance the simulation by `frames` engine frames. Blocks.
    fn step(&mut self, frames: u32) -> Result<(), EngineError>;

    /// Observe the current state. Blocks.
    fn observe(&mut self) -> Result<Observation, EngineError>;

    /// Shut the engine instance down. The default does nothing.
    fn quit(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Reverse lookup from raw actions to named abilities.
pub trait AbilityLookup: Send + Sync {
    /// Resolve a raw action to the named ability it invokes, interpreting
    /// it under `interface`.
    fn reverse_action(
        &self,
        action: &RawAction,
        interface: &InterfaceOptions,
    ) -> Result<AbilityId, EngineError>;

    /// Name of an ability, e.g. `Train_Marine_quick`.
    fn ability_name(&self, id: AbilityId) -> Option<&str>;
}

/// Factory for controllers plus the engine's static data.
pub trait Engine: Send + Sync {
    /// Controller type launched by [`start`](Engine::start).
    type Controller: Controller;

    /// Launch a fresh engine instance.
    fn start(&self) -> Result<Self::Controller, EngineError>;

    /// Read a replay file.
    fn replay_data(&self, path: &Path) -> Result<Vec<u8>, EngineError> {
        Ok(std::fs::read(path)?)
    }

    /// Read a custom map referenced by replay metadata.
    fn map_data(&self, path: &str) -> Result<Vec<u8>, EngineError> {
        Ok(std::fs::read(path)?)
    }

    /// Unit and upgrade catalog.
    fn catalog(&self) -> &GameCatalog;

    /// Ability reverse lookup.
    fn abilities(&self) -> &dyn AbilityLookup;
}
