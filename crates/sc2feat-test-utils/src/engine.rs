//! Scripted mock engine.
//!
//! A [`MockEngine`] holds a set of [`MockReplay`] scripts keyed by replay
//! path. Reading a scripted path yields the path itself as the "replay
//! bytes"; controllers use those bytes to find the script again. Each
//! `step` advances one scripted observation.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sc2feat_core::{
    AbilityId, AbilityLookup, Controller, Engine, EngineError, GameCatalog, InterfaceOptions,
    Observation, PlayerId, RawAction, ReplayInfo, StartReplay,
};

use crate::fixtures::{fixture_catalog, ABILITY_MOVE, ABILITY_TRAIN_MARINE, ABILITY_TRAIN_ZEALOT};

/// One scripted replay.
#[derive(Clone, Debug)]
pub struct MockReplay {
    pub info: ReplayInfo,
    /// Observation returned after the n-th `step`.
    pub observations: Vec<Observation>,
    /// Fail `observe` with [`EngineError::ConnectionLost`] after this
    /// many successful observations.
    pub fail_after: Option<usize>,
}

impl MockReplay {
    pub fn new(info: ReplayInfo, observations: Vec<Observation>) -> Self {
        Self {
            info,
            observations,
            fail_after: None,
        }
    }

    pub fn failing_after(mut self, observations: usize) -> Self {
        self.fail_after = Some(observations);
        self
    }
}

/// A replay session the mock was asked to start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartedReplay {
    pub replay: String,
    pub player: PlayerId,
    pub with_map: bool,
}

#[derive(Default)]
struct Shared {
    replays: HashMap<String, MockReplay>,
    launches: AtomicUsize,
    quits: AtomicUsize,
    started: Mutex<Vec<StartedReplay>>,
    step_sizes: Mutex<Vec<u32>>,
}

/// Ability table keyed by the raw command's ability id.
pub struct MockAbilities {
    names: HashMap<AbilityId, String>,
}

impl MockAbilities {
    pub fn new() -> Self {
        let mut names = HashMap::new();
        names.insert(AbilityId(ABILITY_TRAIN_MARINE), "Train_Marine_quick".into());
        names.insert(AbilityId(ABILITY_TRAIN_ZEALOT), "Train_Zealot_quick".into());
        names.insert(AbilityId(ABILITY_MOVE), "Move_screen".into());
        Self { names }
    }

    pub fn insert(&mut self, id: u32, name: &str) {
        self.names.insert(AbilityId(id), name.to_string());
    }
}

impl Default for MockAbilities {
    fn default() -> Self {
        Self::new()
    }
}

impl AbilityLookup for MockAbilities {
    fn reverse_action(
        &self,
        action: &RawAction,
        _interface: &InterfaceOptions,
    ) -> Result<AbilityId, EngineError> {
        match action {
            RawAction::UnitCommand { ability, .. } if self.names.contains_key(&AbilityId(*ability)) => {
                Ok(AbilityId(*ability))
            }
            other => Err(EngineError::UnresolvableAction {
                detail: format!("{other:?}"),
            }),
        }
    }

    fn ability_name(&self, id: AbilityId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }
}

/// Engine factory serving scripted replays.
pub struct MockEngine {
    catalog: GameCatalog,
    abilities: MockAbilities,
    shared: Arc<Shared>,
    fail_launch: bool,
}

impl MockEngine {
    /// Engine over [`fixture_catalog`] with no replays.
    pub fn new() -> Self {
        Self {
            catalog: fixture_catalog(),
            abilities: MockAbilities::new(),
            shared: Arc::new(Shared::default()),
            fail_launch: false,
        }
    }

    /// Register a scripted replay under `path`.
    ///
    /// Must be called before the engine is shared between threads.
    pub fn with_replay(mut self, path: impl AsRef<Path>, replay: MockReplay) -> Self {
        let key = path.as_ref().to_string_lossy().into_owned();
        match Arc::get_mut(&mut self.shared) {
            Some(shared) => {
                shared.replays.insert(key, replay);
            }
            None => panic!("with_replay called after controllers were launched"),
        }
        self
    }

    pub fn with_catalog(mut self, catalog: GameCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_abilities(mut self, abilities: MockAbilities) -> Self {
        self.abilities = abilities;
        self
    }

    /// Make every `start` call fail.
    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Controllers launched so far.
    pub fn launches(&self) -> usize {
        self.shared.launches.load(Ordering::SeqCst)
    }

    /// Controllers shut down so far.
    pub fn quits(&self) -> usize {
        self.shared.quits.load(Ordering::SeqCst)
    }

    /// Sessions started so far, in start order.
    pub fn started(&self) -> Vec<StartedReplay> {
        self.shared.started.lock().unwrap().clone()
    }

    /// Frame counts passed to `step`, across all controllers.
    pub fn step_sizes(&self) -> Vec<u32> {
        self.shared.step_sizes.lock().unwrap().clone()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MockEngine {
    type Controller = MockController;

    fn start(&self) -> Result<MockController, EngineError> {
        if self.fail_launch {
            return Err(EngineError::Launch {
                reason: "mock launch failure".into(),
            });
        }
        self.shared.launches.fetch_add(1, Ordering::SeqCst);
        Ok(MockController {
            shared: Arc::clone(&self.shared),
            session: None,
        })
    }

    fn replay_data(&self, path: &Path) -> Result<Vec<u8>, EngineError> {
        let key = path.to_string_lossy();
        if self.shared.replays.contains_key(key.as_ref()) {
            Ok(key.into_owned().into_bytes())
        } else {
            Err(EngineError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not scripted", path.display()),
            )))
        }
    }

    fn map_data(&self, path: &str) -> Result<Vec<u8>, EngineError> {
        Ok(format!("map:{path}").into_bytes())
    }

    fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    fn abilities(&self) -> &dyn AbilityLookup {
        &self.abilities
    }
}

struct Session {
    replay: MockReplay,
    stepped: usize,
}

/// Controller replaying one script at a time.
pub struct MockController {
    shared: Arc<Shared>,
    session: Option<Session>,
}

impl MockController {
    fn script(&self, replay_data: &[u8]) -> Result<&MockReplay, EngineError> {
        let key = String::from_utf8_lossy(replay_data);
        self.shared
            .replays
            .get(key.as_ref())
            .ok_or_else(|| EngineError::ReplayRejected {
                reason: format!("unknown replay {key}"),
            })
    }
}

impl Controller for MockController {
    fn replay_info(&mut self, replay_data: &[u8]) -> Result<ReplayInfo, EngineError> {
        Ok(self.script(replay_data)?.info.clone())
    }

    fn start_replay(&mut self, request: StartReplay<'_>) -> Result<(), EngineError> {
        let replay = self.script(request.replay_data)?.clone();
        self.shared.started.lock().unwrap().push(StartedReplay {
            replay: String::from_utf8_lossy(request.replay_data).into_owned(),
            player: request.observed_player_id,
            with_map: request.map_data.is_some(),
        });
        self.session = Some(Session { replay, stepped: 0 });
        Ok(())
    }

    fn step(&mut self, frames: u32) -> Result<(), EngineError> {
        let session = self.session.as_mut().ok_or_else(|| EngineError::Protocol {
            detail: "step before start_replay".into(),
        })?;
        session.stepped += 1;
        self.shared.step_sizes.lock().unwrap().push(frames);
        Ok(())
    }

    fn observe(&mut self) -> Result<Observation, EngineError> {
        let session = self.session.as_ref().ok_or_else(|| EngineError::Protocol {
            detail: "observe before start_replay".into(),
        })?;
        if session
            .replay
            .fail_after
            .is_some_and(|n| session.stepped > n)
        {
            return Err(EngineError::ConnectionLost);
        }
        session
            .stepped
            .checked_sub(1)
            .and_then(|i| session.replay.observations.get(i))
            .cloned()
            .ok_or(EngineError::ConnectionLost)
    }

    fn quit(&mut self) -> Result<(), EngineError> {
        self.session = None;
        self.shared.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
