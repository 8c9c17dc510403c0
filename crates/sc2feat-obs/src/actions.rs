//! Production action classification.
//!
//! Raw actions are mapped back to named abilities through the engine's
//! reverse lookup and filtered to the production categories. Ability
//! names are `Category_Subject_mode`, e.g. `Train_Marine_quick`; the
//! category is everything before the first underscore.

use sc2feat_core::{AbilityId, AbilityLookup, InterfaceOptions, RawAction};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::trace;

/// Ability categories kept by the classifier.
pub const PRODUCTION_CATEGORIES: [&str; 5] = ["Build", "Train", "Research", "Morph", "TrainWarp"];

/// A production ability issued by the observed player.
///
/// Serializes as a single-entry map `{ "<id>": "<name>" }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionEvent {
    /// Ability id.
    pub ability_id: AbilityId,
    /// Ability name.
    pub name: String,
}

impl Serialize for ActionEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.ability_id.0.to_string(), &self.name)?;
        map.end()
    }
}

/// Whether `name` belongs to a production category.
pub fn is_production(name: &str) -> bool {
    let category = name.split('_').next().unwrap_or(name);
    PRODUCTION_CATEGORIES.contains(&category)
}

/// Reduces raw actions to production [`ActionEvent`]s.
pub struct ActionClassifier<'a> {
    lookup: &'a dyn AbilityLookup,
    interface: InterfaceOptions,
}

impl<'a> ActionClassifier<'a> {
    /// Classifier resolving through `lookup` under a 1×1 interface.
    pub fn new(lookup: &'a dyn AbilityLookup) -> Self {
        Self {
            lookup,
            interface: InterfaceOptions::minimal(),
        }
    }

    /// Production events among `actions`, in issue order.
    ///
    /// Actions the lookup cannot resolve, or whose ability has no name,
    /// are dropped.
    pub fn extract(&self, actions: &[RawAction]) -> Vec<ActionEvent> {
        actions
            .iter()
            .filter_map(|action| {
                let id = match self.lookup.reverse_action(action, &self.interface) {
                    Ok(id) => id,
                    Err(e) => {
                        trace!(error = %e, "dropping unresolvable action");
                        return None;
                    }
                };
                let name = self.lookup.ability_name(id)?;
                is_production(name).then(|| ActionEvent {
                    ability_id: id,
                    name: name.to_string(),
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for ActionClassifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionClassifier")
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc2feat_core::{CommandTarget, EngineError};

    struct Table;

    impl AbilityLookup for Table {
        fn reverse_action(
            &self,
            action: &RawAction,
            interface: &InterfaceOptions,
        ) -> Result<AbilityId, EngineError> {
            assert_eq!(interface, &InterfaceOptions::minimal());
            match action {
                RawAction::UnitCommand { ability, .. } => Ok(AbilityId(*ability)),
                _ => Err(EngineError::UnresolvableAction {
                    detail: "not a unit command".into(),
                }),
            }
        }

        fn ability_name(&self, id: AbilityId) -> Option<&str> {
            match id.0 {
                477 => Some("Train_Marine_quick"),
                331 => Some("Move_screen"),
                1 => Some("TrainWarp_Zealot_screen"),
                _ => None,
            }
        }
    }

    fn command(ability: u32) -> RawAction {
        RawAction::UnitCommand {
            ability,
            target: CommandTarget::None,
            unit_tags: vec![],
            queue_command: false,
        }
    }

    #[test]
    fn keeps_production_in_order() {
        let table = Table;
        let c = ActionClassifier::new(&table);
        let events = c.extract(&[
            command(1),
            command(331),
            RawAction::CameraMove { x: 1.0, y: 1.0 },
            command(477),
            command(9999),
        ]);
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["TrainWarp_Zealot_screen", "Train_Marine_quick"]);
    }

    #[test]
    fn category_is_first_token() {
        assert!(is_production("Build_SupplyDepot_screen"));
        assert!(is_production("Morph_Lair_quick"));
        assert!(!is_production("Builder_Thing"));
        assert!(!is_production("Harvest_Gather_screen"));
    }

    #[test]
    fn event_serializes_as_single_entry_map() {
        let e = ActionEvent {
            ability_id: AbilityId(477),
            name: "Train_Marine_quick".into(),
        };
        assert_eq!(
            serde_json::to_string(&e).unwrap(),
            r#"{"477":"Train_Marine_quick"}"#
        );
    }
}
