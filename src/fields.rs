use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scenario::Scenario;

/// Who shares a persisted record and how long it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// Author-editable settings of one component instance.
    Settings,
    /// Authored content of one component instance, shared by every learner.
    Content,
    /// One learner's state within one component instance.
    UserState,
}

/// A record the host persists under a single scope.
pub trait Persisted: Serialize + DeserializeOwned + Default {
    const SCOPE: FieldScope;

    /// Load a stored record. Missing fields take their defaults; a record
    /// that cannot be read at all is replaced by defaults.
    fn load(record: Option<&Value>) -> Self {
        match record {
            None | Some(Value::Null) => Self::default(),
            Some(value) => match serde_json::from_value::<Self>(value.clone()) {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!("Discarding unreadable {:?} record: {e}", Self::SCOPE);
                    Self::default()
                }
            },
        }
    }

    fn dump(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Author settings for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    /// Name shown in the course outline.
    pub display_name: String,
    pub enable_undo: bool,
    pub enable_scoring: bool,
    pub enable_reset_activity: bool,
    /// Gradebook maximum reported alongside the learner's score.
    pub max_score: f64,
    pub background_image_url: String,
    pub background_image_alt_text: String,
    pub background_image_is_decorative: bool,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            display_name: "Branching Scenario".to_string(),
            enable_undo: false,
            enable_scoring: false,
            enable_reset_activity: false,
            max_score: 100.0,
            background_image_url: String::new(),
            background_image_alt_text: String::new(),
            background_image_is_decorative: false,
        }
    }
}

impl Persisted for ScenarioSettings {
    const SCOPE: FieldScope = FieldScope::Settings;
}

impl Persisted for Scenario {
    const SCOPE: FieldScope = FieldScope::Content;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_record_uses_defaults() {
        let settings = ScenarioSettings::load(None);
        assert_eq!(settings.display_name, "Branching Scenario");
        assert_eq!(settings.max_score, 100.0);
        assert!(!settings.enable_undo);
    }

    #[test]
    fn test_partial_record_keeps_given_fields() {
        let settings = ScenarioSettings::load(Some(&json!({"enable_undo": true, "max_score": 5})));
        assert!(settings.enable_undo);
        assert_eq!(settings.max_score, 5.0);
        assert_eq!(settings.display_name, "Branching Scenario");
    }

    #[test]
    fn test_unreadable_record_is_replaced() {
        let settings = ScenarioSettings::load(Some(&json!({"enable_undo": "yes"})));
        assert_eq!(settings, ScenarioSettings::default());

        let scenario = Scenario::load(Some(&json!([1, 2, 3])));
        assert!(scenario.is_empty());
    }

    #[test]
    fn test_dump_then_load() {
        let settings = ScenarioSettings {
            enable_scoring: true,
            max_score: 50.0,
            ..Default::default()
        };
        let loaded = ScenarioSettings::load(Some(&settings.dump().unwrap()));
        assert_eq!(loaded, settings);
        assert_eq!(<Scenario as Persisted>::SCOPE, FieldScope::Content);
    }
}
