use log::{info, warn};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::authoring::{build_scenario, StudioSubmission};
use crate::error::{BlockError, ChoiceError, SubmitError};
use crate::events::{Event, Publisher};
use crate::fields::{Persisted, ScenarioSettings};
use crate::scenario::{Node, Scenario};
use crate::traversal::{LearnerState, Traversal};

/// Normalized nodes keyed by storage id, serialized as an ordered JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMap(pub Vec<(String, Node)>);

impl NodeMap {
    fn from_scenario(scenario: &Scenario) -> Self {
        Self(scenario.entries())
    }
}

impl Serialize for NodeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, node) in &self.0 {
            map.serialize_entry(id, node)?;
        }
        map.end()
    }
}

/// Everything the learner view needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub nodes: NodeMap,
    pub start_node_id: Option<String>,
    pub enable_undo: bool,
    pub enable_scoring: bool,
    pub enable_reset_activity: bool,
    pub background_image_url: String,
    pub background_image_alt_text: String,
    pub background_image_is_decorative: bool,
    pub max_score: f64,
    pub display_name: String,
    pub current_node_id: Option<String>,
    pub current_node: Option<Node>,
    pub history: Vec<String>,
    pub score_history: Vec<f64>,
    pub has_completed: bool,
    pub score: f64,
}

/// Reply to a learner action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub state: Option<StateSnapshot>,
}

impl ActionResponse {
    fn ok(state: StateSnapshot) -> Self {
        Self {
            success: true,
            error: None,
            state: Some(state),
        }
    }

    fn failed(error: ChoiceError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            state: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldErrors {
    pub nodes_json: Vec<String>,
}

/// Reply to an editor save.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum SubmitResponse {
    Success,
    Error {
        message: String,
        field_errors: FieldErrors,
    },
}

impl SubmitResponse {
    fn rejected(errors: Vec<String>) -> Self {
        SubmitResponse::Error {
            message: "Validation errors".to_string(),
            field_errors: FieldErrors { nodes_json: errors },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmitResponse::Success)
    }
}

/// What the editor loads with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudioState {
    pub nodes: NodeMap,
    pub enable_undo: bool,
    pub enable_scoring: bool,
    pub enable_reset_activity: bool,
    pub max_score: f64,
    pub display_name: String,
    pub background_image_url: String,
    pub background_image_alt_text: String,
    pub background_image_is_decorative: bool,
}

/// The three records a host persists for one component instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Records {
    pub settings: Value,
    pub content: Value,
    pub user_state: Value,
}

/// One branching scenario component as a host sees it: author settings and
/// content, one learner's state, and the host's publish facility.
pub struct BranchingBlock<P: Publisher> {
    pub settings: ScenarioSettings,
    pub scenario: Scenario,
    pub learner: LearnerState,
    runtime: P,
}

impl<P: Publisher> BranchingBlock<P> {
    pub fn new(runtime: P) -> Self {
        Self {
            settings: ScenarioSettings::default(),
            scenario: Scenario::default(),
            learner: LearnerState::default(),
            runtime,
        }
    }

    /// Rebuild a component from stored records. Missing or unreadable records
    /// start from defaults.
    pub fn from_records(
        settings: Option<&Value>,
        content: Option<&Value>,
        user_state: Option<&Value>,
        runtime: P,
    ) -> Self {
        Self {
            settings: ScenarioSettings::load(settings),
            scenario: Scenario::load(content),
            learner: LearnerState::load(user_state),
            runtime,
        }
    }

    pub fn records(&self) -> serde_json::Result<Records> {
        Ok(Records {
            settings: self.settings.dump()?,
            content: self.scenario.dump()?,
            user_state: self.learner.dump()?,
        })
    }

    pub fn runtime(&self) -> &P {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut P {
        &mut self.runtime
    }

    /// Dispatch a JSON handler call by name.
    pub fn handle(&mut self, handler: &str, data: Value) -> Result<Value, BlockError> {
        let response = match handler {
            "get_current_state" => serde_json::to_value(self.get_current_state())?,
            "select_choice" => serde_json::to_value(self.select_choice(&data))?,
            "undo_choice" => serde_json::to_value(self.undo_choice())?,
            "reset_activity" => serde_json::to_value(self.reset_activity())?,
            "studio_submit" => serde_json::to_value(self.studio_submit(data))?,
            "studio_state" => serde_json::to_value(self.studio_state())?,
            other => return Err(BlockError::UnknownHandler(other.to_string())),
        };
        Ok(response)
    }

    pub fn get_current_state(&self) -> StateSnapshot {
        let current_node = self
            .learner
            .current_node_id()
            .and_then(|id| self.scenario.get_node(id));
        StateSnapshot {
            nodes: NodeMap::from_scenario(&self.scenario),
            start_node_id: self.scenario.start_node_id.clone(),
            enable_undo: self.settings.enable_undo,
            enable_scoring: self.settings.enable_scoring,
            enable_reset_activity: self.settings.enable_reset_activity,
            background_image_url: self.settings.background_image_url.clone(),
            background_image_alt_text: self.settings.background_image_alt_text.clone(),
            background_image_is_decorative: self.settings.background_image_is_decorative,
            max_score: self.settings.max_score,
            display_name: self.settings.display_name.clone(),
            current_node_id: self.learner.current_node_id.clone(),
            current_node,
            history: self.learner.history.clone(),
            score_history: self.learner.score_history.clone(),
            has_completed: self.learner.has_completed,
            score: self.learner.score,
        }
    }

    /// Put the learner on the start node without taking a choice.
    pub fn ensure_started(&mut self) {
        self.traversal().ensure_started();
    }

    /// `data` carries `choice_index`; anything but an integer counts as missing.
    pub fn select_choice(&mut self, data: &Value) -> ActionResponse {
        let choice_index = data.get("choice_index").and_then(Value::as_i64);
        let result = self.traversal().select_choice(choice_index);
        self.finish(result)
    }

    pub fn undo_choice(&mut self) -> ActionResponse {
        let result = self.traversal().undo();
        self.finish(result)
    }

    pub fn reset_activity(&mut self) -> ActionResponse {
        let result = self.traversal().reset();
        self.finish(result)
    }

    /// Save the editor's submission.
    ///
    /// Submissions that fail the strict checks change nothing. Otherwise the
    /// new scenario and settings are written, then the scenario is validated
    /// and any problems are reported to the author.
    pub fn studio_submit(&mut self, data: Value) -> SubmitResponse {
        let saved = serde_json::from_value::<StudioSubmission>(data)
            .map_err(SubmitError::from)
            .and_then(|submission| build_scenario(&submission, &self.settings));
        let saved = match saved {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Studio submission rejected: {e}");
                return SubmitResponse::rejected(e.field_errors());
            }
        };

        self.scenario = saved.scenario;
        self.settings = saved.settings;
        info!(
            "Saved scenario \"{}\" with {} nodes",
            self.settings.display_name,
            self.scenario.len()
        );

        let errors = self.scenario.validate();
        if errors.is_empty() {
            SubmitResponse::Success
        } else {
            warn!("Saved scenario has {} validation errors", errors.len());
            SubmitResponse::rejected(errors)
        }
    }

    pub fn studio_state(&self) -> StudioState {
        StudioState {
            nodes: NodeMap::from_scenario(&self.scenario),
            enable_undo: self.settings.enable_undo,
            enable_scoring: self.settings.enable_scoring,
            enable_reset_activity: self.settings.enable_reset_activity,
            max_score: self.settings.max_score,
            display_name: self.settings.display_name.clone(),
            background_image_url: self.settings.background_image_url.clone(),
            background_image_alt_text: self.settings.background_image_alt_text.clone(),
            background_image_is_decorative: self.settings.background_image_is_decorative,
        }
    }

    fn traversal(&mut self) -> Traversal<'_> {
        Traversal::new(&self.scenario, &self.settings, &mut self.learner)
    }

    fn finish(&mut self, result: Result<Vec<Event>, ChoiceError>) -> ActionResponse {
        match result {
            Ok(events) => {
                for event in &events {
                    self.runtime.publish(event);
                }
                ActionResponse::ok(self.get_current_state())
            }
            Err(e) => {
                warn!("Learner action rejected: {e}");
                ActionResponse::failed(e)
            }
        }
    }
}
