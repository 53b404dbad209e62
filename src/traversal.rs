use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::ChoiceError;
use crate::events::Event;
use crate::fields::{FieldScope, Persisted, ScenarioSettings};
use crate::scenario::{Node, Scenario};

/// One learner's progress through a scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerState {
    /// Unset until the first interaction.
    pub current_node_id: Option<String>,
    /// Previously visited node ids, most recent last. Only kept with undo on.
    pub history: Vec<String>,
    pub score: f64,
    /// Points awarded per step, so undo can subtract exactly what was added.
    pub score_history: Vec<f64>,
    pub has_completed: bool,
}

impl Persisted for LearnerState {
    const SCOPE: FieldScope = FieldScope::UserState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Unstarted,
    InProgress,
    Completed,
}

impl LearnerState {
    pub fn current_node_id(&self) -> Option<&str> {
        self.current_node_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn progress(&self) -> Progress {
        if self.has_completed {
            Progress::Completed
        } else if self.current_node_id().is_some() {
            Progress::InProgress
        } else {
            Progress::Unstarted
        }
    }
}

/// Learner transitions over a scenario.
///
/// Each transition returns the events the host should publish, in order.
pub struct Traversal<'a> {
    scenario: &'a Scenario,
    settings: &'a ScenarioSettings,
    state: &'a mut LearnerState,
}

impl<'a> Traversal<'a> {
    pub fn new(
        scenario: &'a Scenario,
        settings: &'a ScenarioSettings,
        state: &'a mut LearnerState,
    ) -> Self {
        Self {
            scenario,
            settings,
            state,
        }
    }

    /// Place the learner on the start node if they have no position yet.
    pub fn ensure_started(&mut self) {
        if self.state.current_node_id().is_some() {
            return;
        }
        if let Some(start) = self.scenario.start_node_id.as_deref() {
            if !start.is_empty() {
                debug!("Starting learner at node {start}");
                self.state.current_node_id = Some(start.to_string());
            }
        }
    }

    pub fn current_node(&self) -> Option<Node> {
        self.state
            .current_node_id()
            .and_then(|id| self.scenario.get_node(id))
    }

    pub fn can_undo(&self) -> bool {
        self.settings.enable_undo && !self.state.history.is_empty()
    }

    pub fn previous_node_id(&self) -> Option<&str> {
        self.state.history.last().map(String::as_str)
    }

    /// Take the choice at `choice_index` of the current node.
    pub fn select_choice(&mut self, choice_index: Option<i64>) -> Result<Vec<Event>, ChoiceError> {
        self.ensure_started();

        let node = self.current_node().ok_or(ChoiceError::InvalidChoice)?;
        let index = choice_index.ok_or(ChoiceError::InvalidChoice)?;
        let choice = usize::try_from(index)
            .ok()
            .and_then(|i| node.choice(i))
            .ok_or(ChoiceError::InvalidChoiceIndex)?;
        let target = self
            .scenario
            .get_node(&choice.target_node_id)
            .ok_or_else(|| ChoiceError::TargetNotFound(choice.target_node_id.clone()))?;

        // Positions are the keys nodes are stored under, not the records' own ids.
        let previous = self.state.current_node_id.replace(choice.target_node_id.clone());
        if self.settings.enable_undo {
            self.state.history.extend(previous);
        }
        info!("Transition: {} -> {}", node.id, choice.target_node_id);

        if self.settings.enable_scoring {
            let awarded = f64::from(choice.score);
            self.state.score += awarded;
            self.state.score_history.push(awarded);
            debug!("Awarded {awarded} points, total {}", self.state.score);
        }

        let mut events = Vec::new();
        if target.is_terminal() {
            info!("Scenario completed at node {}", target.id);
            self.state.has_completed = true;
            if self.settings.enable_scoring {
                events.push(self.grade_event());
            }
            events.push(Event::Completion { completion: 1.0 });
        }
        Ok(events)
    }

    /// Step back to the previously visited node.
    ///
    /// Completion is always cleared, even when the step undone was not the
    /// one that completed the scenario.
    pub fn undo(&mut self) -> Result<Vec<Event>, ChoiceError> {
        if !self.settings.enable_undo {
            return Err(ChoiceError::UndoNotAllowed);
        }
        let previous = self.state.history.pop().ok_or(ChoiceError::UndoNotAllowed)?;
        info!(
            "Undo: {} -> {previous}",
            self.state.current_node_id().unwrap_or("<none>")
        );
        self.state.current_node_id = Some(previous);

        let mut events = Vec::new();
        if self.settings.enable_scoring {
            let awarded = self.state.score_history.pop().unwrap_or(0.0);
            self.state.score = (self.state.score - awarded).max(0.0);
            events.push(self.grade_event());
        }

        self.state.has_completed = false;
        Ok(events)
    }

    /// Send the learner back to the start with a clean slate.
    pub fn reset(&mut self) -> Result<Vec<Event>, ChoiceError> {
        if !self.settings.enable_reset_activity {
            return Err(ChoiceError::ResetNotAllowed);
        }
        info!("Resetting learner state");

        self.state.current_node_id = None;
        self.state.history.clear();
        self.state.has_completed = false;

        let mut events = Vec::new();
        if self.settings.enable_scoring {
            self.state.score_history.clear();
            self.state.score = 0.0;
            events.push(self.grade_event());
        }

        self.ensure_started();
        events.push(Event::Completion { completion: 0.0 });
        Ok(events)
    }

    fn grade_event(&self) -> Event {
        Event::Grade {
            value: self.state.score,
            max_value: self.settings.max_score,
        }
    }
}
