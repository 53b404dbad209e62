use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::SubmitError;
use crate::fields::ScenarioSettings;
use crate::scenario::{Choice, Media, Node, NodeKind, Scenario};
use crate::score::coerce_score;

/// Largest number of node drafts one submission may carry.
pub const MAX_NODES: usize = 30;

/// Ids the editor hands out to nodes that have never been saved.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// The editor's save request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioSubmission {
    pub nodes: Vec<NodeDraft>,
    pub enable_undo: Option<bool>,
    pub enable_scoring: Option<bool>,
    pub enable_reset_activity: Option<bool>,
    /// Number or numeric string.
    pub max_score: Option<Value>,
    pub display_name: Option<String>,
    pub background_image_url: Option<String>,
    pub background_image_alt_text: Option<String>,
    pub background_image_is_decorative: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDraft {
    pub id: Option<String>,
    pub content: Option<String>,
    pub media: Option<MediaDraft>,
    pub left_image_url: Option<String>,
    pub right_image_url: Option<String>,
    pub hint: Option<String>,
    pub transcript_url: Option<String>,
    pub overlay_text: Option<bool>,
    pub choices: Vec<ChoiceDraft>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDraft {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceDraft {
    pub text: Option<String>,
    pub target_node_id: Option<String>,
    /// Validated strictly on save. An explicit `null` is rejected.
    pub score: Value,
    pub feedback: Option<String>,
    pub hint: Option<String>,
}

impl Default for ChoiceDraft {
    fn default() -> Self {
        Self {
            text: None,
            target_node_id: None,
            score: json!(0),
            feedback: None,
            hint: None,
        }
    }
}

/// A scenario and settings that passed the strict submission checks.
///
/// Graph-level problems such as dangling targets are not checked yet; run
/// [`Scenario::validate`] on the result.
#[derive(Debug, Clone)]
pub struct SavedScenario {
    pub scenario: Scenario,
    pub settings: ScenarioSettings,
}

/// A draft after id assignment. Choices still hold editor ids.
struct Staged<'a> {
    id: String,
    content: String,
    media: Media,
    left_image_url: String,
    right_image_url: String,
    hint: String,
    transcript_url: String,
    overlay_text: bool,
    choices: &'a [ChoiceDraft],
}

impl Staged<'_> {
    /// Placeholder drafts with nothing filled in are dropped on save.
    fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
            && self.media.url.trim().is_empty()
            && !self.choices.iter().any(|c| !c.is_blank())
    }
}

impl ChoiceDraft {
    fn is_blank(&self) -> bool {
        trimmed(&self.text).is_empty() && trimmed(&self.target_node_id).is_empty()
    }
}

/// Turn an editor submission into a new scenario and settings.
///
/// Nothing is committed here; `prior` supplies settings the submission leaves
/// out. An `Err` means the submission must not be written at all.
pub fn build_scenario(
    submission: &StudioSubmission,
    prior: &ScenarioSettings,
) -> Result<SavedScenario, SubmitError> {
    if submission.nodes.len() > MAX_NODES {
        warn!(
            "Rejecting submission with {} nodes (max {MAX_NODES})",
            submission.nodes.len()
        );
        return Err(SubmitError::TooManyNodes {
            max: MAX_NODES,
            count: submission.nodes.len(),
        });
    }

    let background_image_url = trimmed(&submission.background_image_url).to_string();
    let background_image_alt_text = trimmed(&submission.background_image_alt_text).to_string();
    let background_image_is_decorative = submission.background_image_is_decorative.unwrap_or(false);
    if !background_image_url.is_empty()
        && !background_image_is_decorative
        && background_image_alt_text.is_empty()
    {
        warn!("Rejecting submission: background image has no alt text");
        return Err(SubmitError::MissingAltText);
    }

    let mut errors = Vec::new();

    let max_score = match &submission.max_score {
        None | Some(Value::Null) => prior.max_score,
        Some(raw) => parse_max_score(raw).unwrap_or_else(|| {
            errors.push("Maximum score must be a number.".to_string());
            prior.max_score
        }),
    };

    let (staged, id_map) = assign_ids(&submission.nodes);

    let mut nodes: Vec<Node> = Vec::new();
    let mut seen = HashSet::new();
    for draft in staged {
        if draft.is_blank() {
            debug!("Dropping blank node {}", draft.id);
            continue;
        }

        if !seen.insert(draft.id.clone()) {
            errors.push(format!("Duplicate node ID {}.", draft.id));
            continue;
        }

        let mut choices = Vec::new();
        for raw in draft.choices.iter().filter(|c| !c.is_blank()) {
            let Some(score) = coerce_score(&raw.score) else {
                errors.push(format!(
                    "Choice score must be an integer between 0 and 100 in node {}.",
                    draft.id
                ));
                continue;
            };
            let target = trimmed(&raw.target_node_id);
            choices.push(Choice {
                text: trimmed(&raw.text).to_string(),
                target_node_id: id_map.get(target).cloned().unwrap_or_else(|| target.to_string()),
                score,
                feedback: non_blank(&raw.feedback),
                hint: non_blank(&raw.hint),
            });
        }

        let kind = if nodes.is_empty() {
            NodeKind::Start
        } else {
            NodeKind::Normal
        };
        nodes.push(Node {
            kind,
            id: draft.id,
            content: draft.content,
            media: Some(draft.media),
            left_image_url: draft.left_image_url.trim().to_string(),
            right_image_url: draft.right_image_url.trim().to_string(),
            overlay_text: draft.overlay_text,
            hint: draft.hint,
            transcript_url: draft.transcript_url,
            choices,
        });
    }

    if !errors.is_empty() {
        warn!("Rejecting submission with {} errors", errors.len());
        return Err(SubmitError::Invalid(errors));
    }

    let scenario = Scenario::from_nodes(&nodes)?;

    let settings = ScenarioSettings {
        display_name: submission
            .display_name
            .clone()
            .unwrap_or_else(|| prior.display_name.clone()),
        enable_undo: submission.enable_undo.unwrap_or(prior.enable_undo),
        enable_scoring: submission.enable_scoring.unwrap_or(prior.enable_scoring),
        enable_reset_activity: submission
            .enable_reset_activity
            .unwrap_or(prior.enable_reset_activity),
        max_score,
        background_image_url,
        background_image_alt_text,
        background_image_is_decorative,
    };

    info!(
        "Built scenario with {} nodes, start {:?}",
        scenario.len(),
        scenario.start_node_id
    );
    Ok(SavedScenario { scenario, settings })
}

/// First pass: give every draft its final id and record editor id -> final id.
fn assign_ids(drafts: &[NodeDraft]) -> (Vec<Staged<'_>>, HashMap<String, String>) {
    let mut taken: HashSet<String> = drafts
        .iter()
        .filter_map(|d| d.id.as_deref())
        .filter(|id| !is_temporary(id))
        .map(str::to_string)
        .collect();

    let mut id_map = HashMap::new();
    let mut staged = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let old_id = draft.id.as_deref().unwrap_or_default();
        let new_id = if is_temporary(old_id) {
            let minted = mint_id(&taken);
            taken.insert(minted.clone());
            minted
        } else {
            old_id.to_string()
        };
        if !old_id.is_empty() {
            id_map.insert(old_id.to_string(), new_id.clone());
        }

        let media = draft.media.clone().unwrap_or_default();
        staged.push(Staged {
            id: new_id,
            content: draft.content.clone().unwrap_or_default(),
            media: Media {
                media_type: media.media_type.unwrap_or_default(),
                url: media.url.unwrap_or_default(),
            },
            left_image_url: draft.left_image_url.clone().unwrap_or_default(),
            right_image_url: draft.right_image_url.clone().unwrap_or_default(),
            hint: draft.hint.clone().unwrap_or_default(),
            transcript_url: draft.transcript_url.clone().unwrap_or_default(),
            overlay_text: draft.overlay_text.unwrap_or(false),
            choices: &draft.choices,
        });
    }
    (staged, id_map)
}

/// Missing ids count as temporary.
pub fn is_temporary(id: &str) -> bool {
    id.is_empty() || id.starts_with(TEMP_ID_PREFIX)
}

fn mint_id(taken: &HashSet<String>) -> String {
    loop {
        let hex = Uuid::new_v4().simple().to_string();
        let id = format!("node-{}", &hex[..6]);
        if !taken.contains(&id) {
            return id;
        }
    }
}

fn parse_max_score(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default().trim()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    Some(trimmed(value)).filter(|s| !s.is_empty()).map(str::to_string)
}
