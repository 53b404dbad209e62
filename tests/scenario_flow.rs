//! End-to-end flows through the handler facade.

use branching::block::SubmitResponse;
use branching::{BranchingBlock, Event, EventLog};
use serde_json::{json, Value};

fn block(content: Value, settings: Value) -> BranchingBlock<EventLog> {
    BranchingBlock::from_records(Some(&settings), Some(&content), None, EventLog::new())
}

#[test]
fn test_scored_path_to_end_node() {
    let mut block = block(
        json!({
            "nodes": {
                "A": {"id": "A", "type": "start", "choices": [{"text": "go", "target_node_id": "B", "score": 40}]},
                "B": {"id": "B", "choices": []}
            },
            "start_node_id": "A"
        }),
        json!({"enable_scoring": true, "max_score": 100}),
    );

    let response = block.handle("select_choice", json!({"choice_index": 0})).unwrap();
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["current_node_id"], json!("B"));
    assert_eq!(response["score"], json!(40.0));
    assert_eq!(response["has_completed"], json!(true));

    let events = &block.runtime().events;
    assert!(events.contains(&Event::Completion { completion: 1.0 }));
    assert!(events.contains(&Event::Grade {
        value: 40.0,
        max_value: 100.0
    }));
}

#[test]
fn test_select_then_undo_restores_learner() {
    let mut block = block(
        json!({
            "nodes": {
                "A": {"id": "A", "choices": [{"text": "go", "target_node_id": "B", "score": 30}]},
                "B": {"id": "B", "choices": [{"text": "end", "target_node_id": "C", "score": 20}]},
                "C": {"id": "C", "choices": []}
            },
            "start_node_id": "A"
        }),
        json!({"enable_scoring": true, "enable_undo": true}),
    );
    block.select_choice(&json!({"choice_index": 0}));
    let before = block.learner.clone();

    let done = block.select_choice(&json!({"choice_index": 0}));
    assert!(done.success);
    assert!(block.learner.has_completed);

    let undone = block.undo_choice();
    assert!(undone.success);
    assert_eq!(block.learner.current_node_id, before.current_node_id);
    assert_eq!(block.learner.score, before.score);
    assert_eq!(block.learner.has_completed, before.has_completed);
}

#[test]
fn test_blank_draft_saves_empty_scenario() {
    let mut block = BranchingBlock::new(EventLog::new());
    let response = block.studio_submit(json!({
        "nodes": [{"id": "", "content": "", "media": {"url": ""}, "choices": []}]
    }));
    assert!(!response.is_success());
    assert!(block.scenario.is_empty());
    assert_eq!(block.scenario.start_node_id, None);
}

#[test]
fn test_temp_targets_point_at_minted_ids() {
    let mut block = BranchingBlock::new(EventLog::new());
    let response = block.studio_submit(json!({
        "nodes": [
            {"id": "temp-1", "content": "First", "choices": [{"text": "next", "target_node_id": "temp-2"}]},
            {"id": "temp-2", "content": "Second", "choices": []}
        ],
        "enable_undo": true
    }));
    assert_eq!(response, SubmitResponse::Success);

    let nodes = block.scenario.nodes();
    assert_eq!(nodes.len(), 2);
    assert!(!nodes[1].id.starts_with("temp-"));
    assert_eq!(nodes[0].choices[0].target_node_id, nodes[1].id);
    assert!(block.settings.enable_undo);

    // A learner can walk the saved graph straight away.
    let walked = block.select_choice(&json!({"choice_index": 0}));
    assert!(walked.success);
    assert_eq!(block.learner.current_node_id.as_deref(), Some(nodes[1].id.as_str()));
}

#[test]
fn test_two_defects_two_messages() {
    let mut block = block(
        json!({
            "nodes": {"A": {"id": "A", "choices": [{"text": "x", "target_node_id": "missing"}]}},
            "start_node_id": "nope"
        }),
        json!({}),
    );
    assert_eq!(block.scenario.validate().len(), 2);

    let state = block.handle("get_current_state", json!({})).unwrap();
    assert_eq!(state["current_node"], Value::Null);
    let failed = block.handle("select_choice", json!({"choice_index": 0})).unwrap();
    assert_eq!(failed["error"], json!("Invalid choice"));
    block.scenario.start_node_id = Some("A".into());
    block.learner = Default::default();
    let failed = block.handle("select_choice", json!({"choice_index": 0})).unwrap();
    assert_eq!(failed["error"], json!("Target node missing not found"));
}
