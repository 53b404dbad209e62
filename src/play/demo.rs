use serde_json::json;

use crate::authoring::{ChoiceDraft, NodeDraft, StudioSubmission};

fn draft(id: &str, content: &str, choices: Vec<ChoiceDraft>) -> NodeDraft {
    NodeDraft {
        id: Some(id.into()),
        content: Some(content.into()),
        choices,
        ..Default::default()
    }
}

fn choice(text: &str, target: &str, score: u32) -> ChoiceDraft {
    ChoiceDraft {
        text: Some(text.into()),
        target_node_id: Some(target.into()),
        score: json!(score),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Airport border control scenario
// ---------------------------------------------------------------------------

/// A small scenario with undo, scoring and reset turned on. Ids are fixed so
/// a saved learner state can be resumed across runs.
pub fn airport_security_submission() -> StudioSubmission {
    // The cooperative answer is always listed first.
    let nodes = vec![
        draft(
            "START",
            "Hello. Passport please.",
            vec![
                choice("Hand over your passport.", "PASSPORT_CHECK", 25),
                choice("Ask why they need it.", "FAILED", 0),
            ],
        ),
        draft(
            "PASSPORT_CHECK",
            "Thank you. Let me take a look... Where are you travelling from today?",
            vec![
                choice("From Frankfurt.", "QUESTION_PURPOSE", 25),
                choice("Does it matter?", "FAILED", 0),
            ],
        ),
        draft(
            "QUESTION_PURPOSE",
            "And what is the purpose of your visit?",
            vec![
                choice("Visiting family.", "LUGGAGE_CHECK", 25),
                choice("That's my business.", "FAILED_SUSPICIOUS", 0),
            ],
        ),
        NodeDraft {
            hint: Some("Declaring nothing is fine if you carry nothing unusual.".into()),
            ..draft(
                "LUGGAGE_CHECK",
                "Alright. Do you have anything to declare?",
                vec![
                    choice("Nothing to declare.", "CLEARED", 25),
                    ChoiceDraft {
                        feedback: Some("Some fruit is restricted at this border.".into()),
                        ..choice("A crate of oranges.", "FAILED_CONTRABAND", 5)
                    },
                ],
            )
        },
        // --- End nodes ---
        draft(
            "CLEARED",
            "Everything checks out. Welcome, and enjoy your stay!",
            vec![],
        ),
        draft(
            "FAILED",
            "I'm going to have to ask you to step aside. Security!",
            vec![],
        ),
        draft(
            "FAILED_SUSPICIOUS",
            "Your answers don't add up. Please follow me to secondary screening.",
            vec![],
        ),
        draft(
            "FAILED_CONTRABAND",
            "I'm going to need you to open your bags. Security has been notified.",
            vec![],
        ),
    ];

    StudioSubmission {
        nodes,
        enable_undo: Some(true),
        enable_scoring: Some(true),
        enable_reset_activity: Some(true),
        max_score: Some(json!(100)),
        display_name: Some("Airport Border Control".into()),
        ..Default::default()
    }
}
