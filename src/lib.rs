//! Branching scenario exercise: an authored graph of content nodes that
//! learners walk by picking choices, with optional undo, scoring and reset.
//!
//! The host runtime owns persistence, request routing and event delivery.
//! This crate owns the graph, its normalization and validation, the learner
//! state machine, and the authoring save path.

pub mod authoring;
pub mod block;
pub mod error;
pub mod events;
pub mod fields;
pub mod play;
pub mod scenario;
pub mod score;
pub mod traversal;

pub use block::BranchingBlock;
pub use error::{BlockError, ChoiceError, SubmitError};
pub use events::{Event, EventLog, LogPublisher, Publisher};
pub use scenario::{Choice, Node, Scenario};
pub use traversal::{LearnerState, Traversal};
