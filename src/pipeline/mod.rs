//! Stage pipeline: a fixed chain of LLM stages over one shared state.
//!
//! 1. `state` holds the record every stage reads from and the typed patch
//!    each stage hands back.
//! 2. `stage` defines the stages and renders their prompts.
//! 3. `graph` walks the chain START → stages → END, merging each patch and
//!    checkpointing the session after every step.

pub mod graph;
pub mod stage;
pub mod state;

pub use graph::{PipelineGraph, RunReport, StageResult};
pub use stage::{validate_order, Stage, StageKind};
pub use state::{PipelineState, StateField, StateUpdate};
