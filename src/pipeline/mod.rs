//! Pipeline entry points.
//!
//! - `NotificationPipeline::run`: fetch → parse → gate → resolve → render
//! - `run_latest`: fetch and parse only, no card

pub mod notify;

pub use notify::{NotificationPipeline, PipelineOutcome, run_latest};
