// Application layer: the two concrete pipelines and what they share.

pub mod pipelines;
pub mod report;
pub mod services;

pub use pipelines::{run_pipeline, PipelineKind, PipelineRun};
pub use services::AgentServices;
