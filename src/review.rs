pub mod orchestrator;
pub mod render;
