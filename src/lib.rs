pub mod agents;
pub mod config;
pub mod context;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod web;
