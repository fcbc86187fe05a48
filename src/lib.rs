//! Force-directed layout and interaction engine for MCP proxy dataflow
//! graphs.
//!
//! Recorded tool calls or network flows go through [`graph::build`] into a
//! [`graph::FlowGraph`]; a [`engine::FlowEngine`] reconciles each graph into
//! persistent simulation state, steps the physics once per frame and
//! projects the result into a [`scene::RenderScene`].

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod interaction;
pub mod scene;
pub mod sim;
pub mod util;
pub mod viewport;

pub use config::{LayoutConfig, PhysicsConfig};
pub use engine::FlowEngine;
pub use error::{FlowGraphError, Result};
