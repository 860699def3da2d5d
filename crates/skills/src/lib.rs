//! Skill registry (C5): layered discovery across bundled/managed/workspace
//! roots with bounded concurrency and last-writer-wins precedence.

pub mod loader;
pub mod manifest;
pub mod registry;
pub mod types;

pub use registry::{discover, SkillsRegistry};
pub use types::{DiscoveryError, Layer, Skill};
