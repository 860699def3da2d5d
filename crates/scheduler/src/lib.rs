//! Sub-agent scheduler (C6): bounded spawner, lifecycle state machine,
//! cooperative cancel, periodic reap.

pub mod agent;
pub mod cancel;
pub mod scheduler;

pub use agent::{AgentStatus, SubAgent};
pub use cancel::CancelToken;
pub use scheduler::{ProviderRegistry, Scheduler, DEFAULT_MAX_AGENTS, DEFAULT_WAIT_TIMEOUT};
