pub mod capability;
pub mod config;
pub mod error;
pub mod session;
pub mod trace_event;

pub use capability::{ModelCapability, ModelRole, ProviderOverride, ToolSupport};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{Message, MessageRole, Session, SessionOrigin};
pub use trace_event::{EventKind, TraceEvent, TraceStatus};
