pub mod catalog;
pub mod mock;
pub mod resolver;
pub mod router;
pub mod traits;

pub use catalog::{embedded_defaults, Catalog};
pub use resolver::{resolve, Action, Request, Resolution};
pub use router::{select, RouteRequest};
pub use traits::LlmProvider;
