//! Search provider module
//!
//! Defines the Provider trait, the concrete provider adapters and the registry
//! the orchestrator validates requested names against.

mod error;
mod loader;
mod registry;
mod traits;

// Provider implementations
pub mod baidu;
pub mod bing;
pub mod zhihu;

pub use error::ProviderError;
pub use loader::ProviderLoader;
pub use registry::{ProviderRegistry, ProviderSelection};
pub use traits::*;
