//! Web server module
//!
//! Exposes the search aggregation over HTTP as a JSON API.

mod handlers;
mod routes;
mod state;

pub use handlers::{Envelope, SearchParams};
pub use routes::create_router;
pub use state::AppState;
