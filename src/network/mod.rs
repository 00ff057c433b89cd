//! HTTP networking module
//!
//! Plain-transport HTTP client plus the process-wide header template.

mod client;
mod user_agent;

pub use client::{HttpClient, HttpResponse, CHALLENGE_MARKERS};
pub use user_agent::{accept_html, accept_json, accept_language, generate_user_agent};
