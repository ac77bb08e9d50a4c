/// Interaction Service Library
///
/// Posts, threaded replies and likes for the Nova social platform. Every new
/// post passes through an external text classifier before it is stored, and
/// read paths return posts annotated with per-viewer aggregates.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `models`: Posts, likes, profiles, moderation verdicts, outcomes
/// - `services`: Moderation-gated post creation and read operations
/// - `moderation`: Classifier seam, prompt construction, verdict parsing
/// - `db`: `InteractionStore` trait and the PostgreSQL implementation
/// - `middleware`: Bearer token verification
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod moderation;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
