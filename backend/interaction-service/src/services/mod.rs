/// Business logic layer
///
/// - `interactions`: moderation-gated post creation, likes, feed/thread/detail
///   reads and derived notifications
pub mod interactions;

pub use interactions::{CreatePostInput, InteractionService, ModerationPolicy};
