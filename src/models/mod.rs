// Domain records for the catalog social graph.

pub mod book;
pub mod candidate;
pub mod comment;
pub mod feed;
pub mod interaction;
pub mod patch;
pub mod profile;

pub use book::{Book, ShelfItem};
pub use candidate::{BookCandidate, PersonCandidate};
pub use comment::Comment;
pub use feed::{FeedItem, FeedObjectKind};
pub use interaction::{AgentType, Interaction, InteractionType, ObjectType};
pub use patch::{BookPatch, ProfilePatch};
pub use profile::Profile;

/// Record ID type for entities and interactions.
pub type RecordId = i64;

/// Timestamp type, milliseconds since Unix epoch.
pub type Millis = i64;

/// Current time in milliseconds since Unix epoch.
pub fn current_time_millis() -> Millis {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
