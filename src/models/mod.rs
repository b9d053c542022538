pub mod event;
pub mod user;
pub mod user_state;

pub use event::{Event, EventChange, EventDraft, EventField, EventKind, EventRow};
pub use user::{Profile, User};
pub use user_state::{ConversationState, Step};
