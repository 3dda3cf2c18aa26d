pub mod delegate;
pub mod machine;
pub mod playback_state;

#[cfg(test)]
pub(crate) mod testing;

pub use delegate::{NoopDelegate, SessionDelegate, SpanInfo};
pub use machine::PlaybackStateMachine;
pub use playback_state::PlaybackState;
