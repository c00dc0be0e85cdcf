//! Events in, per-voice control signals out.

pub mod allocator;
pub mod controller;
pub mod engine;
pub mod event;
pub mod keys;
pub mod message;
pub mod protocol;
pub mod queue;
pub mod voice;

pub use controller::ControllerSmoother;
pub use engine::EventsToSignals;
pub use event::{Event, EventKind};
pub use keys::{KeyState, KeyStateTable};
pub use message::EventSource;
pub use protocol::Protocol;
pub use queue::EventQueue;
pub use voice::{Voice, VoiceOutput};
