//! The sound-instance manager and effects-routing engine.

pub mod backend;
pub mod effects;
pub mod engine;
pub mod fade;
pub mod registry;

pub use backend::{AudioBackend, RodioBackend, SoundHandle, SoundRoute};
pub use engine::AudioEngine;
pub use registry::{SoundId, NO_SOUND};
