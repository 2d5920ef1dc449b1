//! ClickSounds: keyboard and mouse sound effects.
//!
//! The playback engine in [`audio`] tracks concurrently playing sound
//! instances under one lock, enforces a concurrency ceiling, drives
//! time-based fade-outs and routes each new sound through an optional
//! reverb/echo chain. The remaining modules form the application shell:
//! input hooks, configuration with hot reload, and event handling.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod input;
pub mod key_mapping;
pub mod watcher;

pub use app::App;
pub use audio::{AudioBackend, AudioEngine, RodioBackend, SoundHandle, SoundId, SoundRoute, NO_SOUND};
pub use config::Config;
