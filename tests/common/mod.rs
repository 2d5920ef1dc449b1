//! Shared mock playback backend for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use clicksounds::audio::{AudioBackend, AudioEngine, SoundHandle, SoundRoute};
use clicksounds::error::AudioError;

/// Observable state of one mock sound.
pub struct MockControl {
    playing: AtomicBool,
    volumes: Mutex<Vec<f32>>,
}

impl MockControl {
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    /// Every volume the engine applied, in order (the creation volume
    /// first).
    pub fn volumes(&self) -> Vec<f32> {
        self.volumes.lock().clone()
    }
}

struct MockHandle(Arc<MockControl>);

impl SoundHandle for MockHandle {
    fn is_playing(&self) -> bool {
        self.0.is_playing()
    }

    fn set_volume(&self, volume: f32) {
        self.0.volumes.lock().push(volume);
    }

    fn stop(&self) {
        self.0.finish();
    }
}

#[derive(Default)]
pub struct MockState {
    sounds: Mutex<Vec<(PathBuf, SoundRoute, Arc<MockControl>)>>,
    fail_next: AtomicBool,
}

impl MockState {
    pub fn count(&self) -> usize {
        self.sounds.lock().len()
    }

    pub fn path(&self, index: usize) -> PathBuf {
        self.sounds.lock()[index].0.clone()
    }

    pub fn route(&self, index: usize) -> SoundRoute {
        self.sounds.lock()[index].1
    }

    pub fn control(&self, index: usize) -> Arc<MockControl> {
        Arc::clone(&self.sounds.lock()[index].2)
    }

    /// Make the next `create_sound` call fail like a decode error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

struct MockBackend(Arc<MockState>);

impl AudioBackend for MockBackend {
    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn create_sound(
        &self,
        path: &Path,
        route: &SoundRoute,
    ) -> Result<Box<dyn SoundHandle>, AudioError> {
        if self.0.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AudioError::DecodeFailed {
                path: path.display().to_string(),
                source: "mock decode failure".into(),
            });
        }

        let control = Arc::new(MockControl {
            playing: AtomicBool::new(true),
            volumes: Mutex::new(vec![route.volume]),
        });
        self.0
            .sounds
            .lock()
            .push((path.to_path_buf(), *route, Arc::clone(&control)));
        Ok(Box::new(MockHandle(control)))
    }
}

pub fn mock_engine() -> (AudioEngine, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let engine = AudioEngine::new(Box::new(MockBackend(Arc::clone(&state))));
    (engine, state)
}
