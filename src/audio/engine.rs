//! Playback façade.
//!
//! Every operation serializes on one `parking_lot::Mutex`; the engine has no
//! internal threads and expects an external caller to drive `update` at a
//! steady tens-of-milliseconds cadence. Nothing suspends while the lock is
//! held — decode and sink creation are fast, non-blocking device calls.

use std::path::Path;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::backend::{AudioBackend, SoundRoute};
use super::effects::{spatial, EffectsChain};
use super::fade::{FadeProgress, FadeState};
use super::registry::{SoundId, SoundRegistry, NO_SOUND};
use crate::config::{EffectsConfig, SpatializerConfig};

/// Poll interval for the synchronous fire-and-forget path.
const SYNC_POLL: Duration = Duration::from_millis(1);

struct EngineInner {
    registry: SoundRegistry,
    chain: Option<EffectsChain>,
    spatializer: SpatializerConfig,
    master_volume: f32,
    shut_down: bool,
}

impl EngineInner {
    /// Advance every armed fade to `now`; completed fades stop their sound
    /// and leave removal to the next reclaim pass.
    fn advance_fades(&mut self, now: Instant) {
        for instance in self.registry.iter_mut() {
            let Some(fade) = instance.fade else { continue };
            match fade.advance(now) {
                FadeProgress::Done => {
                    instance.handle.stop();
                    instance.fade = None;
                }
                FadeProgress::Ramping(volume) => instance.handle.set_volume(volume),
            }
        }
    }

    /// Snapshot what a new sound needs: resolved volume, spatial position,
    /// and the current chain's stages.
    fn route_for(&self, volume: f32) -> SoundRoute {
        let effective = (volume * self.master_volume).clamp(0.0, 1.0);
        let position = self
            .spatializer
            .enabled
            .then(|| spatial::pick_position(&self.spatializer));
        SoundRoute {
            volume: effective,
            position,
            reverb: self.chain.and_then(|c| c.reverb()),
            echo: self.chain.and_then(|c| c.echo()),
        }
    }
}

/// Concurrent sound-instance manager and effects router.
pub struct AudioEngine {
    backend: Box<dyn AudioBackend>,
    inner: Mutex<EngineInner>,
}

impl AudioEngine {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            inner: Mutex::new(EngineInner {
                registry: SoundRegistry::new(),
                chain: None,
                spatializer: SpatializerConfig::default(),
                master_volume: 1.0,
                shut_down: false,
            }),
        }
    }

    /// Play at full volume, tracked. Shorthand for `play_with_id_and_volume`.
    pub fn play(&self, path: &Path) -> SoundId {
        self.play_with_id_and_volume(path, 1.0, true)
    }

    pub fn play_with_id(&self, path: &Path) -> SoundId {
        self.play_with_id_and_volume(path, 1.0, true)
    }

    /// Start a sound and return its id, or the `NO_SOUND` sentinel when the
    /// request was dropped (ceiling reached, decode failure, shut down) or
    /// played synchronously.
    ///
    /// With `async_playback` false the call blocks until the sound finishes
    /// naturally; such sounds are untracked and consume no ceiling slot.
    pub fn play_with_id_and_volume(
        &self,
        path: &Path,
        volume: f32,
        async_playback: bool,
    ) -> SoundId {
        if !async_playback {
            self.play_blocking(path, volume);
            return NO_SOUND;
        }

        let mut inner = self.inner.lock();
        if inner.shut_down {
            return NO_SOUND;
        }

        inner.registry.reclaim();
        inner.advance_fades(Instant::now());

        if !inner.registry.has_capacity() {
            // Backpressure is a silent drop, not a fault.
            tracing::debug!("Sound dropped, concurrency ceiling reached");
            return NO_SOUND;
        }

        let route = inner.route_for(volume);
        match self.backend.create_sound(path, &route) {
            Ok(handle) => {
                let id = inner.registry.register(handle, route.volume);
                tracing::trace!(
                    "Started sound {} ({}) at volume {:.2}",
                    id,
                    path.display(),
                    route.volume
                );
                id
            }
            Err(e) => {
                tracing::warn!("Failed to start {}: {e}", path.display());
                NO_SOUND
            }
        }
    }

    /// Untracked synchronous playback: the route is captured under a short
    /// lock, then the sound plays and is polled to completion outside it,
    /// blocking only the calling thread.
    fn play_blocking(&self, path: &Path, volume: f32) {
        let route = {
            let inner = self.inner.lock();
            if inner.shut_down {
                return;
            }
            inner.route_for(volume)
        };

        match self.backend.create_sound(path, &route) {
            Ok(handle) => {
                while handle.is_playing() {
                    std::thread::sleep(SYNC_POLL);
                }
            }
            Err(e) => tracing::warn!("Failed to start {}: {e}", path.display()),
        }
    }

    /// Arm a fade-out on a live instance. Already-fading and unknown ids are
    /// a no-op; the volume ramp itself happens in `update`.
    pub fn fade_out_sound(&self, id: SoundId, duration_ms: u64) {
        let mut inner = self.inner.lock();
        if let Some(instance) = inner.registry.get_mut(id) {
            if instance.fade.is_none() {
                instance.fade = Some(FadeState::arm(Instant::now(), duration_ms, instance.volume));
                tracing::trace!("Fading out sound {} over {}ms", id, duration_ms);
            }
        }
    }

    /// Halt playback immediately. The instance is released on the next
    /// reclaim pass; unknown ids are ignored.
    pub fn stop_sound(&self, id: SoundId) {
        let mut inner = self.inner.lock();
        if let Some(instance) = inner.registry.get_mut(id) {
            instance.handle.stop();
        }
    }

    /// Periodic housekeeping: reclaim finished instances, advance fades.
    pub fn update(&self) {
        self.update_at(Instant::now());
    }

    /// `update` against a caller-supplied clock.
    pub fn update_at(&self, now: Instant) {
        let mut inner = self.inner.lock();
        inner.registry.reclaim();
        inner.advance_fades(now);
    }

    pub fn set_max_concurrent_sounds(&self, ceiling: usize) {
        self.inner.lock().registry.set_ceiling(ceiling);
    }

    /// Set the master volume, clamped to [0, 1]. Applies to sounds started
    /// afterward.
    pub fn set_master_volume(&self, volume: f32) {
        self.inner.lock().master_volume = volume.clamp(0.0, 1.0);
    }

    /// Rebuild the effects chain from `cfg`. On node construction failure
    /// the chain is reported absent and later sounds route straight to the
    /// endpoint. Sounds already playing are unaffected either way.
    pub fn set_audio_effects(&self, cfg: &EffectsConfig) {
        let mut inner = self.inner.lock();
        inner.spatializer = cfg.spatializer.clone();
        inner.chain = match EffectsChain::build(cfg, self.backend.sample_rate()) {
            Ok(chain) => chain,
            Err(e) => {
                tracing::warn!("Effects chain rebuild failed, routing dry: {e}");
                None
            }
        };
    }

    /// Number of currently tracked instances (after a reclaim pass).
    pub fn active_sounds(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.registry.reclaim();
        inner.registry.len()
    }

    /// Tear down the chain and drain every instance. Idempotent, and takes
    /// the same lock as every other call, so it is safe while calls are in
    /// flight. Subsequent plays return the sentinel.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        if inner.shut_down {
            return;
        }
        inner.chain = None;
        inner.registry.drain_all();
        inner.shut_down = true;
        tracing::info!("Audio engine shut down");
    }
}
