//! Registry of currently-playing sound instances.
//!
//! The registry owns every live handle and is only ever touched while the
//! engine's lock is held. Reclamation is the single removal path: `stop`
//! and completed fades halt playback, and the next reclaim pass releases
//! the handle.

use super::backend::SoundHandle;
use super::fade::FadeState;

/// Identity of a tracked sound. Positive for live instances; zero and
/// negative values are the "no instance / synchronous / failure" sentinel.
pub type SoundId = i64;

/// Sentinel returned when a play request was dropped or untracked.
pub const NO_SOUND: SoundId = 0;

pub const DEFAULT_CEILING: usize = 32;

/// One in-flight playback.
pub struct SoundInstance {
    pub(crate) id: SoundId,
    pub(crate) handle: Box<dyn SoundHandle>,
    /// Resolved volume (requested x master) the instance started with.
    pub(crate) volume: f32,
    pub(crate) fade: Option<FadeState>,
}

pub struct SoundRegistry {
    instances: Vec<SoundInstance>,
    next_id: SoundId,
    ceiling: usize,
}

impl SoundRegistry {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            next_id: 1,
            ceiling: DEFAULT_CEILING,
        }
    }

    /// Release every instance whose playback has naturally finished.
    ///
    /// Must run before every admission decision and on every tick so the
    /// live count never overcounts finished sounds.
    pub fn reclaim(&mut self) {
        self.instances.retain(|instance| {
            let playing = instance.handle.is_playing();
            if !playing {
                tracing::trace!("Reclaimed finished sound {}", instance.id);
            }
            playing
        });
    }

    /// Admission check. Call after `reclaim`; excess requests are dropped by
    /// the caller, never queued.
    pub fn has_capacity(&self) -> bool {
        self.instances.len() < self.ceiling
    }

    /// Track an already-started sound and hand out its id.
    pub fn register(&mut self, handle: Box<dyn SoundHandle>, volume: f32) -> SoundId {
        let id = self.next_id;
        self.next_id += 1;
        self.instances.push(SoundInstance {
            id,
            handle,
            volume,
            fade: None,
        });
        id
    }

    /// Linear lookup by id. Unknown ids are a benign race (the sound already
    /// finished), so callers treat `None` as a no-op.
    pub fn get_mut(&mut self, id: SoundId) -> Option<&mut SoundInstance> {
        self.instances.iter_mut().find(|instance| instance.id == id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SoundInstance> {
        self.instances.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn set_ceiling(&mut self, ceiling: usize) {
        self.ceiling = ceiling;
    }

    /// Stop and release every tracked instance.
    pub fn drain_all(&mut self) {
        for instance in &self.instances {
            instance.handle.stop();
        }
        let drained = self.instances.len();
        self.instances.clear();
        if drained > 0 {
            tracing::debug!("Drained {} active sounds", drained);
        }
    }
}

impl Default for SoundRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct StubHandle {
        playing: Arc<AtomicBool>,
    }

    impl StubHandle {
        fn new() -> (Self, Arc<AtomicBool>) {
            let playing = Arc::new(AtomicBool::new(true));
            (
                Self {
                    playing: Arc::clone(&playing),
                },
                playing,
            )
        }
    }

    impl SoundHandle for StubHandle {
        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }

        fn set_volume(&self, _volume: f32) {}

        fn stop(&self) {
            self.playing.store(false, Ordering::SeqCst);
        }
    }

    fn register_stub(registry: &mut SoundRegistry) -> (SoundId, Arc<AtomicBool>) {
        let (handle, playing) = StubHandle::new();
        let id = registry.register(Box::new(handle), 1.0);
        (id, playing)
    }

    #[test]
    fn test_ids_are_positive_and_monotonic() {
        let mut registry = SoundRegistry::new();
        let (a, _pa) = register_stub(&mut registry);
        let (b, _pb) = register_stub(&mut registry);
        let (c, _pc) = register_stub(&mut registry);

        assert!(a > NO_SOUND);
        assert!(b > a);
        assert!(c > b);
    }

    #[test]
    fn test_capacity_respects_ceiling() {
        let mut registry = SoundRegistry::new();
        registry.set_ceiling(2);

        assert!(registry.has_capacity());
        register_stub(&mut registry);
        assert!(registry.has_capacity());
        register_stub(&mut registry);
        assert!(!registry.has_capacity());
    }

    #[test]
    fn test_reclaim_releases_finished_sounds() {
        let mut registry = SoundRegistry::new();
        let (_a, playing_a) = register_stub(&mut registry);
        let (b, _playing_b) = register_stub(&mut registry);

        playing_a.store(false, Ordering::SeqCst);
        registry.reclaim();

        assert_eq!(registry.len(), 1);
        assert!(registry.get_mut(b).is_some());
    }

    #[test]
    fn test_reclaim_frees_a_ceiling_slot() {
        let mut registry = SoundRegistry::new();
        registry.set_ceiling(1);
        let (_id, playing) = register_stub(&mut registry);
        assert!(!registry.has_capacity());

        playing.store(false, Ordering::SeqCst);
        registry.reclaim();
        assert!(registry.has_capacity());
    }

    #[test]
    fn test_unknown_id_lookup_is_none() {
        let mut registry = SoundRegistry::new();
        register_stub(&mut registry);
        assert!(registry.get_mut(999).is_none());
        assert!(registry.get_mut(NO_SOUND).is_none());
    }

    #[test]
    fn test_drain_all_stops_everything() {
        let mut registry = SoundRegistry::new();
        let (_a, playing_a) = register_stub(&mut registry);
        let (_b, playing_b) = register_stub(&mut registry);

        registry.drain_all();

        assert_eq!(registry.len(), 0);
        assert!(!playing_a.load(Ordering::SeqCst));
        assert!(!playing_b.load(Ordering::SeqCst));
    }
}
