//! Playback backend abstraction and the rodio implementation.
//!
//! The engine only depends on `AudioBackend` and `SoundHandle`; the rodio
//! backend owns the output-stream endpoint every sound mixes into, while the
//! stream itself stays on the thread that opened it.

use std::io::Cursor;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source, SpatialSink};

use super::effects::echo::EchoSource;
use super::effects::reverb::ReverbSource;
use super::effects::spatial::{LEFT_EAR, RIGHT_EAR};
use super::effects::{EchoNode, ReverbNode};
use crate::error::AudioError;

/// Everything a new sound needs to reach the device endpoint, captured at
/// creation time. An instance is never re-routed after it starts.
#[derive(Debug, Clone, Copy)]
pub struct SoundRoute {
    /// Resolved playback volume (requested x master), already clamped.
    pub volume: f32,
    /// Emitter position when spatialization is enabled.
    pub position: Option<[f32; 3]>,
    pub reverb: Option<ReverbNode>,
    pub echo: Option<EchoNode>,
}

/// One in-flight playable object. Exclusively owned by its instance and
/// released exactly once, on drop.
pub trait SoundHandle: Send {
    fn is_playing(&self) -> bool;
    fn set_volume(&self, volume: f32);
    fn stop(&self);
}

/// Playback device abstraction.
pub trait AudioBackend: Send + Sync {
    /// Nominal engine sample rate, used for chain-level parameter mapping.
    fn sample_rate(&self) -> u32;

    /// Decode `path`, apply the route (volume, spatial position, effect
    /// stages in sound -> reverb -> echo -> endpoint order) and start
    /// playback.
    fn create_sound(
        &self,
        path: &Path,
        route: &SoundRoute,
    ) -> Result<Box<dyn SoundHandle>, AudioError>;
}

enum RodioHandle {
    Flat(Sink),
    Spatial(SpatialSink),
}

impl SoundHandle for RodioHandle {
    fn is_playing(&self) -> bool {
        match self {
            RodioHandle::Flat(sink) => !sink.empty(),
            RodioHandle::Spatial(sink) => !sink.empty(),
        }
    }

    fn set_volume(&self, volume: f32) {
        match self {
            RodioHandle::Flat(sink) => sink.set_volume(volume),
            RodioHandle::Spatial(sink) => sink.set_volume(volume),
        }
    }

    fn stop(&self) {
        match self {
            RodioHandle::Flat(sink) => sink.stop(),
            RodioHandle::Spatial(sink) => sink.stop(),
        }
    }
}

/// rodio-backed playback device.
pub struct RodioBackend {
    stream_handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Open the default output device.
    ///
    /// The returned `OutputStream` is not `Send` and must be kept alive on
    /// the calling thread for the duration of playback; the backend itself
    /// only holds the shareable handle.
    pub fn init() -> Result<(OutputStream, Self), AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::DeviceInit(Box::new(e)))?;
        tracing::info!("Audio output device opened");
        Ok((stream, Self { stream_handle }))
    }
}

impl AudioBackend for RodioBackend {
    fn sample_rate(&self) -> u32 {
        // rodio resamples per sink; the nominal rate only feeds parameter
        // mapping and logs.
        44_100
    }

    fn create_sound(
        &self,
        path: &Path,
        route: &SoundRoute,
    ) -> Result<Box<dyn SoundHandle>, AudioError> {
        let data = std::fs::read(path).map_err(|source| AudioError::LoadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let decoder =
            Decoder::new(Cursor::new(data)).map_err(|e| AudioError::DecodeFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;

        // Wrap the decoded source stage by stage; the boxed chain keeps the
        // fixed sound -> reverb -> echo order.
        let mut source: Box<dyn Source<Item = f32> + Send> =
            Box::new(decoder.convert_samples());
        if let Some(reverb) = &route.reverb {
            source = Box::new(ReverbSource::new(source, reverb));
        }
        if let Some(echo) = &route.echo {
            source = Box::new(EchoSource::new(source, echo));
        }

        let handle = match route.position {
            Some(position) => {
                let sink =
                    SpatialSink::try_new(&self.stream_handle, position, LEFT_EAR, RIGHT_EAR)
                        .map_err(|e| AudioError::SinkFailed(Box::new(e)))?;
                sink.set_volume(route.volume);
                sink.append(source);
                sink.play();
                RodioHandle::Spatial(sink)
            }
            None => {
                let sink = Sink::try_new(&self.stream_handle)
                    .map_err(|e| AudioError::SinkFailed(Box::new(e)))?;
                sink.set_volume(route.volume);
                sink.append(source);
                sink.play();
                RodioHandle::Flat(sink)
            }
        };

        Ok(Box::new(handle))
    }
}
