//! Multi-tap echo stage.
//!
//! An `EchoNode` holds the validated parameters; per-sound DSP state lives
//! in `EchoSource`, which wraps a decoded source at routing time. Each tap
//! repeats the dry signal once more, attenuated by the decay raised to the
//! tap index.

use std::time::Duration;

use rodio::Source;

use crate::error::AudioError;

/// Pure mapping from delay-in-seconds to delay-in-samples.
pub fn delay_in_samples(delay_seconds: f32, sample_rate: u32) -> usize {
    ((delay_seconds * sample_rate as f32).round() as usize).max(1)
}

/// Validated echo parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoNode {
    delay_seconds: f32,
    decay: f32,
    taps: u32,
}

impl EchoNode {
    /// Validate and build an echo node. Decay must stay below 1.0 so the
    /// repeats die out; at least one tap is required for the node to do
    /// anything.
    pub fn new(delay_seconds: f32, decay: f32, taps: u32) -> Result<Self, AudioError> {
        if !delay_seconds.is_finite() || delay_seconds <= 0.0 {
            return Err(AudioError::InvalidEffectParameter(format!(
                "echo delay must be positive, got {delay_seconds}"
            )));
        }
        if !(0.0..1.0).contains(&decay) {
            return Err(AudioError::InvalidEffectParameter(format!(
                "echo decay must be in [0, 1), got {decay}"
            )));
        }
        if taps == 0 {
            return Err(AudioError::InvalidEffectParameter(
                "echo needs at least one tap".to_string(),
            ));
        }

        Ok(Self {
            delay_seconds,
            decay,
            taps,
        })
    }

    pub fn delay_samples(&self, sample_rate: u32) -> usize {
        delay_in_samples(self.delay_seconds, sample_rate)
    }

    pub fn taps(&self) -> u32 {
        self.taps
    }
}

/// Echo DSP state for one playing sound.
pub struct EchoSource<S> {
    inner: S,
    channels: u16,
    sample_rate: u32,
    delay: usize,
    gains: Vec<f32>,
    // One ring buffer of dry history per channel.
    history: Vec<Vec<f32>>,
    write_pos: usize,
    current_channel: usize,
    inner_done: bool,
    tail_remaining: usize,
}

impl<S> EchoSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, node: &EchoNode) -> Self {
        let channels = inner.channels().max(1);
        let sample_rate = inner.sample_rate();
        let delay = node.delay_samples(sample_rate);
        let gains: Vec<f32> = (1..=node.taps).map(|i| node.decay.powi(i as i32)).collect();

        let span = delay * node.taps as usize;
        let history = vec![vec![0.0; span]; channels as usize];

        Self {
            inner,
            channels,
            sample_rate,
            delay,
            gains,
            history,
            write_pos: 0,
            current_channel: 0,
            inner_done: false,
            // Tail keeps the last repeats audible after the dry sound ends.
            tail_remaining: span * channels as usize,
        }
    }
}

impl<S> Iterator for EchoSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let dry = if self.inner_done {
            None
        } else {
            let sample = self.inner.next();
            if sample.is_none() {
                self.inner_done = true;
            }
            sample
        };

        let dry = match dry {
            Some(sample) => sample,
            None => {
                if self.tail_remaining == 0 {
                    return None;
                }
                self.tail_remaining -= 1;
                0.0
            }
        };

        let span = self.history[0].len();
        let history = &mut self.history[self.current_channel];

        let mut out = dry;
        for (i, gain) in self.gains.iter().enumerate() {
            let back = (i + 1) * self.delay;
            let idx = (self.write_pos + span - back) % span;
            out += history[idx] * gain;
        }
        history[self.write_pos] = dry;

        self.current_channel += 1;
        if self.current_channel == self.channels as usize {
            self.current_channel = 0;
            self.write_pos = (self.write_pos + 1) % span;
        }

        Some(out)
    }
}

impl<S> Source for EchoSource<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::buffer::SamplesBuffer;

    #[test]
    fn test_delay_in_samples_mapping() {
        assert_eq!(delay_in_samples(0.3, 48_000), 14_400);
        assert_eq!(delay_in_samples(0.5, 44_100), 22_050);
        // Sub-sample delays still delay by at least one sample.
        assert_eq!(delay_in_samples(0.000001, 8_000), 1);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(EchoNode::new(0.0, 0.5, 3).is_err());
        assert!(EchoNode::new(-0.1, 0.5, 3).is_err());
        assert!(EchoNode::new(0.3, 1.0, 3).is_err());
        assert!(EchoNode::new(0.3, -0.1, 3).is_err());
        assert!(EchoNode::new(0.3, 0.5, 0).is_err());
        assert!(EchoNode::new(0.3, 0.5, 1).is_ok());
    }

    #[test]
    fn test_repeats_impulse_with_decay() {
        // Impulse at t=0, delay of 4 samples, 2 taps at decay 0.5.
        let node = EchoNode::new(4.0 / 1000.0, 0.5, 2).unwrap();
        let mut samples = vec![0.0f32; 16];
        samples[0] = 1.0;
        let source = SamplesBuffer::new(1, 1000, samples);

        let out: Vec<f32> = EchoSource::new(source, &node).collect();

        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[4] - 0.5).abs() < 1e-6);
        assert!((out[8] - 0.25).abs() < 1e-6);
        // Nothing between the taps.
        assert!(out[1..4].iter().all(|s| s.abs() < 1e-6));
        assert!(out[5..8].iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_tail_extends_past_dry_signal() {
        let node = EchoNode::new(4.0 / 1000.0, 0.5, 2).unwrap();
        let source = SamplesBuffer::new(1, 1000, vec![1.0f32; 4]);

        let out: Vec<f32> = EchoSource::new(source, &node).collect();

        // 4 dry samples plus a tail of taps * delay.
        assert_eq!(out.len(), 4 + 8);
        // The tail carries the delayed copies of the dry signal.
        assert!(out[4..].iter().any(|s| s.abs() > 1e-6));
    }

    #[test]
    fn test_preserves_channel_layout() {
        let node = EchoNode::new(0.01, 0.5, 1).unwrap();
        let source = SamplesBuffer::new(2, 44_100, vec![0.0f32; 8]);
        let echo = EchoSource::new(source, &node);

        assert_eq!(echo.channels(), 2);
        assert_eq!(echo.sample_rate(), 44_100);
    }
}
