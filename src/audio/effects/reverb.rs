//! Freeverb-style reverb stage.
//!
//! `ReverbNode` maps the configuration scalars (wetness, room size, damping,
//! width) onto the internal filter parameters; `ReverbSource` instantiates
//! the comb/allpass banks per playing sound. The wet gain carries a fixed
//! 2/3 compensation so that 0.5 wetness sounds as loud as the dry path.

use std::collections::VecDeque;
use std::time::Duration;

use rodio::Source;

use crate::error::AudioError;

// Classic Freeverb tunings, in samples at 44.1 kHz.
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const TUNING_SAMPLE_RATE: f32 = 44_100.0;
const STEREO_SPREAD: usize = 23;

const FIXED_GAIN: f32 = 0.015;
const SCALE_WET: f32 = 3.0;
const SCALE_DRY: f32 = 2.0;
const SCALE_DAMP: f32 = 0.4;
const SCALE_ROOM: f32 = 0.28;
const OFFSET_ROOM: f32 = 0.7;
const ALLPASS_FEEDBACK: f32 = 0.5;

// Compensates the comb bank's wet-path gain relative to the dry path.
const WET_COMPENSATION: f32 = 2.0 / 3.0;

fn check_unit(name: &str, value: f32) -> Result<f32, AudioError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AudioError::InvalidEffectParameter(format!(
            "reverb {name} must be in [0, 1], got {value}"
        )));
    }
    Ok(value)
}

/// Validated reverb parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbNode {
    wetness: f32,
    room_size: f32,
    damping: f32,
    width: f32,
}

impl ReverbNode {
    pub fn new(wetness: f32, room_size: f32, damping: f32, width: f32) -> Result<Self, AudioError> {
        Ok(Self {
            wetness: check_unit("wetness", wetness)?,
            room_size: check_unit("room size", room_size)?,
            damping: check_unit("damping", damping)?,
            width: check_unit("width", width)?,
        })
    }

    fn feedback(&self) -> f32 {
        self.room_size * SCALE_ROOM + OFFSET_ROOM
    }

    fn damp(&self) -> f32 {
        self.damping * SCALE_DAMP
    }

    fn wet_gain(&self) -> f32 {
        self.wetness * SCALE_WET * WET_COMPENSATION
    }

    fn dry_gain(&self) -> f32 {
        (1.0 - self.wetness) * SCALE_DRY
    }

    /// Stereo wet mix: (own channel, opposite channel).
    fn wet_mix(&self) -> (f32, f32) {
        let wet = self.wet_gain();
        (wet * (self.width / 2.0 + 0.5), wet * ((1.0 - self.width) / 2.0))
    }

    fn tail_seconds(&self) -> f32 {
        0.5 + self.room_size
    }
}

/// Lowpass-feedback comb filter.
struct Comb {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp: f32,
    filter_store: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
            feedback,
            damp,
            filter_store: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filter_store = output * (1.0 - self.damp) + self.filter_store * self.damp;
        self.buffer[self.index] = input + self.filter_store * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        buffered - input
    }
}

/// One channel's filter bank.
struct ChannelBank {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl ChannelBank {
    fn new(node: &ReverbNode, sample_rate: u32, spread: usize) -> Self {
        let scale = sample_rate as f32 / TUNING_SAMPLE_RATE;
        let combs = COMB_TUNINGS
            .iter()
            .map(|&len| {
                let len = ((len + spread) as f32 * scale) as usize;
                Comb::new(len, node.feedback(), node.damp())
            })
            .collect();
        let allpasses = ALLPASS_TUNINGS
            .iter()
            .map(|&len| Allpass::new(((len + spread) as f32 * scale) as usize))
            .collect();
        Self { combs, allpasses }
    }

    fn process(&mut self, input: f32) -> f32 {
        let attenuated = input * FIXED_GAIN;
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(attenuated);
        }
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        wet
    }
}

/// Reverb DSP state for one playing sound.
///
/// Processes one interleaved frame at a time so the stereo width cross-mix
/// can read both channels' wet outputs.
pub struct ReverbSource<S> {
    inner: S,
    channels: u16,
    sample_rate: u32,
    banks: Vec<ChannelBank>,
    dry_gain: f32,
    wet_own: f32,
    wet_cross: f32,
    frame_in: Vec<f32>,
    frame_out: VecDeque<f32>,
    inner_done: bool,
    tail_frames: usize,
}

impl<S> ReverbSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, node: &ReverbNode) -> Self {
        let channels = inner.channels().max(1);
        let sample_rate = inner.sample_rate();
        let banks = (0..channels as usize)
            .map(|ch| ChannelBank::new(node, sample_rate, ch * STEREO_SPREAD))
            .collect();
        let (wet_own, wet_cross) = node.wet_mix();

        Self {
            inner,
            channels,
            sample_rate,
            banks,
            dry_gain: node.dry_gain(),
            wet_own,
            wet_cross,
            frame_in: Vec::with_capacity(channels as usize),
            frame_out: VecDeque::with_capacity(channels as usize),
            inner_done: false,
            tail_frames: (node.tail_seconds() * sample_rate as f32) as usize,
        }
    }

    fn fill_next_frame(&mut self) -> bool {
        self.frame_in.clear();
        for _ in 0..self.channels {
            let sample = if self.inner_done {
                0.0
            } else {
                match self.inner.next() {
                    Some(s) => s,
                    None => {
                        self.inner_done = true;
                        0.0
                    }
                }
            };
            self.frame_in.push(sample);
        }

        if self.inner_done {
            if self.tail_frames == 0 {
                return false;
            }
            self.tail_frames -= 1;
        }

        let wet: Vec<f32> = self
            .banks
            .iter_mut()
            .zip(&self.frame_in)
            .map(|(bank, &input)| bank.process(input))
            .collect();

        for ch in 0..self.channels as usize {
            // The cross term only exists for stereo; other layouts mix the
            // channel's own wet signal.
            let cross = if self.channels == 2 { wet[1 - ch] } else { wet[ch] };
            let out =
                self.frame_in[ch] * self.dry_gain + wet[ch] * self.wet_own + cross * self.wet_cross;
            self.frame_out.push_back(out);
        }
        true
    }
}

impl<S> Iterator for ReverbSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.frame_out.is_empty() && !self.fill_next_frame() {
            return None;
        }
        self.frame_out.pop_front()
    }
}

impl<S> Source for ReverbSource<S>
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
