//! Effects chain construction and teardown.
//!
//! The chain is rebuilt from scratch on every configuration change; there is
//! no incremental patching, so node parameters can never drift out of sync
//! with the configuration. Signal order is fixed:
//! sound -> reverb -> echo -> endpoint.

pub mod echo;
pub mod reverb;
pub mod spatial;

pub use echo::EchoNode;
pub use reverb::ReverbNode;

use crate::config::EffectsConfig;
use crate::error::AudioError;

/// The shared reverb/echo processing chain.
///
/// Nodes are parameter sets owned by the chain; per-sound DSP state is
/// instantiated from them when a sound is routed, so a later rebuild never
/// touches sounds that already started.
#[derive(Debug, Clone, Copy)]
pub struct EffectsChain {
    reverb: Option<ReverbNode>,
    echo: Option<EchoNode>,
}

impl EffectsChain {
    /// Build a chain from the effects configuration, or `None` when no
    /// stage is enabled.
    ///
    /// Construction wires from the endpoint backward: echo first, reverb
    /// second. A node rejecting its parameters fails the whole build; the
    /// partially built node is dropped on the error path so no half-built
    /// chain can be observed.
    pub fn build(cfg: &EffectsConfig, sample_rate: u32) -> Result<Option<Self>, AudioError> {
        if !cfg.reverb.enabled && !cfg.echo.enabled {
            return Ok(None);
        }

        let echo = if cfg.echo.enabled {
            let node = EchoNode::new(cfg.echo.delay_seconds, cfg.echo.decay, cfg.echo.taps)?;
            tracing::debug!(
                "Echo node ready: {} samples delay at {} Hz, {} taps",
                node.delay_samples(sample_rate),
                sample_rate,
                node.taps()
            );
            Some(node)
        } else {
            None
        };

        let reverb = if cfg.reverb.enabled {
            Some(ReverbNode::new(
                cfg.reverb.wetness,
                cfg.reverb.room_size,
                cfg.reverb.damping,
                cfg.reverb.width,
            )?)
        } else {
            None
        };

        Ok(Some(Self { reverb, echo }))
    }

    pub fn reverb(&self) -> Option<ReverbNode> {
        self.reverb
    }

    pub fn echo(&self) -> Option<EchoNode> {
        self.echo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EchoConfig, ReverbConfig};

    fn effects(reverb: bool, echo: bool) -> EffectsConfig {
        EffectsConfig {
            reverb: ReverbConfig {
                enabled: reverb,
                ..ReverbConfig::default()
            },
            echo: EchoConfig {
                enabled: echo,
                ..EchoConfig::default()
            },
            ..EffectsConfig::default()
        }
    }

    #[test]
    fn test_absent_when_nothing_enabled() {
        let chain = EffectsChain::build(&effects(false, false), 44_100).unwrap();
        assert!(chain.is_none());
    }

    #[test]
    fn test_builds_requested_stages() {
        let chain = EffectsChain::build(&effects(true, true), 44_100)
            .unwrap()
            .unwrap();
        assert!(chain.reverb().is_some());
        assert!(chain.echo().is_some());

        let chain = EffectsChain::build(&effects(true, false), 44_100)
            .unwrap()
            .unwrap();
        assert!(chain.reverb().is_some());
        assert!(chain.echo().is_none());

        let chain = EffectsChain::build(&effects(false, true), 44_100)
            .unwrap()
            .unwrap();
        assert!(chain.reverb().is_none());
        assert!(chain.echo().is_some());
    }

    #[test]
    fn test_invalid_echo_fails_whole_build() {
        let mut cfg = effects(true, true);
        cfg.echo.decay = 1.5;
        assert!(EffectsChain::build(&cfg, 44_100).is_err());
    }

    #[test]
    fn test_invalid_reverb_fails_whole_build() {
        let mut cfg = effects(true, true);
        cfg.reverb.room_size = 7.0;
        assert!(EffectsChain::build(&cfg, 44_100).is_err());
    }
}
