//! Sound effects
//!
//! The engine only decides *which* effect plays; an [`AudioSink`] makes the
//! noise. Playback is fire-and-forget: failures come back as errors that the
//! session logs and drops. On the web, effects are synthesized with the Web
//! Audio API from a small tone table, so no asset files are needed.

use serde::{Deserialize, Serialize};

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleHit,
    /// Ball hits wall or rival bumps something
    WallHit,
    /// Obstacle hit (doesn't break)
    ObstacleHit,
    ObstacleDestroyed,
    PickupCollect,
    LaserFire,
    /// Last ball gone
    MoverLost,
    Crash,
    LevelComplete,
    GameOver,
    HighScore,
}

impl SoundEffect {
    /// Effect for a simulation event, if it makes a sound
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let effect = match event {
            GameEvent::WallBounce | GameEvent::Bump => SoundEffect::WallHit,
            GameEvent::PaddleHit => SoundEffect::PaddleHit,
            GameEvent::ObstacleHit { .. } => SoundEffect::ObstacleHit,
            GameEvent::ObstacleDestroyed { .. } => SoundEffect::ObstacleDestroyed,
            GameEvent::PowerUpCollected(_) => SoundEffect::PickupCollect,
            GameEvent::ProjectileFired => SoundEffect::LaserFire,
            GameEvent::MoverLost => SoundEffect::MoverLost,
            GameEvent::PlayerCrashed { .. } => SoundEffect::Crash,
            GameEvent::LevelCleared => SoundEffect::LevelComplete,
            GameEvent::GameOver {
                new_high_score: true,
                ..
            } => SoundEffect::HighScore,
            GameEvent::GameOver { .. } => SoundEffect::GameOver,
            GameEvent::CollectibleSpawned { .. }
            | GameEvent::PowerUpExpired(_)
            | GameEvent::VehiclePassed { .. }
            | GameEvent::LevelStarted(_) => return None,
        };
        Some(effect)
    }

    /// Whether this effect should win over others in the same frame
    fn priority(self) -> u8 {
        match self {
            SoundEffect::HighScore | SoundEffect::GameOver => 3,
            SoundEffect::LevelComplete | SoundEffect::MoverLost | SoundEffect::Crash => 2,
            SoundEffect::ObstacleDestroyed | SoundEffect::PickupCollect => 1,
            _ => 0,
        }
    }

    /// Distinct effects for a frame's events, most important first
    ///
    /// Each effect plays at most once per frame however many events map to it.
    pub fn for_events(events: &[GameEvent]) -> Vec<Self> {
        let mut effects: Vec<Self> = Vec::new();
        for effect in events.iter().filter_map(Self::for_event) {
            if !effects.contains(&effect) {
                effects.push(effect);
            }
        }
        effects.sort_by_key(|e| std::cmp::Reverse(e.priority()));
        effects
    }
}

/// Oscillator waveform of a tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One synthesized note: a frequency sweep under a decaying envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    pub freq_start: f32,
    pub freq_end: f32,
    /// Seconds after the effect starts
    pub delay: f64,
    /// Seconds
    pub length: f64,
    /// Peak gain before the master volume
    pub gain: f32,
}

const fn tone(wave: Wave, freq_start: f32, freq_end: f32, delay: f64, length: f64, gain: f32) -> Tone {
    Tone {
        wave,
        freq_start,
        freq_end,
        delay,
        length,
        gain,
    }
}

/// Tone recipe of every effect
pub fn tones(effect: SoundEffect) -> &'static [Tone] {
    use Wave::*;
    match effect {
        SoundEffect::PaddleHit => const { &[tone(Sine, 150.0, 60.0, 0.0, 0.12, 0.6)] },
        SoundEffect::WallHit => const { &[tone(Sine, 400.0, 400.0, 0.0, 0.08, 0.3)] },
        SoundEffect::ObstacleHit => const { &[tone(Triangle, 300.0, 250.0, 0.0, 0.08, 0.4)] },
        SoundEffect::ObstacleDestroyed => const { &[
            tone(Square, 600.0, 200.0, 0.0, 0.12, 0.25),
            tone(Triangle, 900.0, 450.0, 0.03, 0.1, 0.2),
        ] },
        SoundEffect::PickupCollect => const { &[
            tone(Sine, 523.0, 523.0, 0.0, 0.08, 0.35),
            tone(Sine, 659.0, 659.0, 0.07, 0.08, 0.35),
            tone(Sine, 784.0, 784.0, 0.14, 0.12, 0.35),
        ] },
        SoundEffect::LaserFire => const { &[tone(Sawtooth, 1200.0, 300.0, 0.0, 0.1, 0.15)] },
        SoundEffect::MoverLost => const { &[tone(Sawtooth, 300.0, 40.0, 0.0, 0.6, 0.4)] },
        SoundEffect::Crash => const { &[
            tone(Square, 120.0, 30.0, 0.0, 0.4, 0.5),
            tone(Sawtooth, 80.0, 20.0, 0.05, 0.5, 0.4),
        ] },
        SoundEffect::LevelComplete => const { &[
            tone(Triangle, 523.0, 523.0, 0.0, 0.12, 0.4),
            tone(Triangle, 659.0, 659.0, 0.12, 0.12, 0.4),
            tone(Triangle, 784.0, 784.0, 0.24, 0.12, 0.4),
            tone(Triangle, 1047.0, 1047.0, 0.36, 0.3, 0.4),
        ] },
        SoundEffect::GameOver => const { &[
            tone(Triangle, 392.0, 392.0, 0.0, 0.25, 0.4),
            tone(Triangle, 330.0, 330.0, 0.25, 0.25, 0.4),
            tone(Triangle, 262.0, 196.0, 0.5, 0.6, 0.4),
        ] },
        SoundEffect::HighScore => const { &[
            tone(Square, 784.0, 784.0, 0.0, 0.1, 0.25),
            tone(Square, 988.0, 988.0, 0.1, 0.1, 0.25),
            tone(Square, 1175.0, 1175.0, 0.2, 0.1, 0.25),
            tone(Square, 1568.0, 1568.0, 0.3, 0.4, 0.25),
        ] },
    }
}

/// Fire-and-forget sound output
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect, volume: f32) -> anyhow::Result<()>;
}

/// Silent sink for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect, _volume: f32) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Web Audio synthesizer
///
/// Owns the `AudioContext`; it is closed when the sink is dropped.
#[cfg(target_arch = "wasm32")]
pub struct WebAudio {
    ctx: web_sys::AudioContext,
}

#[cfg(target_arch = "wasm32")]
impl WebAudio {
    pub fn new() -> anyhow::Result<Self> {
        let ctx = web_sys::AudioContext::new()
            .map_err(|e| anyhow::anyhow!("failed to create AudioContext: {:?}", e))?;
        Ok(Self { ctx })
    }

    fn play_tone(&self, tone: &Tone, volume: f32) -> anyhow::Result<()> {
        use web_sys::OscillatorType;

        let js = |e: wasm_bindgen::JsValue| anyhow::anyhow!("{:?}", e);
        let osc = self.ctx.create_oscillator().map_err(js)?;
        let gain = self.ctx.create_gain().map_err(js)?;
        osc.set_type(match tone.wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Sawtooth => OscillatorType::Sawtooth,
            Wave::Triangle => OscillatorType::Triangle,
        });
        osc.connect_with_audio_node(&gain).map_err(js)?;
        gain.connect_with_audio_node(&self.ctx.destination())
            .map_err(js)?;

        let start = self.ctx.current_time() + tone.delay;
        let end = start + tone.length;
        osc.frequency()
            .set_value_at_time(tone.freq_start, start)
            .map_err(js)?;
        if tone.freq_end != tone.freq_start {
            osc.frequency()
                .exponential_ramp_to_value_at_time(tone.freq_end.max(1.0), end)
                .map_err(js)?;
        }
        gain.gain()
            .set_value_at_time(tone.gain * volume, start)
            .map_err(js)?;
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, end)
            .map_err(js)?;
        osc.start_with_when(start).map_err(js)?;
        osc.stop_with_when(end + 0.02).map_err(js)?;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl AudioSink for WebAudio {
    fn play(&mut self, effect: SoundEffect, volume: f32) -> anyhow::Result<()> {
        if volume <= 0.0 {
            return Ok(());
        }
        // Browsers start the context suspended until a user gesture
        if self.ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = self.ctx.resume();
        }
        for tone in tones(effect) {
            self.play_tone(tone, volume)?;
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for WebAudio {
    fn drop(&mut self) {
        let _ = self.ctx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PowerUpKind;

    #[test]
    fn test_event_mapping() {
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PaddleHit),
            Some(SoundEffect::PaddleHit)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::GameOver {
                score: 10,
                new_high_score: true
            }),
            Some(SoundEffect::HighScore)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PowerUpExpired(PowerUpKind::Laser)),
            None
        );
    }

    #[test]
    fn test_frame_effects_are_deduplicated_and_ordered() {
        let events = [
            GameEvent::WallBounce,
            GameEvent::WallBounce,
            GameEvent::MoverLost,
            GameEvent::WallBounce,
        ];
        assert_eq!(
            SoundEffect::for_events(&events),
            vec![SoundEffect::MoverLost, SoundEffect::WallHit]
        );
    }

    #[test]
    fn test_every_effect_has_audible_tones() {
        let all = [
            SoundEffect::PaddleHit,
            SoundEffect::WallHit,
            SoundEffect::ObstacleHit,
            SoundEffect::ObstacleDestroyed,
            SoundEffect::PickupCollect,
            SoundEffect::LaserFire,
            SoundEffect::MoverLost,
            SoundEffect::Crash,
            SoundEffect::LevelComplete,
            SoundEffect::GameOver,
            SoundEffect::HighScore,
        ];
        for effect in all {
            let tones = tones(effect);
            assert!(!tones.is_empty(), "{effect:?}");
            assert!(tones.iter().all(|t| t.gain > 0.0 && t.length > 0.0 && t.freq_end > 0.0));
        }
    }

    #[test]
    fn test_null_sink_never_fails() {
        assert!(NullAudio.play(SoundEffect::Crash, 1.0).is_ok());
    }
}
