//! Synthesised sound cues.
//!
//! Cues are described as plain data so the room logic can be tested without
//! an audio device. A platform [`AudioSink`] turns them into sound.

use log::debug;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
pub mod wasm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    Click,
    Meow,
    Purr,
    Static,
    Keypress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// One scheduled sound, `delay` seconds after the cue fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sound {
    /// Oscillator decaying exponentially over `duration`.
    Tone {
        frequency: f32,
        duration: f32,
        waveform: Waveform,
        volume: f32,
        delay: f32,
    },
    /// Uniform white noise in `-amplitude..amplitude`.
    Noise {
        duration: f32,
        amplitude: f32,
        delay: f32,
    },
}

impl Sound {
    pub fn delay(&self) -> f32 {
        match *self {
            Self::Tone { delay, .. } | Self::Noise { delay, .. } => delay,
        }
    }

    /// Sample buffer for noise bursts. Tones are synthesized by the output.
    pub fn samples(&self, sample_rate: f32, rng: &mut dyn RngCore) -> Option<Vec<f32>> {
        match *self {
            Self::Noise {
                duration,
                amplitude,
                ..
            } => Some(noise_samples(sample_rate, duration, amplitude, rng)),
            Self::Tone { .. } => None,
        }
    }
}

const PURR_PULSES: usize = 10;
const PURR_SPACING: f32 = 0.08;

impl Cue {
    /// Expands the cue into the sounds that make it up.
    pub fn sounds(self, rng: &mut dyn RngCore) -> Vec<Sound> {
        match self {
            Self::Click => vec![tone(1200.0, 0.05, Waveform::Square, 0.05, 0.0)],
            Self::Meow => vec![
                tone(600.0, 0.1, Waveform::Sine, 0.15, 0.0),
                tone(400.0, 0.2, Waveform::Sine, 0.12, 0.1),
            ],
            Self::Purr => (0..PURR_PULSES)
                .map(|i| {
                    let frequency = 80.0 + rng.gen::<f32>() * 20.0;
                    tone(
                        frequency,
                        0.1,
                        Waveform::Triangle,
                        0.05,
                        i as f32 * PURR_SPACING,
                    )
                })
                .collect(),
            Self::Static => vec![Sound::Noise {
                duration: 0.1,
                amplitude: 0.1,
                delay: 0.0,
            }],
            Self::Keypress => {
                let frequency = 800.0 + rng.gen::<f32>() * 400.0;
                vec![tone(frequency, 0.03, Waveform::Square, 0.02, 0.0)]
            }
        }
    }
}

fn tone(frequency: f32, duration: f32, waveform: Waveform, volume: f32, delay: f32) -> Sound {
    Sound::Tone {
        frequency,
        duration,
        waveform,
        volume,
        delay,
    }
}

/// Fills a mono buffer with noise for [`Sound::Noise`].
pub fn noise_samples(
    sample_rate: f32,
    duration: f32,
    amplitude: f32,
    rng: &mut dyn RngCore,
) -> Vec<f32> {
    let len = (sample_rate * duration).max(0.0) as usize;
    (0..len)
        .map(|_| (rng.gen::<f32>() * 2.0 - 1.0) * amplitude)
        .collect()
}

/// Plays cues on whatever output the platform offers.
///
/// Sinks must never fail loudly: with no output device they stay silent.
pub trait AudioSink {
    /// Called from a user gesture, which browsers require before playback.
    fn resume(&mut self) {}

    fn play(&mut self, cue: Cue, sounds: &[Sound]);
}

/// Sink that only reports cues in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSink for LogSink {
    fn play(&mut self, cue: Cue, sounds: &[Sound]) {
        debug!("audio cue {cue:?} ({} sounds)", sounds.len());
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn meow_is_two_falling_tones() {
        let mut rng = StdRng::seed_from_u64(1);
        let sounds = Cue::Meow.sounds(&mut rng);
        assert_eq!(sounds.len(), 2);
        match (sounds[0], sounds[1]) {
            (
                Sound::Tone { frequency: high, .. },
                Sound::Tone {
                    frequency: low,
                    delay,
                    ..
                },
            ) => {
                assert!(high > low);
                assert!((delay - 0.1).abs() < 1e-6);
            }
            other => panic!("unexpected sounds {other:?}"),
        }
    }

    #[test]
    fn purr_pulses_stay_in_the_low_band() {
        let mut rng = StdRng::seed_from_u64(7);
        let sounds = Cue::Purr.sounds(&mut rng);
        assert_eq!(sounds.len(), 10);
        for (i, sound) in sounds.iter().enumerate() {
            let Sound::Tone {
                frequency,
                waveform,
                ..
            } = *sound
            else {
                panic!("purr must be tonal");
            };
            assert!((80.0..100.0).contains(&frequency));
            assert_eq!(waveform, Waveform::Triangle);
            assert!((sound.delay() - i as f32 * 0.08).abs() < 1e-6);
        }
    }

    #[test]
    fn static_noise_respects_amplitude() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples = noise_samples(44_100.0, 0.1, 0.1, &mut rng);
        assert_eq!(samples.len(), 4410);
        assert!(samples.iter().all(|s| s.abs() <= 0.1));
    }

    #[test]
    fn static_cue_fills_a_buffer_at_the_device_rate() {
        let mut rng = StdRng::seed_from_u64(11);
        let sounds = Cue::Static.sounds(&mut rng);
        let samples = sounds[0].samples(48_000.0, &mut rng).unwrap();
        assert_eq!(samples.len(), 4800);
        assert!(samples.iter().all(|s| s.abs() <= 0.1));
        assert!(samples.iter().any(|s| *s != 0.0));

        let click = Cue::Click.sounds(&mut rng);
        assert!(click[0].samples(48_000.0, &mut rng).is_none());
    }
}
