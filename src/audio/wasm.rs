use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::JsValue;
use web_sys::{AudioContext, OscillatorType};

use super::{AudioSink, Cue, Sound, Waveform};

/// WebAudio backed sink.
///
/// The context is created on the first [`AudioSink::resume`] because browsers
/// refuse to start audio outside a user gesture.
pub struct WebAudioSink {
    context: Option<AudioContext>,
    disabled: bool,
    rng: StdRng,
}

impl Default for WebAudioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudioSink {
    pub fn new() -> Self {
        Self {
            context: None,
            disabled: false,
            rng: StdRng::from_entropy(),
        }
    }

    fn schedule(
        context: &AudioContext,
        sound: &Sound,
        rng: &mut StdRng,
    ) -> Result<(), JsValue> {
        let start = context.current_time() + f64::from(sound.delay());
        match *sound {
            Sound::Tone {
                frequency,
                duration,
                waveform,
                volume,
                ..
            } => {
                let oscillator = context.create_oscillator()?;
                oscillator.set_type(match waveform {
                    Waveform::Sine => OscillatorType::Sine,
                    Waveform::Square => OscillatorType::Square,
                    Waveform::Triangle => OscillatorType::Triangle,
                });
                oscillator.frequency().set_value(frequency);
                let gain = context.create_gain()?;
                gain.gain().set_value_at_time(volume, start)?;
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.001, start + f64::from(duration))?;
                oscillator.connect_with_audio_node(&gain)?;
                gain.connect_with_audio_node(&context.destination())?;
                oscillator.start_with_when(start)?;
                oscillator.stop_with_when(start + f64::from(duration))?;
            }
            Sound::Noise { .. } => {
                let sample_rate = context.sample_rate();
                let mut samples = sound.samples(sample_rate, rng).unwrap_or_default();
                if samples.is_empty() {
                    return Ok(());
                }
                let buffer = context.create_buffer(1, samples.len() as u32, sample_rate)?;
                buffer.copy_to_channel(&mut samples[..], 0)?;
                let source = context.create_buffer_source()?;
                source.set_buffer(Some(&buffer));
                source.connect_with_audio_node(&context.destination())?;
                source.start_with_when(start)?;
            }
        }
        Ok(())
    }
}

impl AudioSink for WebAudioSink {
    fn resume(&mut self) {
        if self.context.is_some() || self.disabled {
            return;
        }
        match AudioContext::new() {
            Ok(context) => self.context = Some(context),
            Err(err) => {
                warn!("audio unavailable: {err:?}");
                self.disabled = true;
            }
        }
    }

    fn play(&mut self, cue: Cue, sounds: &[Sound]) {
        self.resume();
        let Some(context) = self.context.as_ref() else {
            return;
        };
        for sound in sounds {
            if let Err(err) = Self::schedule(context, sound, &mut self.rng) {
                warn!("failed to play {cue:?}: {err:?}");
            }
        }
    }
}
