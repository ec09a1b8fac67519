use std::f32::consts::PI;

/// Rise and fall time of the keying envelope, in seconds
const RAMP_SECS: f32 = 0.005;

/// Sine tone generator with attack/decay envelope so keying does not click
pub struct SidetoneGenerator {
    phase: f32,
    phase_increment: f32,
    frequency: f32,
    volume: f32,
    envelope: f32,
    ramp_step: f32,
}

impl SidetoneGenerator {
    pub fn new(frequency: f32, volume: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_increment: 2.0 * PI * frequency / sample_rate,
            frequency,
            volume: volume.clamp(0.0, 1.0),
            envelope: 0.0,
            ramp_step: 1.0 / (RAMP_SECS * sample_rate),
        }
    }

    /// Generate the next audio sample
    pub fn next_sample(&mut self, key_down: bool) -> f32 {
        if key_down {
            self.envelope = (self.envelope + self.ramp_step).min(1.0);
        } else {
            self.envelope = (self.envelope - self.ramp_step).max(0.0);
        }

        let sample = self.phase.sin() * self.envelope * self.volume;

        self.phase += self.phase_increment;
        if self.phase >= 2.0 * PI {
            self.phase -= 2.0 * PI;
        }

        sample
    }

    /// Follow the output device's sample rate
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.phase_increment = 2.0 * PI * self.frequency / sample_rate;
        self.ramp_step = 1.0 / (RAMP_SECS * sample_rate);
    }
}
