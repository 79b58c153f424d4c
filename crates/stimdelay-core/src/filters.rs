//! Time-domain IIR filtering for the analogue channel
//!
//! Second-order Butterworth sections (direct form I). Filtering runs forward
//! and then backward over the buffer so the net phase delay is zero and onset
//! timing is preserved.

use std::f64::consts::{PI, SQRT_2};

/// Second-order IIR section, direct form I
#[derive(Debug, Clone)]
pub struct Biquad {
    b: [f64; 3],
    a: [f64; 3],
    x: [f64; 2],
    y: [f64; 2],
}

impl Biquad {
    fn from_coefficients(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b,
            a,
            x: [0.0, 0.0],
            y: [0.0, 0.0],
        }
    }

    /// Butterworth low-pass section with cutoff `f0` at sample rate `fs`
    ///
    /// Q is fixed at sqrt(2)/2 for a maximally flat passband.
    pub fn low_pass(f0: f64, fs: f64) -> Self {
        let omega = 2.0 * PI * f0 / fs;
        let alpha = omega.sin() / SQRT_2;
        let cos = omega.cos();

        Self::from_coefficients(
            [(1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0],
            [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
        )
    }

    /// Butterworth high-pass section with cutoff `f0` at sample rate `fs`
    pub fn high_pass(f0: f64, fs: f64) -> Self {
        let omega = 2.0 * PI * f0 / fs;
        let alpha = omega.sin() / SQRT_2;
        let cos = omega.cos();

        Self::from_coefficients(
            [(1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0],
            [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
        )
    }

    /// Filter one input sample and update the internal state
    pub fn process(&mut self, input: f64) -> f64 {
        let output = (self.b[0] / self.a[0]) * input
            + (self.b[1] / self.a[0]) * self.x[0]
            + (self.b[2] / self.a[0]) * self.x[1]
            - (self.a[1] / self.a[0]) * self.y[0]
            - (self.a[2] / self.a[0]) * self.y[1];

        self.x[1] = self.x[0];
        self.x[0] = input;
        self.y[1] = self.y[0];
        self.y[0] = output;

        output
    }
}

/// Apply a filter section forward and backward over `samples` in place
///
/// `make` constructs a fresh section for each pass so no state leaks between
/// the two directions. The double pass squares the magnitude response and
/// cancels the phase response.
pub fn zero_phase<F>(make: F, samples: &mut [f64])
where
    F: Fn() -> Biquad,
{
    let mut forward = make();
    for s in samples.iter_mut() {
        *s = forward.process(*s);
    }
    let mut backward = make();
    for s in samples.iter_mut().rev() {
        *s = backward.process(*s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    fn rms(samples: &[f64]) -> f64 {
        (samples.iter().map(|v| v * v).sum::<f64>() / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_low_pass_attenuates_high_frequency() {
        let fs = 1000.0;
        let mut passband = sine(5.0, fs, 4000);
        let mut stopband = sine(200.0, fs, 4000);

        zero_phase(|| Biquad::low_pass(20.0, fs), &mut passband);
        zero_phase(|| Biquad::low_pass(20.0, fs), &mut stopband);

        // Compare away from the edges to avoid transient effects
        let pass_rms = rms(&passband[500..3500]);
        let stop_rms = rms(&stopband[500..3500]);
        assert!(
            pass_rms > 10.0 * stop_rms,
            "Expected strong stopband attenuation, pass={pass_rms} stop={stop_rms}"
        );
    }

    #[test]
    fn test_high_pass_attenuates_low_frequency() {
        let fs = 1000.0;
        let mut passband = sine(200.0, fs, 4000);
        let mut stopband = sine(2.0, fs, 4000);

        zero_phase(|| Biquad::high_pass(50.0, fs), &mut passband);
        zero_phase(|| Biquad::high_pass(50.0, fs), &mut stopband);

        let pass_rms = rms(&passband[500..3500]);
        let stop_rms = rms(&stopband[500..3500]);
        assert!(
            pass_rms > 10.0 * stop_rms,
            "Expected strong stopband attenuation, pass={pass_rms} stop={stop_rms}"
        );
    }

    #[test]
    fn test_zero_phase_preserves_peak_position() {
        let fs = 1000.0;
        // Narrow symmetric bump centred at sample 500
        let mut samples: Vec<f64> = (0..1000)
            .map(|i| {
                let d = (i as f64 - 500.0) / 20.0;
                (-d * d).exp()
            })
            .collect();

        zero_phase(|| Biquad::low_pass(100.0, fs), &mut samples);

        let peak = samples
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            (peak as i64 - 500).abs() <= 1,
            "Zero-phase filtering should not move the peak, got {peak}"
        );
    }
}
