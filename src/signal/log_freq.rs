use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// Horizontal axis scaling for frequency-domain views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AxisScale {
    #[default]
    Linear,
    Log2,
    Log10,
}

impl AxisScale {
    /// 0 for linear, otherwise the logarithm base.
    pub fn base(self) -> u32 {
        match self {
            AxisScale::Linear => 0,
            AxisScale::Log2 => 2,
            AxisScale::Log10 => 10,
        }
    }

    pub fn is_log(self) -> bool {
        self != AxisScale::Linear
    }

    fn log(self, value: f64) -> f64 {
        match self {
            AxisScale::Linear => value,
            AxisScale::Log2 => value.log2(),
            AxisScale::Log10 => value.log10(),
        }
    }

    /// Decade/octave structure below Nyquist. `None` on a linear axis or an
    /// unusable sample rate.
    pub fn power_steps(self, sample_rate: f64) -> Option<PowerSteps> {
        if !self.is_log() || !sample_rate.is_finite() || sample_rate <= 0.0 {
            return None;
        }
        let base = self.base() as f64;
        let nyquist = sample_rate / 2.0;

        let mut powers = 0i32;
        while base.powi(powers) < nyquist {
            powers += 1;
        }
        // The loop stops one power past the last one below Nyquist.
        let powers = (powers - 1).max(0);

        let last_power = base.powi(powers);
        let mut suffix_steps = 1u32;
        while last_power + last_power * (suffix_steps as f64) < nyquist {
            suffix_steps += 1;
        }

        let inter_power_factor = 1.0 / (powers as f64 + self.log(suffix_steps as f64 + 2.0));
        Some(PowerSteps {
            powers: powers as u32,
            suffix_steps,
            inter_power_factor,
        })
    }
}

impl TryFrom<u32> for AxisScale {
    type Error = ScopeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AxisScale::Linear),
            2 => Ok(AxisScale::Log2),
            10 => Ok(AxisScale::Log10),
            other => Err(ScopeError::InvalidLogBase(other)),
        }
    }
}

impl From<AxisScale> for u32 {
    fn from(value: AxisScale) -> Self {
        value.base()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerSteps {
    /// Highest whole power of the base strictly below Nyquist.
    pub powers: u32,
    /// Linear steps of the last power needed to pass Nyquist.
    pub suffix_steps: u32,
    /// Fraction of the plot width occupied by one power.
    pub inter_power_factor: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogGridLine {
    pub x: f64,
    pub freq: f64,
    /// Power-of-base lines carry a label, intermediate lines do not.
    pub labeled: bool,
}

/// Frequency <-> pixel mapping for a log axis spanning `plot_width` pixels
/// to the right of `left`.
#[derive(Clone, Copy, Debug)]
pub struct LogAxis {
    scale: AxisScale,
    steps: PowerSteps,
    pixels_per_power: f64,
    left: f64,
}

impl LogAxis {
    pub fn new(scale: AxisScale, sample_rate: f64, plot_width: f64, left: f64) -> Option<Self> {
        let steps = scale.power_steps(sample_rate)?;
        Some(Self {
            scale,
            steps,
            pixels_per_power: plot_width * steps.inter_power_factor,
            left,
        })
    }

    pub fn steps(&self) -> PowerSteps {
        self.steps
    }

    pub fn pixels_per_power(&self) -> f64 {
        self.pixels_per_power
    }

    pub fn freq_to_x(&self, freq: f64) -> f64 {
        self.scale.log(freq) * self.pixels_per_power + self.left
    }

    pub fn x_to_freq(&self, x: f64) -> f64 {
        (self.scale.base() as f64).powf((x - self.left) / self.pixels_per_power)
    }

    /// One labeled line per power plus intermediate multiples of that power;
    /// after the last power the multiples run up to `suffix_steps + 2`.
    pub fn gridlines(&self) -> Vec<LogGridLine> {
        let base = self.scale.base() as f64;
        let end_suffix = (self.steps.suffix_steps + 2) as f64;
        let mut lines = Vec::new();
        for c in 0..=self.steps.powers {
            let tag = base.powi(c as i32);
            lines.push(LogGridLine {
                x: self.freq_to_x(tag),
                freq: tag,
                labeled: true,
            });
            let stop = if c == self.steps.powers {
                end_suffix * tag
            } else {
                base.powi(c as i32 + 1)
            };
            let mut freq = tag + tag;
            while freq < stop {
                lines.push(LogGridLine {
                    x: self.freq_to_x(freq),
                    freq,
                    labeled: false,
                });
                freq += tag;
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decade_steps_at_44100() {
        let steps = AxisScale::Log10.power_steps(44_100.0).unwrap();
        // 10^4 = 10000 < 22050 <= 10^5
        assert_eq!(steps.powers, 4);
        // 10000 + 2 * 10000 >= 22050
        assert_eq!(steps.suffix_steps, 2);
        let expected = 1.0 / (4.0 + 4f64.log10());
        assert!((steps.inter_power_factor - expected).abs() < 1e-12);
    }

    #[test]
    fn octave_steps_at_44100() {
        let steps = AxisScale::Log2.power_steps(44_100.0).unwrap();
        // 2^14 = 16384 < 22050 <= 32768
        assert_eq!(steps.powers, 14);
        assert_eq!(steps.suffix_steps, 1);
    }

    #[test]
    fn linear_and_degenerate_rates_have_no_steps() {
        assert!(AxisScale::Linear.power_steps(44_100.0).is_none());
        assert!(AxisScale::Log10.power_steps(0.0).is_none());
        assert!(AxisScale::Log10.power_steps(f64::INFINITY).is_none());
        let tiny = AxisScale::Log10.power_steps(1.0).unwrap();
        assert_eq!(tiny.powers, 0);
    }

    #[test]
    fn nyquist_equal_to_a_power_is_excluded() {
        // Nyquist = 1000 exactly: 10^3 is not below it.
        let steps = AxisScale::Log10.power_steps(2_000.0).unwrap();
        assert_eq!(steps.powers, 2);
    }

    #[test]
    fn pixel_round_trip() {
        for scale in [AxisScale::Log2, AxisScale::Log10] {
            let axis = LogAxis::new(scale, 44_100.0, 750.0, 50.0).unwrap();
            let mut f = 0.5;
            while f < 22_050.0 {
                let back = axis.x_to_freq(axis.freq_to_x(f));
                assert!((back - f).abs() <= f * 1e-9, "{:?}: {} -> {}", scale, f, back);
                f *= 1.37;
            }
        }
    }

    #[test]
    fn nyquist_fits_inside_plot() {
        let axis = LogAxis::new(AxisScale::Log10, 44_100.0, 750.0, 50.0).unwrap();
        let x = axis.freq_to_x(22_050.0);
        assert!(x > 50.0 && x <= 800.0, "x = {}", x);
    }

    #[test]
    fn gridlines_cover_each_decade() {
        let axis = LogAxis::new(AxisScale::Log10, 44_100.0, 750.0, 50.0).unwrap();
        let lines = axis.gridlines();
        let labeled: Vec<f64> = lines.iter().filter(|l| l.labeled).map(|l| l.freq).collect();
        assert_eq!(labeled, vec![1.0, 10.0, 100.0, 1000.0, 10000.0]);
        // last decade stops below (2 + 2) * 10000
        assert_eq!(lines.last().map(|l| l.freq), Some(30_000.0));
        assert!(lines.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn log_base_decoding() {
        assert_eq!(AxisScale::try_from(2).unwrap(), AxisScale::Log2);
        assert!(matches!(AxisScale::try_from(3), Err(ScopeError::InvalidLogBase(3))));
    }
}
