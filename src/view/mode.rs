use super::zoom::ZoomFamily;

/// What the scope shows. Cycled in declaration order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    Data,
    Interleaved,
    #[default]
    Oscilloscope,
    Spectroscope,
    Spectrogram,
}

impl ScopeMode {
    pub const ALL: [ScopeMode; 5] = [
        ScopeMode::Data,
        ScopeMode::Interleaved,
        ScopeMode::Oscilloscope,
        ScopeMode::Spectroscope,
        ScopeMode::Spectrogram,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScopeMode::Data => "Data",
            ScopeMode::Interleaved => "Interleaved",
            ScopeMode::Oscilloscope => "Oscilloscope",
            ScopeMode::Spectroscope => "Spectroscope",
            ScopeMode::Spectrogram => "Spectrogram",
        }
    }

    /// Data and both time views share the oscilloscope zoom record.
    pub fn zoom_family(self) -> ZoomFamily {
        match self {
            ScopeMode::Data | ScopeMode::Interleaved | ScopeMode::Oscilloscope => {
                ZoomFamily::Oscilloscope
            }
            ScopeMode::Spectroscope => ZoomFamily::Spectroscope,
            ScopeMode::Spectrogram => ZoomFamily::Spectrogram,
        }
    }

    pub fn in_freq_domain(self) -> bool {
        matches!(self, ScopeMode::Spectroscope | ScopeMode::Spectrogram)
    }

    /// Horizontal axis unit caption.
    pub fn unit(self) -> &'static str {
        match self {
            ScopeMode::Spectrogram => "Hz/frame",
            ScopeMode::Spectroscope => "dB/Hz(log10)",
            _ => "lvl/samp",
        }
    }

    pub fn next(self) -> ScopeMode {
        let i = ScopeMode::ALL.iter().position(|m| *m == self).unwrap_or(0);
        ScopeMode::ALL[(i + 1) % ScopeMode::ALL.len()]
    }
}

/// Inputs that decide which modes the switch button skips.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModeAvailability {
    pub spectrogram_enabled: bool,
    pub continuous: bool,
    pub single_channel: bool,
}

/// Next mode for the switch button: Spectrogram needs the compositor, Data is
/// skipped while streaming and Interleaved is pointless with one channel.
pub fn cycle(current: ScopeMode, avail: ModeAvailability) -> ScopeMode {
    let mut next = current.next();
    if next == ScopeMode::Spectrogram && !avail.spectrogram_enabled {
        next = next.next();
    }
    if next == ScopeMode::Data && avail.continuous {
        next = next.next();
    }
    if next == ScopeMode::Interleaved && avail.single_channel {
        next = next.next();
    }
    next
}

impl std::str::FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScopeMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown scope mode '{}'", s))
    }
}

impl std::fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("spectrogram".parse::<ScopeMode>(), Ok(ScopeMode::Spectrogram));
        assert_eq!("Data".parse::<ScopeMode>(), Ok(ScopeMode::Data));
        assert!("scope".parse::<ScopeMode>().is_err());
    }

    #[test]
    fn full_cycle_visits_every_mode() {
        let avail = ModeAvailability {
            spectrogram_enabled: true,
            ..Default::default()
        };
        let mut mode = ScopeMode::Data;
        let mut seen = vec![mode];
        for _ in 0..4 {
            mode = cycle(mode, avail);
            seen.push(mode);
        }
        assert_eq!(seen, ScopeMode::ALL.to_vec());
        assert_eq!(cycle(mode, avail), ScopeMode::Data);
    }

    #[test]
    fn skips_unavailable_modes() {
        let avail = ModeAvailability {
            spectrogram_enabled: false,
            continuous: true,
            single_channel: true,
        };
        // Spectroscope -> (Spectrogram) -> (Data) -> (Interleaved) -> Oscilloscope
        assert_eq!(cycle(ScopeMode::Spectroscope, avail), ScopeMode::Oscilloscope);
        assert_eq!(cycle(ScopeMode::Oscilloscope, avail), ScopeMode::Spectroscope);
    }

    #[test]
    fn families() {
        assert_eq!(ScopeMode::Data.zoom_family(), ZoomFamily::Oscilloscope);
        assert_eq!(ScopeMode::Interleaved.zoom_family(), ZoomFamily::Oscilloscope);
        assert_eq!(ScopeMode::Spectrogram.zoom_family(), ZoomFamily::Spectrogram);
        assert!(ScopeMode::Spectroscope.in_freq_domain());
        assert!(!ScopeMode::Oscilloscope.in_freq_domain());
    }
}
