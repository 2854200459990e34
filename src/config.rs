use serde::Deserialize;
use std::path::{Path, PathBuf};

use staticscope::ScopeMode;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct SurfaceConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

/// Axis margins in pixels.
#[derive(Debug, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_left")]
    pub left: f64,
    #[serde(default = "default_bottom")]
    pub bottom: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextConfig {
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default)]
    pub bold_font: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ScopeConfig {
    #[serde(default)]
    pub mode: ScopeMode,
    #[serde(default = "default_spectrogram")]
    pub spectrogram: bool,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            left: default_left(),
            bottom: default_bottom(),
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            mode: ScopeMode::default(),
            spectrogram: default_spectrogram(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
        }
    }
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 400 }
fn default_left() -> f64 { 50.0 }
fn default_bottom() -> f64 { 20.0 }
fn default_spectrogram() -> bool { true }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_pix_fmt() -> String { "yuv420p".into() }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// `./staticscope.toml`, then the XDG-style path under the home directory,
/// then the platform config directory.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("staticscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("staticscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("staticscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!((config.surface.width, config.surface.height), (800, 400));
        assert_eq!((config.layout.left, config.layout.bottom), (50.0, 20.0));
        assert_eq!(config.scope.mode, ScopeMode::Oscilloscope);
        assert!(config.scope.spectrogram);
        assert!(config.text.font.is_none());
        assert_eq!(config.output.pix_fmt, "yuv420p");
    }

    #[test]
    fn sections_override_defaults() {
        let config: Config = toml::from_str(
            r#"
            [surface]
            width = 1280

            [scope]
            mode = "spectrogram"
            spectrogram = false

            [text]
            font = "/usr/share/fonts/mono.ttf"

            [output]
            codec = "libx265"
            "#,
        )
        .unwrap();
        assert_eq!(config.surface.width, 1280);
        assert_eq!(config.surface.height, 400);
        assert_eq!(config.scope.mode, ScopeMode::Spectrogram);
        assert!(!config.scope.spectrogram);
        assert_eq!(config.text.font.as_deref(), Some(Path::new("/usr/share/fonts/mono.ttf")));
        assert_eq!(config.output.codec, "libx265");
    }

    #[test]
    fn unreadable_config_is_none() {
        assert!(load_config(Path::new("/nonexistent/staticscope.toml")).is_none());
        let path = std::env::temp_dir().join("staticscope-bad-config.toml");
        std::fs::write(&path, "[surface]\nwidth = \"wide\"\n").unwrap();
        let loaded = load_config(&path);
        let _ = std::fs::remove_file(&path);
        assert!(loaded.is_none());
    }
}
