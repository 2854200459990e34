use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Video settings handed to ffmpeg.
#[derive(Debug, Clone)]
pub struct EncodeSettings<'a> {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: &'a str,
    pub pix_fmt: &'a str,
    pub crf: u32,
    pub bitrate: Option<&'a str>,
}

pub(crate) fn ffmpeg_args(settings: &EncodeSettings<'_>) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgba".into(),
        "-video_size".into(), format!("{}x{}", settings.width, settings.height),
        "-framerate".into(), settings.fps.to_string(),
        "-i".into(), "pipe:0".into(),
        "-c:v".into(), settings.codec.to_string(),
        "-pix_fmt".into(), settings.pix_fmt.to_string(),
    ];

    if let Some(br) = settings.bitrate {
        args.extend(["-b:v".to_string(), br.to_string()]);
    } else {
        args.extend(["-crf".to_string(), settings.crf.to_string()]);
        args.extend(["-preset".to_string(), "medium".to_string()]);
    }
    args
}

/// Pipes raw RGBA scope frames into an ffmpeg child process.
pub struct FfmpegEncoder {
    child: Child,
    frame_bytes: usize,
    frames: u64,
}

impl FfmpegEncoder {
    pub fn new(output_path: &Path, settings: &EncodeSettings<'_>) -> Result<Self> {
        let child = Command::new("ffmpeg")
            .args(ffmpeg_args(settings))
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            settings.width, settings.height, settings.fps, settings.codec
        );

        Ok(Self {
            child,
            frame_bytes: settings.width as usize * settings.height as usize * 4,
            frames: 0,
        })
    }

    pub fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        if rgba_pixels.len() != self.frame_bytes {
            anyhow::bail!(
                "Frame has {} bytes, encoder expects {}",
                rgba_pixels.len(),
                self.frame_bytes
            );
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(rgba_pixels).context("Failed to write frame to ffmpeg")?;
        self.frames += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete ({} frames)", self.frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(bitrate: Option<&str>) -> EncodeSettings<'_> {
        EncodeSettings {
            width: 800,
            height: 400,
            fps: 30,
            codec: "libx264",
            pix_fmt: "yuv420p",
            crf: 18,
            bitrate,
        }
    }

    #[test]
    fn crf_mode_uses_preset() {
        let args = ffmpeg_args(&settings(None));
        let joined = args.join(" ");
        assert!(joined.contains("-video_size 800x400"));
        assert!(joined.contains("-crf 18 -preset medium"));
        assert!(!joined.contains("-b:v"));
    }

    #[test]
    fn bitrate_replaces_crf() {
        let args = ffmpeg_args(&settings(Some("5M")));
        let joined = args.join(" ");
        assert!(joined.contains("-b:v 5M"));
        assert!(!joined.contains("-crf"));
    }
}
