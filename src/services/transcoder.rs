/// FFmpeg-based HLS transcoding
///
/// One encoder invocation produces every rendition of the ladder as a
/// segmented HLS stream plus a master playlist, so the source is decoded
/// once. The command is always built as a discrete argument vector and never
/// passed through a shell.
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::TranscodingConfig;
use crate::error::{AppError, Result};

/// Fixed GOP length; with scene-cut detection disabled this pins keyframes
/// to predictable intervals so segment boundaries stay aligned.
const GOP_FRAMES: u32 = 48;

/// One fixed-quality output stream of the adaptive ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub height: u32,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
}

impl Rendition {
    /// Stream name used in playlists and segment files, e.g. "360p".
    pub fn name(&self) -> String {
        format!("{}p", self.height)
    }

    /// Default ladder: 360p and 720p. The ladder is static configuration;
    /// the source is never probed.
    pub fn default_ladder() -> Vec<Rendition> {
        vec![
            Rendition {
                height: 360,
                video_bitrate_kbps: 800,
                audio_bitrate_kbps: 96,
            },
            Rendition {
                height: 720,
                video_bitrate_kbps: 2500,
                audio_bitrate_kbps: 128,
            },
        ]
    }

    /// Parse a ladder from `height:video_kbps:audio_kbps` triples separated
    /// by commas, e.g. `360:800:96,720:2500:128`.
    pub fn parse_ladder(raw: &str) -> Result<Vec<Rendition>> {
        let mut ladder = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let fields: Vec<&str> = part.split(':').collect();
            if fields.len() != 3 {
                return Err(AppError::Validation(format!(
                    "Invalid rendition '{}', expected height:video_kbps:audio_kbps",
                    part
                )));
            }
            let parse = |s: &str| {
                s.parse::<u32>().map_err(|_| {
                    AppError::Validation(format!("Invalid rendition number '{}' in '{}'", s, part))
                })
            };
            ladder.push(Rendition {
                height: parse(fields[0])?,
                video_bitrate_kbps: parse(fields[1])?,
                audio_bitrate_kbps: parse(fields[2])?,
            });
        }
        if ladder.is_empty() {
            return Err(AppError::Validation(
                "Rendition ladder must not be empty".to_string(),
            ));
        }
        Ok(ladder)
    }
}

/// External encoder seam: the transcode job drives whatever implements this,
/// tests substitute scripted fakes.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Encode `input` into segmented HLS renditions under `output_dir`,
    /// producing `master.m3u8`, one sub-manifest per rendition and the
    /// segment files they reference.
    async fn encode(&self, input: &Path, output_dir: &Path, renditions: &[Rendition])
        -> Result<()>;
}

/// Production encoder shelling out to ffmpeg.
pub struct FfmpegEncoder {
    ffmpeg_path: String,
    segment_seconds: u32,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(config: &TranscodingConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            segment_seconds: config.segment_seconds,
            timeout: Duration::from_secs(config.job_timeout_seconds),
        }
    }
}

/// Build the ffmpeg argument vector for a single multi-rendition invocation.
///
/// Every rendition gets its own mapped video/audio pair with a scale filter
/// and bitrate targets; `-var_stream_map` ties them to named variant
/// playlists under one master manifest.
pub fn build_ffmpeg_args(
    input: &Path,
    output_dir: &Path,
    renditions: &[Rendition],
    segment_seconds: u32,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-preset".into(),
        "fast".into(),
        "-g".into(),
        GOP_FRAMES.to_string(),
        "-keyint_min".into(),
        GOP_FRAMES.to_string(),
        "-sc_threshold".into(),
        "0".into(),
    ];

    for _ in renditions {
        args.extend(["-map".into(), "0:v:0".into(), "-map".into(), "0:a:0".into()]);
    }

    args.extend([
        "-c:v".into(),
        "libx264".into(),
        "-c:a".into(),
        "aac".into(),
        "-ar".into(),
        "48000".into(),
    ]);

    for (i, rendition) in renditions.iter().enumerate() {
        args.extend([
            format!("-filter:v:{}", i),
            format!("scale=-2:{}", rendition.height),
            format!("-b:v:{}", i),
            format!("{}k", rendition.video_bitrate_kbps),
            format!("-b:a:{}", i),
            format!("{}k", rendition.audio_bitrate_kbps),
        ]);
    }

    let var_stream_map = renditions
        .iter()
        .enumerate()
        .map(|(i, r)| format!("v:{},a:{},name:{}", i, i, r.name()))
        .collect::<Vec<_>>()
        .join(" ");

    args.extend([
        "-f".into(),
        "hls".into(),
        "-hls_time".into(),
        segment_seconds.to_string(),
        "-hls_playlist_type".into(),
        "vod".into(),
        "-hls_segment_filename".into(),
        output_dir.join("%v_%03d.ts").to_string_lossy().into_owned(),
        "-master_pl_name".into(),
        "master.m3u8".into(),
        "-var_stream_map".into(),
        var_stream_map,
        output_dir
            .join("stream_%v.m3u8")
            .to_string_lossy()
            .into_owned(),
    ]);

    args
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(
        &self,
        input: &Path,
        output_dir: &Path,
        renditions: &[Rendition],
    ) -> Result<()> {
        let args = build_ffmpeg_args(input, output_dir, renditions, self.segment_seconds);

        tracing::debug!("Invoking {} with {} args", self.ffmpeg_path, args.len());

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.ffmpeg_path)
                .args(&args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            AppError::Encoding(format!(
                "ffmpeg timed out after {}s",
                self.timeout.as_secs()
            ))
        })?
        .map_err(|e| AppError::Encoding(format!("Failed to spawn ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Encoding(format!(
                "ffmpeg exited with {}: {}",
                output.status, stderr
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_ladder_is_deterministic() {
        let a = Rendition::default_ladder();
        let b = Rendition::default_ladder();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].height, 360);
        assert_eq!(a[0].video_bitrate_kbps, 800);
        assert_eq!(a[0].audio_bitrate_kbps, 96);
        assert_eq!(a[1].height, 720);
        assert_eq!(a[1].video_bitrate_kbps, 2500);
        assert_eq!(a[1].audio_bitrate_kbps, 128);
    }

    #[test]
    fn parse_ladder_accepts_triples() {
        let ladder = Rendition::parse_ladder("360:800:96, 1080:5000:192").unwrap();
        assert_eq!(ladder.len(), 2);
        assert_eq!(ladder[1].height, 1080);
        assert_eq!(ladder[1].name(), "1080p");
    }

    #[test]
    fn parse_ladder_rejects_malformed_specs() {
        assert!(Rendition::parse_ladder("360:800").is_err());
        assert!(Rendition::parse_ladder("abc:800:96").is_err());
        assert!(Rendition::parse_ladder("").is_err());
    }

    #[test]
    fn ffmpeg_args_use_one_invocation_for_all_renditions() {
        let args = build_ffmpeg_args(
            &PathBuf::from("/tmp/in.mp4"),
            &PathBuf::from("/tmp/out"),
            &Rendition::default_ladder(),
            10,
        );

        // Exactly one input.
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 1);
        // One mapped v/a pair per rendition.
        assert_eq!(args.iter().filter(|a| *a == "-map").count(), 4);
        // Per-rendition scaling and bitrates.
        assert!(args.contains(&"scale=-2:360".to_string()));
        assert!(args.contains(&"scale=-2:720".to_string()));
        assert!(args.contains(&"800k".to_string()));
        assert!(args.contains(&"2500k".to_string()));
        // Master playlist plus named variant streams.
        assert!(args.contains(&"master.m3u8".to_string()));
        assert!(args.contains(&"v:0,a:0,name:360p v:1,a:1,name:720p".to_string()));
        // Segment duration from configuration.
        let hls_time = args.iter().position(|a| a == "-hls_time").unwrap();
        assert_eq!(args[hls_time + 1], "10");
    }

    #[test]
    fn ffmpeg_args_are_discrete_strings() {
        // A title with shell metacharacters must stay a single argument.
        let args = build_ffmpeg_args(
            &PathBuf::from("/tmp/a; rm -rf $HOME.mp4"),
            &PathBuf::from("/tmp/out"),
            &Rendition::default_ladder(),
            10,
        );
        assert!(args.contains(&"/tmp/a; rm -rf $HOME.mp4".to_string()));
    }
}
