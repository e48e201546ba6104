use std::collections::BTreeSet;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::audio::graph::MixedAudio;
use crate::audio::offline::write_mix_to_f32le_file;
use crate::capture::sink::{CaptureConfig, CaptureSink, ContainerFormat};
use crate::effects::composite::flatten_premul_over_bg;
use crate::foundation::config::ffmpeg_program;
use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::FrameRGBA;

/// Size of each chunk read from the muxer's stdout.
const CHUNK_BYTES: usize = 64 * 1024;

type StderrDrain = std::thread::JoinHandle<std::io::Result<Vec<u8>>>;

/// Return `true` when `ffmpeg` can be invoked.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new(ffmpeg_program())
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Raw `ffmpeg -encoders` listing of the host.
pub fn probe_encoders() -> ReelResult<String> {
    let output = Command::new(ffmpeg_program())
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| ReelError::encoder_unavailable(format!("failed to run ffmpeg: {e}")))?;
    if !output.status.success() {
        return Err(ReelError::encoder_unavailable(format!(
            "ffmpeg -encoders exited with status {}",
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Encoder names listed in `ffmpeg -encoders` output.
fn encoder_names(encoders_text: &str) -> BTreeSet<&str> {
    encoders_text
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            let is_flags = flags.len() == 6
                && flags.chars().next().is_some_and(|c| matches!(c, 'V' | 'A' | 'S'))
                && flags.chars().all(|c| c == '.' || c.is_ascii_uppercase());
            is_flags.then_some(name)
        })
        .collect()
}

/// Pick the most preferred container whose video and audio encoders are both available.
pub fn negotiate_container(encoders_text: &str) -> ReelResult<ContainerFormat> {
    let names = encoder_names(encoders_text);
    ContainerFormat::PREFERENCE
        .into_iter()
        .find(|f| {
            let (video, audio) = encoders_for(*f);
            names.contains(video) && names.contains(audio)
        })
        .ok_or_else(|| {
            ReelError::encoder_unavailable(
                "none of webm (vp9+opus), webm (vp8+vorbis) or mp4 (h264+aac) can be encoded",
            )
        })
}

/// Negotiate against the host's ffmpeg.
pub fn negotiate_host_container() -> ReelResult<ContainerFormat> {
    if !is_ffmpeg_on_path() {
        return Err(ReelError::encoder_unavailable(format!(
            "ffmpeg was not found (set {} or add it to PATH)",
            crate::foundation::config::FFMPEG_ENV
        )));
    }
    let format = negotiate_container(&probe_encoders()?)?;
    tracing::info!(?format, "capture container negotiated");
    Ok(format)
}

fn encoders_for(format: ContainerFormat) -> (&'static str, &'static str) {
    match format {
        ContainerFormat::WebmVp9Opus => ("libvpx-vp9", "libopus"),
        ContainerFormat::WebmVp8Vorbis => ("libvpx", "libvorbis"),
        ContainerFormat::Mp4H264Aac => ("libx264", "aac"),
    }
}

fn video_args(format: ContainerFormat) -> &'static [&'static str] {
    match format {
        ContainerFormat::WebmVp9Opus => &[
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            "0",
            "-crf",
            "32",
            "-row-mt",
            "1",
        ],
        ContainerFormat::WebmVp8Vorbis => {
            &["-c:v", "libvpx", "-pix_fmt", "yuv420p", "-b:v", "4M"]
        }
        ContainerFormat::Mp4H264Aac => &["-c:v", "libx264", "-pix_fmt", "yuv420p"],
    }
}

fn muxer_args(format: ContainerFormat) -> &'static [&'static str] {
    match format {
        ContainerFormat::WebmVp9Opus | ContainerFormat::WebmVp8Vorbis => &["-f", "webm"],
        // A pipe is not seekable, so the moov atom must come first.
        ContainerFormat::Mp4H264Aac => &["-f", "mp4", "-movflags", "frag_keyframe+empty_moov"],
    }
}

/// Removes the wrapped file on drop.
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn temp_path(stem: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "storyreel_{stem}_{}_{}.{ext}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

fn spawn_stderr_drain(child: &mut Child) -> ReelResult<StderrDrain> {
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ReelError::evaluation("failed to open ffmpeg stderr (unexpected)"))?;
    Ok(std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok(stderr_bytes)
    }))
}

fn wait_ffmpeg(mut child: Child, drain: Option<StderrDrain>, what: &str) -> ReelResult<()> {
    let status = child.wait().map_err(|e| {
        ReelError::evaluation(format!("failed to wait for ffmpeg {what}: {e}"))
    })?;
    let stderr_bytes = match drain {
        Some(handle) => handle
            .join()
            .map_err(|_| ReelError::evaluation("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| ReelError::evaluation(format!("ffmpeg stderr read failed: {e}")))?,
        None => Vec::new(),
    };
    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_bytes);
        return Err(ReelError::evaluation(format!(
            "ffmpeg {what} exited with status {status}: {}",
            stderr.trim()
        )));
    }
    Ok(())
}

/// Capture sink that encodes with the system `ffmpeg`.
///
/// Frames are streamed to a video-only intermediate file as they arrive. On `stop` the mixed
/// audio (if any) is muxed in and the finished container is read back from ffmpeg's stdout in
/// chunks.
pub struct FfmpegCaptureSink {
    format: ContainerFormat,
    bg_rgba: [u8; 4],

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<StderrDrain>,
    video_tmp: TempFileGuard,

    scratch: Vec<u8>,
    cfg: Option<CaptureConfig>,
    last_idx: Option<FrameIndex>,
    chunks: Vec<Vec<u8>>,
}

impl FfmpegCaptureSink {
    /// Create a sink producing `format`.
    pub fn new(format: ContainerFormat) -> Self {
        Self {
            format,
            bg_rgba: [0, 0, 0, 255],
            child: None,
            stdin: None,
            stderr_drain: None,
            video_tmp: TempFileGuard(None),
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
            chunks: Vec::new(),
        }
    }

    /// Create a sink for the best container the host supports.
    pub fn negotiate() -> ReelResult<Self> {
        Ok(Self::new(negotiate_host_container()?))
    }

    fn mux(&mut self, video_path: &Path, audio: Option<&MixedAudio>) -> ReelResult<()> {
        let mut audio_tmp = TempFileGuard(None);
        let mut cmd = Command::new(ffmpeg_program());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args(["-loglevel", "error", "-i"]).arg(video_path);

        let audio = audio.filter(|a| !a.interleaved_f32.is_empty());
        if let Some(audio) = audio {
            let path = temp_path("audio_mix", "f32le");
            write_mix_to_f32le_file(&audio.interleaved_f32, &path)?;
            audio_tmp.0 = Some(path.clone());
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&path)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a"])
            .arg(encoders_for(self.format).1);
        } else {
            cmd.args(["-c:v", "copy", "-an"]);
        }
        cmd.args(muxer_args(self.format)).arg("pipe:1");

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::evaluation(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let drain = spawn_stderr_drain(&mut child)?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::evaluation("failed to open ffmpeg stdout (unexpected)"))?;

        let mut buf = vec![0u8; CHUNK_BYTES];
        loop {
            let n = stdout.read(&mut buf).map_err(|e| {
                ReelError::evaluation(format!("failed to read muxed output from ffmpeg: {e}"))
            })?;
            if n == 0 {
                break;
            }
            self.chunks.push(buf[..n].to_vec());
        }
        wait_ffmpeg(child, Some(drain), "mux")?;
        drop(audio_tmp);
        Ok(())
    }
}

impl CaptureSink for FfmpegCaptureSink {
    fn format(&self) -> ContainerFormat {
        self.format
    }

    #[tracing::instrument(level = "debug", skip_all, fields(format = ?self.format))]
    fn start(&mut self, cfg: &CaptureConfig) -> ReelResult<()> {
        if self.cfg.is_some() {
            return Err(ReelError::evaluation("ffmpeg capture sink already started"));
        }
        Fps::new(cfg.fps.num, cfg.fps.den)?;
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::validation(
                "capture width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "capture width/height must be even (required for yuv420p output)",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encoder_unavailable(
                "ffmpeg is required for capture, but was not found",
            ));
        }

        let video_path = temp_path("video", self.format.extension());
        ensure_parent_dir(&video_path)?;

        let mut cmd = Command::new(ffmpeg_program());
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // ffmpeg does not understand premultiplied input; frames are flattened in push_frame.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            "-an",
        ])
        .args(video_args(self.format))
        .arg(&video_path);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::evaluation(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::evaluation("failed to open ffmpeg stdin (unexpected)"))?;
        let drain = spawn_stderr_drain(&mut child)?;

        tracing::debug!(
            format = ?self.format,
            width = cfg.width,
            height = cfg.height,
            has_audio = cfg.has_audio,
            "ffmpeg capture started"
        );
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.video_tmp = TempFileGuard(Some(video_path));
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(drain);
        self.cfg = Some(*cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::evaluation("ffmpeg capture sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(ReelError::evaluation(
                "ffmpeg capture sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::evaluation("ffmpeg capture sink is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelError::evaluation(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn stop(&mut self, audio: Option<MixedAudio>) -> ReelResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Ok(());
        };
        wait_ffmpeg(child, self.stderr_drain.take(), "encode")?;
        self.cfg = None;

        let Some(video_path) = self.video_tmp.0.clone() else {
            return Err(ReelError::evaluation("intermediate video file missing"));
        };
        self.mux(&video_path, audio.as_ref())?;
        self.video_tmp = TempFileGuard(None);
        Ok(())
    }

    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.chunks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/ffmpeg.rs"]
mod tests;
