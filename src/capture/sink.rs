use crate::audio::graph::MixedAudio;
use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::FrameRGBA;

/// Container/codec pairs the capture pipeline can produce, in preference order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFormat {
    /// WebM with VP9 video and Opus audio.
    WebmVp9Opus,
    /// WebM with VP8 video and Vorbis audio.
    WebmVp8Vorbis,
    /// MP4 with H.264 video and AAC audio.
    Mp4H264Aac,
}

impl ContainerFormat {
    /// Every format, most preferred first.
    pub const PREFERENCE: [Self; 3] = [Self::WebmVp9Opus, Self::WebmVp8Vorbis, Self::Mp4H264Aac];

    /// File extension of the container.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebmVp9Opus | Self::WebmVp8Vorbis => "webm",
            Self::Mp4H264Aac => "mp4",
        }
    }

    /// MIME type of the container.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::WebmVp9Opus => "video/webm;codecs=vp9,opus",
            Self::WebmVp8Vorbis => "video/webm;codecs=vp8,vorbis",
            Self::Mp4H264Aac => "video/mp4",
        }
    }
}

/// Stream parameters announced to a sink before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate of pushed frames.
    pub fps: Fps,
    /// Whether an audio track will be supplied on stop.
    pub has_audio: bool,
}

/// Consumer of rendered frames and the mixed audio track.
///
/// Lifecycle: `start` once, `push_frame` in increasing index order, `stop` once, then
/// `take_chunks` to collect the encoded container.
pub trait CaptureSink {
    /// Container the sink produces.
    fn format(&self) -> ContainerFormat;
    /// Prepare for a stream with the given parameters.
    fn start(&mut self, config: &CaptureConfig) -> ReelResult<()>;
    /// Encode one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()>;
    /// Finish the stream, muxing `audio` when present.
    fn stop(&mut self, audio: Option<MixedAudio>) -> ReelResult<()>;
    /// Drain encoded output collected so far.
    fn take_chunks(&mut self) -> Vec<Vec<u8>>;
}

/// Sink that keeps everything in memory.
///
/// Each pushed frame becomes one chunk of raw bytes; `silent()` produces nothing at all.
#[derive(Debug)]
pub struct InMemoryCaptureSink {
    format: ContainerFormat,
    emit_bytes: bool,
    config: Option<CaptureConfig>,
    frames: Vec<FrameIndex>,
    last_frame: Option<FrameRGBA>,
    audio: Option<MixedAudio>,
    stopped: bool,
    chunks: Vec<Vec<u8>>,
}

impl InMemoryCaptureSink {
    /// Create a sink reporting `format`.
    pub fn new(format: ContainerFormat) -> Self {
        Self {
            format,
            emit_bytes: true,
            config: None,
            frames: Vec::new(),
            last_frame: None,
            audio: None,
            stopped: false,
            chunks: Vec::new(),
        }
    }

    /// A sink that accepts frames but never emits a byte.
    pub fn silent(format: ContainerFormat) -> Self {
        Self {
            emit_bytes: false,
            ..Self::new(format)
        }
    }

    /// Parameters passed to `start`.
    pub fn config(&self) -> Option<&CaptureConfig> {
        self.config.as_ref()
    }

    /// Indices of every pushed frame.
    pub fn frames(&self) -> &[FrameIndex] {
        &self.frames
    }

    /// Most recently pushed frame.
    pub fn last_frame(&self) -> Option<&FrameRGBA> {
        self.last_frame.as_ref()
    }

    /// Audio handed over on stop.
    pub fn audio(&self) -> Option<&MixedAudio> {
        self.audio.as_ref()
    }

    /// Return `true` once `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl CaptureSink for InMemoryCaptureSink {
    fn format(&self) -> ContainerFormat {
        self.format
    }

    fn start(&mut self, config: &CaptureConfig) -> ReelResult<()> {
        if self.config.is_some() {
            return Err(ReelError::evaluation("capture sink already started"));
        }
        self.config = Some(*config);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let Some(cfg) = self.config else {
            return Err(ReelError::evaluation("capture sink was not started"));
        };
        if self.stopped {
            return Err(ReelError::evaluation("capture sink already stopped"));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::evaluation(format!(
                "frame size mismatch: expected {}x{}, got {}x{}",
                cfg.width, cfg.height, frame.width, frame.height
            )));
        }
        if let Some(prev) = self.frames.last()
            && idx <= *prev
        {
            return Err(ReelError::evaluation("frame indices must increase"));
        }
        self.frames.push(idx);
        if self.emit_bytes {
            self.chunks.push(frame.data.clone());
        }
        self.last_frame = Some(frame.clone());
        Ok(())
    }

    fn stop(&mut self, audio: Option<MixedAudio>) -> ReelResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        if self.emit_bytes
            && let Some(a) = &audio
        {
            let mut bytes = Vec::with_capacity(a.interleaved_f32.len() * 4);
            for s in &a.interleaved_f32 {
                bytes.extend_from_slice(&s.to_le_bytes());
            }
            self.chunks.push(bytes);
        }
        self.audio = audio;
        Ok(())
    }

    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.chunks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/sink.rs"]
mod tests;
