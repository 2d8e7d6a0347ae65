use std::path::{Path, PathBuf};

/// How output paths are derived when a transcode writes several frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameNaming {
    /// Single-frame images write the requested path; multi-frame images
    /// write `<stem>_<index>.<ext>` next to it.
    #[default]
    Suffixed,
    /// Every frame is written to the requested path in turn, so only the
    /// last one survives.
    Overwrite,
}

impl FrameNaming {
    pub fn path_for(self, base: &Path, frame: u32, frame_count: u32) -> PathBuf {
        if self == FrameNaming::Overwrite || frame_count <= 1 {
            return base.to_path_buf();
        }
        let stem = base
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match base.extension() {
            Some(ext) => format!("{}_{}.{}", stem, frame, ext.to_string_lossy()),
            None => format!("{}_{}", stem, frame),
        };
        base.with_file_name(name)
    }
}

/// Encoding of raw decoded bytes written by the command line front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawOutput {
    #[default]
    Raw,
    /// `0xAABBCCDD` groups, ten per line.
    Hex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub frame_naming: FrameNaming,
    pub raw_output: RawOutput,
    /// Refuse to allocate frame buffers larger than this.
    pub max_frame_bytes: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_naming: FrameNaming::default(),
            raw_output: RawOutput::default(),
            max_frame_bytes: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_frame_naming(mut self, frame_naming: FrameNaming) -> Self {
        self.frame_naming = frame_naming;
        self
    }

    pub fn with_raw_output(mut self, raw_output: RawOutput) -> Self {
        self.raw_output = raw_output;
        self
    }

    pub fn with_max_frame_bytes(mut self, limit: u64) -> Self {
        self.max_frame_bytes = Some(limit);
        self
    }
}
