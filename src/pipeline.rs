//! Decode and transcode orchestration.
//!
//! Raw extraction runs `Opened → FrameSelected → Read`; transcoding runs
//! `Opened → FrameSelected → ConverterBuilt → SinkInitialized → Written →
//! Closed` once per frame, in increasing frame order, each frame completed
//! before the next starts. Any failure aborts the current frame and is
//! returned as is.

use std::fmt;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use crate::codec::{CodecFactory, EncoderFactory};
use crate::config::PipelineConfig;
use crate::converter::TranscodeConverter;
use crate::decoder::ImageHandle;
use crate::encoder::{self, OutputSink};
use crate::error::{FormatError, Result};
use crate::source::ByteSource;
use crate::ImageMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Opened,
    FrameSelected,
    ConverterBuilt,
    SinkInitialized,
    Written,
    Closed,
    Read,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Opened => "opened",
            Stage::FrameSelected => "frame selected",
            Stage::ConverterBuilt => "converter built",
            Stage::SinkInitialized => "sink initialized",
            Stage::Written => "written",
            Stage::Closed => "closed",
            Stage::Read => "read",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage, frame: u32) {
    log::debug!("frame {}: {}", frame, stage);
}

/// One decoded frame with the metadata describing its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub frame: u32,
    pub metadata: ImageMetadata,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutput {
    pub frame: u32,
    pub path: PathBuf,
}

/// Entry point tying a codec backend, an encoder backend and the
/// configuration together.
pub struct Pipeline<'c> {
    codecs: &'c dyn CodecFactory,
    encoders: &'c dyn EncoderFactory,
    config: PipelineConfig,
}

impl<'c> Pipeline<'c> {
    pub fn new(codecs: &'c dyn CodecFactory, encoders: &'c dyn EncoderFactory) -> Self {
        Self::with_config(codecs, encoders, PipelineConfig::default())
    }

    pub fn with_config(
        codecs: &'c dyn CodecFactory,
        encoders: &'c dyn EncoderFactory,
        config: PipelineConfig,
    ) -> Self {
        Self {
            codecs,
            encoders,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn open<'a>(&self, source: ByteSource<'a>) -> Result<ImageHandle<'a>> {
        let handle = ImageHandle::open(self.codecs, source)?;
        enter(Stage::Opened, handle.current_frame());
        Ok(handle)
    }

    pub fn image_metadata(&self, source: ByteSource<'_>) -> Result<ImageMetadata> {
        self.open(source)?.metadata()
    }

    fn check_frame_size(&self, metadata: &ImageMetadata) -> Result<()> {
        if let Some(limit) = self.config.max_frame_bytes {
            let required = metadata.frame_len() as u64;
            if required > limit {
                return Err(FormatError::FrameTooLarge { required, limit }.into());
            }
        }
        Ok(())
    }

    /// Selects `frame` on an open handle and decodes it.
    pub fn read_frame(&self, handle: &mut ImageHandle<'_>, frame: u32) -> Result<DecodedFrame> {
        handle.select_frame(frame)?;
        enter(Stage::FrameSelected, frame);
        let metadata = handle.metadata()?;
        self.check_frame_size(&metadata)?;
        let pixels = handle.decode_frame()?;
        enter(Stage::Read, frame);
        Ok(DecodedFrame {
            frame,
            metadata,
            pixels,
        })
    }

    pub fn decode_frame(&self, source: ByteSource<'_>, frame: u32) -> Result<DecodedFrame> {
        let mut handle = self.open(source)?;
        self.read_frame(&mut handle, frame)
    }

    pub fn decode_first_frame(&self, source: ByteSource<'_>) -> Result<DecodedFrame> {
        self.decode_frame(source, 0)
    }

    /// Decodes `frame` into `dest` starting at `dest_offset`. Returns the
    /// number of bytes written.
    pub fn decode_frame_into(
        &self,
        source: ByteSource<'_>,
        frame: u32,
        dest: &mut [u8],
        dest_offset: usize,
    ) -> Result<usize> {
        let mut handle = self.open(source)?;
        handle.select_frame(frame)?;
        enter(Stage::FrameSelected, frame);
        let tail = dest.get_mut(dest_offset..).unwrap_or_default();
        let written = handle.read_frame(tail)?;
        enter(Stage::Read, frame);
        Ok(written)
    }

    /// Decodes every frame in increasing index order.
    pub fn decode_all_frames(&self, source: ByteSource<'_>) -> Result<Vec<DecodedFrame>> {
        let mut handle = self.open(source)?;
        let frame_count = handle.frame_count()?;
        log::info!("found {} frames", frame_count);
        (0..frame_count)
            .map(|frame| self.read_frame(&mut handle, frame))
            .collect()
    }

    /// Transcodes one frame of an open image into `destination`.
    pub fn transcode_frame_to<W: Write + Seek>(
        &self,
        handle: &mut ImageHandle<'_>,
        frame: u32,
        destination: W,
        extension: &str,
    ) -> Result<()> {
        self.transcode_selected(handle, frame, extension, || {
            OutputSink::create(self.encoders, destination, extension)
        })
    }

    /// Runs one frame cycle. The sink is only created once the converter
    /// exists.
    fn transcode_selected<'w>(
        &self,
        handle: &mut ImageHandle<'_>,
        frame: u32,
        extension: &str,
        create_sink: impl FnOnce() -> Result<OutputSink<'w>>,
    ) -> Result<()> {
        handle.select_frame(frame)?;
        enter(Stage::FrameSelected, frame);

        let mut converter = TranscodeConverter::build(self.codecs, handle, extension)?;
        enter(Stage::ConverterBuilt, frame);

        let mut sink = create_sink()?;
        sink.initialize_from(converter.source())?;
        enter(Stage::SinkInitialized, frame);

        if let Err(e) = sink.write(&mut converter) {
            if let Err(close_err) = sink.close() {
                log::warn!("releasing output after failed write: {}", close_err);
            }
            return Err(e);
        }
        enter(Stage::Written, frame);

        sink.close()?;
        enter(Stage::Closed, frame);
        Ok(())
    }

    fn transcode_open_frame(
        &self,
        handle: &mut ImageHandle<'_>,
        frame: u32,
        path: &Path,
    ) -> Result<()> {
        let extension = encoder::output_extension(path)?;
        self.transcode_selected(handle, frame, &extension, || {
            OutputSink::create_file(self.encoders, path)
        })
    }

    /// Transcodes one frame to `path`; the extension picks the encoder.
    pub fn transcode_frame(
        &self,
        source: ByteSource<'_>,
        frame: u32,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let mut handle = self.open(source)?;
        self.transcode_open_frame(&mut handle, frame, path.as_ref())
    }

    /// Transcodes every frame, naming outputs per the configured
    /// [`FrameNaming`](crate::FrameNaming).
    pub fn transcode_file(
        &self,
        source: ByteSource<'_>,
        path: impl AsRef<Path>,
    ) -> Result<Vec<FrameOutput>> {
        let base = path.as_ref();
        let mut handle = self.open(source)?;
        let frame_count = handle.frame_count()?;
        log::info!("found {} frames", frame_count);

        let mut outputs = Vec::with_capacity(frame_count as usize);
        for frame in 0..frame_count {
            let path = self.config.frame_naming.path_for(base, frame, frame_count);
            self.transcode_open_frame(&mut handle, frame, &path)?;
            outputs.push(FrameOutput { frame, path });
        }
        Ok(outputs)
    }
}
