//! Command line front end.
//!
//! Hosts that link a codec backend call [`run`] from their `main` with the
//! process arguments and standard streams and exit with its return value.
//!
//! ```text
//! jxrdecode                              decode stdin, raw bytes to stdout
//! jxrdecode <input>                      decode a file, raw bytes to stdout
//! jxrdecode <input> <output>             transcode, output extension picks the format
//! jxrdecode --in-memory <input> [output] decode (or transcode) from a memory buffer
//! jxrdecode --from-offset <input> <n>    decode a stream embedded at byte n
//! ```

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::codec::{CodecFactory, EncoderFactory};
use crate::config::{PipelineConfig, RawOutput};
use crate::constants::{
    FAILURE_EXIT_CODE, HEX_GROUPS_PER_LINE, HEX_GROUP_BYTES, UNSUPPORTED_FORMAT_EXIT_CODE,
};
use crate::error::{JxrError, Result};
use crate::pipeline::Pipeline;
use crate::source::ByteSource;

/// Decode JPEG XR images to raw pixels or transcode them to other formats
#[derive(Parser, Debug)]
#[command(name = "jxrdecode")]
#[command(version)]
#[command(about = "Decode or transcode JPEG XR images", long_about = None)]
#[command(after_help = "EXAMPLES:
    jxrdecode < image.jxr > pixels.raw
    jxrdecode image.jxr > pixels.raw
    jxrdecode image.jxr image.png
    jxrdecode --in-memory image.jxr
    jxrdecode --from-offset slide.czi 1048576")]
struct Cli {
    /// Read the whole input file into memory and decode from the buffer
    #[arg(long, conflicts_with = "from_offset")]
    in_memory: bool,

    /// Decode a JPEG XR stream starting at a byte offset inside the input
    #[arg(long, alias = "from-czi-offset")]
    from_offset: bool,

    /// Write decoded bytes as 0xAABBCCDD groups instead of raw binary
    #[arg(long)]
    hex: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Input file, then an output file or byte offset
    #[arg(value_name = "PATH")]
    paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Stdin,
    Decode(PathBuf),
    Transcode { input: PathBuf, output: PathBuf },
    InMemory { input: PathBuf, output: Option<PathBuf> },
    FromOffset { input: PathBuf, offset: u64 },
}

impl Cli {
    fn command(&self) -> std::result::Result<Command, String> {
        let paths: Vec<PathBuf> = self.paths.iter().map(PathBuf::from).collect();
        if self.in_memory {
            return match paths.as_slice() {
                [input] => Ok(Command::InMemory {
                    input: input.clone(),
                    output: None,
                }),
                [input, output] => Ok(Command::InMemory {
                    input: input.clone(),
                    output: Some(output.clone()),
                }),
                _ => Err("--in-memory expects <input> [output]".to_string()),
            };
        }
        if self.from_offset {
            return match self.paths.as_slice() {
                [input, offset] => offset
                    .parse::<u64>()
                    .map(|offset| Command::FromOffset {
                        input: PathBuf::from(input),
                        offset,
                    })
                    .map_err(|e| format!("invalid offset {:?}: {}", offset, e)),
                _ => Err("--from-offset expects <input> <offset>".to_string()),
            };
        }
        match paths.as_slice() {
            [] => Ok(Command::Stdin),
            [input] => Ok(Command::Decode(input.clone())),
            [input, output] => Ok(Command::Transcode {
                input: input.clone(),
                output: output.clone(),
            }),
            _ => Err("too many arguments".to_string()),
        }
    }

    fn config(&self) -> PipelineConfig {
        let raw_output = if self.hex {
            RawOutput::Hex
        } else {
            RawOutput::Raw
        };
        PipelineConfig::default().with_raw_output(raw_output)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // A host may already have installed a logger.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

/// Runs the front end and returns the process exit code.
pub fn run<I, T>(
    codecs: &dyn CodecFactory,
    encoders: &dyn EncoderFactory,
    args: I,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            if e.use_stderr() {
                let _ = write!(stderr, "{}", e.render());
                return FAILURE_EXIT_CODE;
            }
            let _ = write!(stdout, "{}", e.render());
            return 0;
        }
    };
    init_logging(cli.verbose);

    let command = match cli.command() {
        Ok(command) => command,
        Err(message) => {
            let _ = writeln!(stderr, "error: {}\n\nFor more information, try '--help'.", message);
            return FAILURE_EXIT_CODE;
        }
    };

    let pipeline = Pipeline::with_config(codecs, encoders, cli.config());
    match execute(&pipeline, command, stdin, stdout) {
        Ok(()) => 0,
        Err(e) => report(&e, stderr),
    }
}

fn report(error: &JxrError, stderr: &mut dyn Write) -> i32 {
    if error.is_format() {
        let _ = writeln!(stderr, "*** ERROR: Unsupported format in JPEG XR ***");
        let _ = writeln!(stderr, "{}", error);
        return UNSUPPORTED_FORMAT_EXIT_CODE;
    }
    let _ = writeln!(stderr, "error: {}", error);
    FAILURE_EXIT_CODE
}

fn execute(
    pipeline: &Pipeline<'_>,
    command: Command,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Stdin => {
            log::info!("streaming data in/out");
            let mut bytes = Vec::new();
            stdin.read_to_end(&mut bytes)?;
            log::info!("read {} bytes from standard input", bytes.len());
            emit_frames(pipeline, ByteSource::from_bytes(&bytes), stdout)
        }
        Command::Decode(input) => {
            log::info!("streaming file {} data out", input.display());
            emit_frames(pipeline, ByteSource::from_path(&input)?, stdout)
        }
        Command::Transcode { input, output } => {
            log::info!("converting file {} to {}", input.display(), output.display());
            transcode(pipeline, ByteSource::from_path(&input)?, &output)
        }
        Command::InMemory { input, output } => {
            log::info!("reading bytes from file: {}", input.display());
            let bytes = fs::read(&input)?;
            let source = ByteSource::from_bytes(&bytes);
            match output {
                Some(output) => transcode(pipeline, source, &output),
                None => emit_frames(pipeline, source, stdout),
            }
        }
        Command::FromOffset { input, offset } => {
            log::info!(
                "streaming file {} data out from offset {}",
                input.display(),
                offset
            );
            emit_frames(pipeline, ByteSource::from_path_at(&input, offset)?, stdout)
        }
    }
}

fn transcode(pipeline: &Pipeline<'_>, source: ByteSource<'_>, output: &std::path::Path) -> Result<()> {
    for written in pipeline.transcode_file(source, output)? {
        log::info!("wrote frame {} to {}", written.frame, written.path.display());
    }
    Ok(())
}

/// Decodes every frame and writes it to `out`, one frame at a time.
fn emit_frames(pipeline: &Pipeline<'_>, source: ByteSource<'_>, out: &mut dyn Write) -> Result<()> {
    let mut handle = pipeline.open(source)?;
    let frame_count = handle.frame_count()?;
    log::info!("found {} frames", frame_count);
    for frame in 0..frame_count {
        let decoded = pipeline.read_frame(&mut handle, frame)?;
        log::info!("frame {}: {} bytes", frame, decoded.pixels.len());
        match pipeline.config().raw_output {
            RawOutput::Raw => out.write_all(&decoded.pixels)?,
            RawOutput::Hex => write_hex(&decoded.pixels, out)?,
        }
    }
    out.flush()?;
    Ok(())
}

/// Writes `bytes` as `0xAABBCCDD` groups, ten per line. A trailing partial
/// group is zero padded.
pub fn write_hex(bytes: &[u8], out: &mut dyn Write) -> io::Result<()> {
    for (index, group) in bytes.chunks(HEX_GROUP_BYTES).enumerate() {
        let mut padded = [0u8; HEX_GROUP_BYTES];
        padded[..group.len()].copy_from_slice(group);
        let separator = if (index + 1) % HEX_GROUPS_PER_LINE == 0 {
            '\n'
        } else {
            ' '
        };
        write!(
            out,
            "0x{:02x}{:02x}{:02x}{:02x}{}",
            padded[0], padded[1], padded[2], padded[3], separator
        )?;
    }
    Ok(())
}
