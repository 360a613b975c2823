use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use glapi_generator::{Api, ExtensionLoaderGenerator, Registry};
use tempfile::NamedTempFile;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Generates extension loader declarations from a Khronos XML registry.
#[derive(Parser, Debug)]
#[command(name = "gen-glapi-loaders")]
#[command(about = "Generate OpenGL extension loader declarations from XML")]
struct Args {
    /// Registry to read (defaults to stdin)
    #[arg(value_name = "INFILE")]
    infile: Option<PathBuf>,

    /// Where the typedefs and defines go (defaults to stdout)
    #[arg(value_name = "OUTFILE")]
    outfile: Option<PathBuf>,

    /// API to generate for
    #[arg(long, default_value = "gles2", value_parser = parse_api)]
    api: Api,

    /// Where the `struct extensions` table goes (defaults to stdout, may be OUTFILE)
    #[arg(long, value_name = "PATH")]
    table: Option<PathBuf>,

    /// Replaces the preamble at the top of the header
    #[arg(long, value_name = "LINE")]
    include: Option<String>,

    /// More logging, repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_api(s: &str) -> Result<Api, String> {
    s.parse::<Api>().map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    // stdout carries the generated code
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn read_registry(infile: Option<&Path>) -> anyhow::Result<Registry> {
    let registry = match infile {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
            Registry::from_xml(BufReader::new(file))
        },
        None => {
            let stdin = io::stdin();
            let lock = stdin.lock();
            Registry::from_xml(lock)
        },
    };
    Ok(registry?)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Whether two destination paths name the same file, whether or not it exists yet.
fn same_destination(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    let resolve = |path: &Path| Some(parent_dir(path).canonicalize().ok()?.join(path.file_name()?));
    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// An output destination whose contents only become visible on `commit`.
///
/// Files are written to a temporary file beside the destination and renamed
/// into place, stdout is buffered.
enum Output {
    Stdout(Vec<u8>),
    File { tmp: NamedTempFile, path: PathBuf },
}

impl Output {
    fn create(path: Option<&Path>) -> anyhow::Result<Output> {
        match path {
            Some(path) => {
                let tmp = NamedTempFile::new_in(parent_dir(path))
                    .with_context(|| format!("could not create {}", path.display()))?;
                Ok(Output::File { tmp, path: path.to_owned() })
            },
            None => Ok(Output::Stdout(Vec::new())),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Output::Stdout(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            },
            Output::File { tmp, .. } => tmp.write_all(bytes),
        }
    }

    fn commit(self) -> anyhow::Result<()> {
        match self {
            Output::Stdout(buf) => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(&buf)?;
                lock.flush()?;
            },
            Output::File { tmp, path } => {
                tmp.persist(&path).with_context(|| format!("could not write {}", path.display()))?;
            },
        }
        Ok(())
    }
}

fn write_outputs(header_path: Option<&Path>, table_path: Option<&Path>, header: &[u8], table: &[u8]) -> anyhow::Result<()> {
    let shared = match (header_path, table_path) {
        (None, None) => true,
        (Some(a), Some(b)) => same_destination(a, b),
        _ => false,
    };

    if shared {
        let mut out = Output::create(header_path)?;
        out.write_all(header)?;
        out.write_all(table)?;
        return out.commit();
    }

    // every destination is created before anything is committed
    let mut header_out = Output::create(header_path)?;
    let mut table_out = Output::create(table_path)?;
    header_out.write_all(header)?;
    table_out.write_all(table)?;
    header_out.commit()?;
    table_out.commit()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let registry = read_registry(args.infile.as_deref())?;

    let mut generator = ExtensionLoaderGenerator::new(args.api);
    if let Some(include) = args.include {
        generator = generator.with_include(include);
    }

    let loaders = generator.generate(&registry)?;
    let mut header = Vec::new();
    let mut table = Vec::new();
    loaders.write_header(&mut header)?;
    loaders.write_table(&mut table)?;

    log::debug!("writing {} header bytes, {} table bytes", header.len(), table.len());
    write_outputs(args.outfile.as_deref(), args.table.as_deref(), &header, &table)
}
