//! PDFCraft command line
//!
//! Inspects PDFs and stamps annotation lists (as saved by the editor) into
//! them without a browser.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdfcraft_core::annotation::AnnotationStore;
use pdfcraft_core::config::EditorConfig;
use pdfcraft_core::error::{ErrorCategory, PdfCraftError};
use pdfcraft_core::page_info::{page_geometries, Orientation, PageGeometry};
use pdfcraft_core::session::{EditorSession, PdfFile};
use pdfcraft_core::validation::{load_document, strip_to_signature, validate_pdf, PdfInfo};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "pdfcraft")]
#[command(version, about = "Inspect PDFs and burn annotations into them")]
struct Cli {
    /// Editor configuration (JSON); defaults apply when omitted
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print document metadata and page geometry as JSON
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Stamp an annotation list into a copy of the document
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Annotation list as JSON
        #[arg(long, value_name = "JSON")]
        annotations: PathBuf,
        /// Output path; defaults to `<prefix>_<name>` next to the input
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default editor configuration
    DefaultConfig,
}

#[derive(Debug, Serialize)]
struct InspectOutput {
    path: String,
    info: PdfInfo,
    pages: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
struct PageReport {
    #[serde(flatten)]
    geometry: PageGeometry,
    orientation: Orientation,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Exit status by failure kind: 2 rejected input, 3 unreadable document,
/// 4 failed export, 1 for everything else
fn exit_code(err: &anyhow::Error) -> u8 {
    let category = err
        .chain()
        .find_map(|e| e.downcast_ref::<PdfCraftError>())
        .map(PdfCraftError::category);
    match category {
        Some(ErrorCategory::InputRejected) => 2,
        Some(ErrorCategory::LoadFailed) => 3,
        Some(ErrorCategory::ExportFailed) => 4,
        _ => 1,
    }
}

fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { file } => {
            let output = inspect(&file)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Export {
            file,
            annotations,
            output,
        } => {
            let written = export(&file, &annotations, output.as_deref(), config)?;
            println!("{}", written.display());
        }
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&EditorConfig::default())?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EditorConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn inspect(file: &Path) -> Result<InspectOutput> {
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let info = validate_pdf(&bytes).context("not a readable PDF")?;
    let doc = load_document(strip_to_signature(&bytes)?)?;
    let pages = page_geometries(&doc)
        .context("failed to read page geometry")?
        .into_iter()
        .map(|geometry| PageReport {
            orientation: geometry.orientation(),
            geometry,
        })
        .collect();

    Ok(InspectOutput {
        path: file.display().to_string(),
        info,
        pages,
    })
}

/// Returns the path written
fn export(
    file: &Path,
    annotations: &Path,
    output: Option<&Path>,
    config: EditorConfig,
) -> Result<PathBuf> {
    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    let json = fs::read_to_string(annotations)
        .with_context(|| format!("failed to read {}", annotations.display()))?;
    let store = AnnotationStore::from_json(&json)
        .with_context(|| format!("invalid annotation list {}", annotations.display()))?;

    let mut session = EditorSession::open(PdfFile::new(name, bytes), config)
        .with_context(|| format!("failed to open {}", file.display()))?;
    for annotation in store.as_slice() {
        session
            .add_annotation(annotation.clone())
            .with_context(|| format!("annotation {} rejected", annotation.id()))?;
    }

    let exported = session.export().context("export failed")?;
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => file.with_file_name(&exported.file_name),
    };
    fs::write(&target, &exported.bytes)
        .with_context(|| format!("failed to write {}", target.display()))?;

    tracing::info!(
        annotations = store.len(),
        output = %target.display(),
        "annotated PDF written"
    );
    session.close();
    Ok(target)
}
