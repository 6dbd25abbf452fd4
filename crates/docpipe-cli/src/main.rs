//! docpipe command-line interface.
//!
//! Composes the standard pipeline (content-type detection, archive
//! decompression, parser dispatch, optional filters, an exporter) over one
//! input file and writes the result to stdout.
//!
//! Exit codes: 0 on success, 1 on argument errors, 2 on processing errors.

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use docpipe::chain::Pipeline;
use docpipe::container::DecompressArchives;
use docpipe::content_type;
use docpipe::exporters::{CsvExporter, HtmlExporter, MetaDataExporter, PlainTextExporter};
use docpipe::filters;
use docpipe::input::Input;
use docpipe::message::Message;
use docpipe::output::{CollectorOutput, StreamOutput};
use docpipe::parsers::ParseBySignature;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputType {
    PlainText,
    Html,
    Csv,
    Metadata,
    MetadataJson,
}

#[derive(Debug, Parser)]
#[command(name = "docpipe", version, about = "Document-ingestion pipeline toolkit")]
struct Args {
    /// Path to the file to process.
    input_file: PathBuf,

    /// Output form written to stdout.
    #[arg(long, value_enum, default_value_t = OutputType::PlainText)]
    output_type: OutputType,

    /// Pass an opened stream to the pipeline instead of the file path.
    #[arg(long)]
    use_stream: bool,

    /// Enable verbose (debug) logging on stderr.
    #[arg(long)]
    verbose: bool,

    /// Keep only mails created at or after this unix timestamp.
    #[arg(long)]
    min_creation_time: Option<i64>,

    /// Keep only mails created at or before this unix timestamp.
    #[arg(long)]
    max_creation_time: Option<i64>,

    /// Stop processing after this many pipeline messages.
    #[arg(long)]
    max_events: Option<usize>,

    /// Keep only folders with these names (repeatable).
    #[arg(long)]
    folder_name: Vec<String>,

    /// Keep only attachments with these extensions (repeatable).
    #[arg(long)]
    attachment_extension: Vec<String>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let default_level = if verbose { "docpipe=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The shared front of every pipeline: detection, archive expansion, parser
/// dispatch, then the requested filters.
fn build_front(args: &Args) -> Pipeline {
    let mut pipeline = content_type::detector()
        | DecompressArchives::new()
        | ParseBySignature::new();
    if !args.folder_name.is_empty() {
        pipeline |= filters::by_folder_name(args.folder_name.clone());
    }
    if !args.attachment_extension.is_empty() {
        pipeline |= filters::by_attachment_extension(
            args.attachment_extension.iter().map(String::as_str),
        );
    }
    if let Some(min) = args.min_creation_time {
        pipeline |= filters::by_mail_min_creation_time(min);
    }
    if let Some(max) = args.max_creation_time {
        pipeline |= filters::by_mail_max_creation_time(max);
    }
    if let Some(max) = args.max_events {
        pipeline |= filters::by_max_event_count(max);
    }
    pipeline
}

fn make_input(args: &Args) -> docpipe::Result<Input> {
    if !args.input_file.is_file() {
        return Err(docpipe::PipelineError::new(format!(
            "file does not exist: {}",
            args.input_file.display()
        )));
    }
    if args.use_stream {
        let file = std::fs::File::open(&args.input_file)?;
        Ok(Input::seekable(file))
    } else {
        Ok(Input::path(&args.input_file))
    }
}

fn run(args: &Args) -> docpipe::Result<()> {
    tracing::debug!(input = %args.input_file.display(), output_type = ?args.output_type, "building pipeline");
    let mut pipeline = build_front(args);

    if args.output_type == OutputType::MetadataJson {
        let (collector, messages) = CollectorOutput::new();
        pipeline |= collector;
        pipeline.process(make_input(args)?)?;
        for message in messages.lock().iter() {
            match message {
                Message::Document(document) => {
                    let metadata = (document.metadata)();
                    println!("{}", serde_json::to_string_pretty(&metadata)?);
                }
                Message::ExceptionCarrier(error) => {
                    eprintln!("[WARNING] {}", error.diagnostic_message());
                }
                _ => {}
            }
        }
        return Ok(());
    }

    match args.output_type {
        OutputType::PlainText => pipeline |= PlainTextExporter::new(),
        OutputType::Html => pipeline |= HtmlExporter::new(),
        OutputType::Csv => pipeline |= CsvExporter::new(),
        OutputType::Metadata => pipeline |= MetaDataExporter::new(),
        OutputType::MetadataJson => unreachable!("handled above"),
    }
    pipeline |= StreamOutput::new(std::io::stdout())
        .with_warning_handler(|error| eprintln!("[WARNING] {}", error.diagnostic_message()));
    pipeline.process(make_input(args)?)
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let code = match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = error.print();
            return ExitCode::from(code);
        }
    };
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!(
                "[ERROR] {} processing file {}",
                error.diagnostic_message(),
                args.input_file.display()
            );
            ExitCode::from(2)
        }
    }
}
