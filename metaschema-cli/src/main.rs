//! Command-line interface for META Schema
//! Runs the front-end over one source file and prints the requested stage.
//!
//! Usage:
//!   metaschema `<path>` [--stage tokens|ast|asg] [--format json|yaml] [--config `<file>`] [--uri `<uri>`]
//!
//! The stage goes to stdout, diagnostics to stderr, one per line. The exit status is 1 when
//! an error diagnostic was reported and 2 when the file or the configuration could not be
//! read.

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgMatches, Command};
use metaschema_config::{ConfigError, Loader, MetaschemaConfig, OutputConfig, OutputFormat};
use metaschema_parser::metaschema::ast::Position;
use metaschema_parser::metaschema::diagnostics::has_errors;
use metaschema_parser::metaschema::lexing::tokenize;
use metaschema_parser::metaschema::parsing::{ParseTableEntry, TokenDescriptor};
use metaschema_parser::metaschema::{ast, parse_with_options, Analyzer, Diagnostic};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot serialize output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot serialize output: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Io { .. } | CliError::Config(_) => 2,
            CliError::Json(_) | CliError::Yaml(_) => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Tokens,
    Ast,
    Asg,
}

impl Stage {
    fn from_name(name: &str) -> Self {
        match name {
            "tokens" => Stage::Tokens,
            "ast" => Stage::Ast,
            _ => Stage::Asg,
        }
    }
}

/// What the `ast` stage prints
#[derive(Serialize)]
struct AstOutput<'a> {
    document: &'a ast::Document,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    descriptors: Vec<DescriptorEntry<'a>>,
    #[serde(skip_serializing_if = "no_entries")]
    parse_table: &'a [ParseTableEntry],
}

fn no_entries(entries: &&[ParseTableEntry]) -> bool {
    entries.is_empty()
}

#[derive(Serialize)]
struct DescriptorEntry<'a> {
    position: Position,
    #[serde(flatten)]
    descriptor: &'a TokenDescriptor,
}

fn cli() -> Command {
    Command::new("metaschema")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Lexes, parses and lowers META Schema sources")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the META Schema file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("stage")
                .long("stage")
                .short('s')
                .help("Front-end stage to print")
                .value_parser(PossibleValuesParser::new(["tokens", "ast", "asg"]))
                .default_value("asg"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (default: output.format from the configuration)")
                .value_parser(PossibleValuesParser::new(["json", "yaml"])),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("uri")
                .long("uri")
                .help("Document URI used in diagnostics (default: the path)"),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(clean) if clean => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn load_config(matches: &ArgMatches) -> Result<MetaschemaConfig, CliError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("output.format", format.as_str())?;
    }
    Ok(loader.build()?)
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    // A second subscriber can only come from tests running in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs the selected stage. `Ok(false)` means error diagnostics were reported.
fn run(matches: &ArgMatches) -> Result<bool, CliError> {
    let config = load_config(matches)?;
    init_logging(&config.logging.filter);

    let path = matches
        .get_one::<String>("path")
        .map(PathBuf::from)
        .unwrap_or_default();
    let uri = matches
        .get_one::<String>("uri")
        .cloned()
        .unwrap_or_else(|| path.display().to_string());
    let stage = matches
        .get_one::<String>("stage")
        .map_or(Stage::Asg, |name| Stage::from_name(name));

    let source = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(%uri, ?stage, "processing");

    match stage {
        Stage::Tokens => {
            let output = tokenize(&source);
            emit(&output.tokens, &config.output)?;
            if let Some(err) = &output.error {
                eprintln!("error: {err} at {}", err.range());
            }
            Ok(output.is_complete())
        }
        Stage::Ast => {
            let output = parse_with_options(&uri, &source, config.parser.into());
            let descriptors = output
                .descriptors
                .iter()
                .map(|(position, descriptor)| DescriptorEntry {
                    position: *position,
                    descriptor,
                })
                .collect();
            emit(
                &AstOutput {
                    document: &output.document,
                    descriptors,
                    parse_table: &output.parse_table,
                },
                &config.output,
            )?;
            report(&output.diagnostics);
            Ok(!output.has_errors())
        }
        Stage::Asg => {
            let output = parse_with_options(&uri, &source, config.parser.into());
            let mut analyzer = Analyzer::new();
            let graph = analyzer.add_document(&uri, &output.document);
            emit(&graph, &config.output)?;

            let analysis = analyzer.document_diagnostics(&uri);
            report(&output.diagnostics);
            report(analysis);
            Ok(!output.has_errors() && !has_errors(analysis))
        }
    }
}

fn emit<T: Serialize + ?Sized>(value: &T, output: &OutputConfig) -> Result<(), CliError> {
    let text = match output.format {
        OutputFormat::Json if output.pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}
