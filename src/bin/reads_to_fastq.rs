use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use reads_to_fastq::app::{App, ConvertRequest};
use reads_to_fastq::blobstore::ShockHttpClient;
use reads_to_fastq::config::ConfigLoader;
use reads_to_fastq::error::ReadsError;
use reads_to_fastq::output::{JsonOutput, LogSink};
use reads_to_fastq::scratch::Scratch;
use reads_to_fastq::workspace::WorkspaceHttpClient;

const TOKEN_ENV: &str = "KB_AUTH_TOKEN";

#[derive(Parser)]
#[command(name = "reads-to-fastq")]
#[command(about = "Convert workspace reads libraries into local FASTQ files")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download reads libraries as FASTQ files")]
    Convert(ConvertArgs),
    #[command(about = "Show service status")]
    Status,
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(long)]
    workspace: String,

    #[arg(long = "library", required = true)]
    libraries: Vec<String>,

    #[arg(long)]
    gzip: Option<String>,

    #[arg(long)]
    interleaved: Option<String>,

    #[arg(long)]
    token: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ReadsError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ReadsError) -> u8 {
    match error {
        error if error.is_validation() => 2,
        ReadsError::MissingConfig | ReadsError::ConfigRead(_) | ReadsError::ConfigParse(_) => 2,
        ReadsError::Download { source, .. } => map_exit_code(source),
        ReadsError::InvalidFileKind { .. } => 2,
        ReadsError::BlobStoreHttp(_)
        | ReadsError::BlobStoreStatus { .. }
        | ReadsError::WorkspaceHttp(_)
        | ReadsError::WorkspaceStatus { .. }
        | ReadsError::WorkspaceRpc { .. } => 3,
        _ => 1,
    }
}

/// The `--token` flag wins over the environment; blank values count as absent.
fn resolve_token(flag: Option<String>, env: Option<String>) -> Result<String, ReadsError> {
    flag.filter(|value| !value.trim().is_empty())
        .or_else(|| env.filter(|value| !value.trim().is_empty()))
        .ok_or(ReadsError::MissingToken)
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => run_convert(args, cli.config.as_deref()),
        Commands::Status => {
            let status = reads_to_fastq::app::status();
            JsonOutput::print_status(&status).into_diagnostic()?;
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs, config: Option<&str>) -> miette::Result<()> {
    let ConvertArgs {
        workspace,
        libraries,
        gzip,
        interleaved,
        token,
    } = args;

    let request = ConvertRequest {
        workspace_name: workspace,
        read_libraries: libraries,
        gzip,
        interleaved,
    };
    request.validate()?;
    let token = resolve_token(token, std::env::var(TOKEN_ENV).ok())?;

    let resolved = ConfigLoader::resolve(config)?;
    tracing::debug!(workspace_url = %resolved.workspace_url, scratch = %resolved.scratch, "loaded config");
    let workspace = WorkspaceHttpClient::new(resolved.workspace_url.clone())?;
    let blobs = ShockHttpClient::new(resolved.blob_store_url.clone())?;
    let app = App::new(Scratch::new(resolved.scratch), workspace, blobs);

    let result = app.convert(&request, &token, &LogSink)?;
    JsonOutput::print_conversion(&result).into_diagnostic()?;
    Ok(())
}
