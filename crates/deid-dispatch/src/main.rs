use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use deid_dispatch_core::dispatch::DEFAULT_MAX_PARALLEL;
use deid_dispatch_core::{
    DispatchParams,
    ExitStatus,
    JobSettings,
    Submitter,
};
use deid_dispatch_gcp::{
    GcpSettings,
    GcsClient,
    GenomicsClient,
};

/// Run the PhysioNet de-identification transform on every shard of a
/// Cloud Storage input pattern, one pipeline per shard.
#[derive(Parser, Debug)]
#[command(name = "run-deid", version, long_about = None)]
struct Args {
    /// GCS path of the deid.pl configuration file
    #[arg(long = "config_file")]
    config_file: String,

    /// GCS pattern of the input shards, e.g. gs://bucket/file-??-of-??
    #[arg(long = "input_pattern")]
    input_pattern: String,

    /// GCS directory that receives the de-identified shards
    #[arg(long = "output_directory")]
    output_directory: String,

    /// Cloud project that runs the pipelines
    #[arg(long = "project")]
    project: String,

    /// GCS directory for pipeline logs
    #[arg(long = "log_directory")]
    log_directory: String,

    /// GCS directory with dictionary files for deid.pl
    #[arg(long = "dict_directory")]
    dict_directory: Option<String>,

    /// GCS directory with list files for deid.pl
    #[arg(long = "lists_directory")]
    lists_directory: Option<String>,

    /// Maximum number of submissions in flight at once
    #[arg(
        long = "max_num_threads",
        default_value_t = DEFAULT_MAX_PARALLEL as u32,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_num_threads: u32,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

impl From<Args> for DispatchParams {
    fn from(args: Args) -> Self {
        DispatchParams {
            input_pattern: args.input_pattern,
            settings: JobSettings {
                output_directory: args.output_directory,
                config_file: args.config_file,
                project_id: args.project,
                log_directory: args.log_directory,
                dict_directory: args.dict_directory,
                lists_directory: args.lists_directory,
            },
            max_parallel: args.max_num_threads as usize,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        deid_dispatch_core::logging::init_verbose();
    } else {
        deid_dispatch_core::logging::init();
    }

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    match run(args.into()).await {
        Ok(status) => status.into(),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitStatus::Failure.into()
        }
    }
}

async fn run(params: DispatchParams) -> anyhow::Result<ExitStatus> {
    let settings = GcpSettings::from_env().context("Failed to read GCP settings")?;
    let http = deid_dispatch_gcp::build_http_client(&settings)
        .context("Failed to initialize HTTP client")?;
    let tokens = deid_dispatch_gcp::provider_from_env();

    tracing::info!(
        storage = %settings.storage_endpoint,
        genomics = %settings.genomics_endpoint,
        project = %params.settings.project_id,
        "Starting de-identification dispatch"
    );

    let storage = GcsClient::new(http.clone(), &settings, Arc::clone(&tokens));
    let pipelines = GenomicsClient::new(http, &settings, tokens);
    let submitter = Arc::new(Submitter::new(Arc::new(pipelines)));

    Ok(deid_dispatch_core::run_pipeline(&params, &storage, submitter).await)
}
