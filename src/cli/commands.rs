//! CLI command definitions and handlers

use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::core::client::TranslationClient;
use crate::core::config::{ClientConfig, MAX_CONCURRENT_LIMIT};
use crate::core::models::TranslationSettings;
use crate::processors::discovery::{
    discover_files, map_output_path, ExtensionFilter, DEFAULT_EXTENSIONS,
};
use crate::processors::dispatcher::{run_batch, BatchDispatcher, BatchOutcome, PathPair};

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate documents with the remote translation service
    Translate(TranslateArgs),
}

/// `translate` command group
#[derive(Args, Debug)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: TranslateCommand,
}

/// Connection options shared by `translate file` and `translate batch`
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the translation service
    #[arg(long, env = "TRANSLATION_BASE_URL")]
    pub base_url: String,

    /// Bearer token for the translation service
    #[arg(long, env = "TRANSLATION_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Model identifier
    #[arg(long, default_value = "ibm")]
    pub model: String,

    /// Source language
    #[arg(long, default_value = "en")]
    pub src_lang: String,

    /// Target language
    #[arg(long, default_value = "ja")]
    pub tgt_lang: String,

    /// Glossary identifier
    #[arg(long, default_value = "glos_v1")]
    pub glossary_id: String,

    /// Do-not-translate list identifier
    #[arg(long, default_value = "dnt_v1")]
    pub dnt_id: String,
}

impl ConnectionArgs {
    /// Client configuration with default limits
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, &self.token)
    }

    /// Service-side options applied to every job
    pub fn settings(&self) -> TranslationSettings {
        TranslationSettings {
            model: self.model.clone(),
            src_lang: self.src_lang.clone(),
            tgt_lang: self.tgt_lang.clone(),
            glossary_id: self.glossary_id.clone(),
            do_not_translate_id: self.dnt_id.clone(),
        }
    }
}

/// `translate` subcommands
#[derive(Subcommand, Debug)]
pub enum TranslateCommand {
    /// Translate a single file
    File {
        /// Input file (`-` for standard input)
        input: PathBuf,

        /// Output file (`-` for standard output)
        #[arg(short = 'o', long = "output-file", default_value = "-")]
        output: PathBuf,

        /// Document extension, required when reading standard input
        #[arg(short = 'x', long, required_if_eq("input", "-"))]
        extension: Option<String>,
    },

    /// Translate every matching file under a directory
    Batch {
        /// Input directory
        input_dir: PathBuf,

        /// Output directory, mirroring the input tree
        #[arg(short = 'o', long)]
        output_dir: PathBuf,

        /// Maximum number of files translated concurrently
        #[arg(
            long,
            default_value_t = 20,
            value_parser = clap::value_parser!(u32).range(1..=MAX_CONCURRENT_LIMIT as i64)
        )]
        max_concurrent: u32,

        /// Comma-separated list of file extensions to include
        #[arg(short, long, default_value = DEFAULT_EXTENSIONS)]
        extensions: String,
    },
}

/// Dispatch a `translate` invocation
pub async fn handle_translate(args: TranslateArgs) -> anyhow::Result<BatchOutcome> {
    match args.command {
        TranslateCommand::File {
            input,
            output,
            extension,
        } => handle_file(&args.connection, input, output, extension).await,
        TranslateCommand::Batch {
            input_dir,
            output_dir,
            max_concurrent,
            extensions,
        } => {
            handle_batch(
                &args.connection,
                input_dir,
                output_dir,
                max_concurrent as usize,
                &extensions,
            )
            .await
        }
    }
}

/// Handle single file translation
pub async fn handle_file(
    connection: &ConnectionArgs,
    input: PathBuf,
    output: PathBuf,
    extension: Option<String>,
) -> anyhow::Result<BatchOutcome> {
    info!("Translating {} -> {}", input.display(), output.display());

    let client = TranslationClient::new(connection.client_config().with_max_concurrent(1))
        .context("Failed to create translation client")?;
    let dispatcher = BatchDispatcher::new(client, connection.settings());

    let mut pair = PathPair::new(input, output);
    if let Some(extension) = extension {
        pair = pair.with_extension(extension);
    }

    Ok(dispatcher.run(vec![pair]).await)
}

/// Handle directory translation
pub async fn handle_batch(
    connection: &ConnectionArgs,
    input_dir: PathBuf,
    output_dir: PathBuf,
    max_concurrent: usize,
    extensions: &str,
) -> anyhow::Result<BatchOutcome> {
    let filter = ExtensionFilter::parse(extensions);
    let files = discover_files(&input_dir, &filter)
        .with_context(|| format!("Failed to scan {}", input_dir.display()))?;
    eprintln!("Found {} files to process.", files.len());

    let pairs = files
        .into_iter()
        .map(|input| {
            let output = map_output_path(&input, &input_dir, &output_dir)?;
            Ok(PathPair::new(input, output))
        })
        .collect::<crate::core::errors::Result<Vec<_>>>()?;

    info!(
        "Batch: {} -> {} (max_concurrent={})",
        input_dir.display(),
        output_dir.display(),
        max_concurrent
    );

    let outcome = run_batch(
        connection.client_config(),
        connection.settings(),
        pairs,
        max_concurrent,
    )
    .await
    .context("Failed to create translation client")?;

    eprintln!("{}", outcome.summary());
    Ok(outcome)
}
