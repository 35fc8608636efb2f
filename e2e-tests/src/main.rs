use std::env::var;

use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{Result as EyreResult, WrapErr};
use serde_json::from_slice;
use tokio::fs::{create_dir_all, read};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{registry, EnvFilter};

use config::Config;
use driver::Driver;
use output::{OutputFormat, OutputWriter};

mod config;
mod driver;
mod output;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON run configuration. Built-in defaults are used when absent.
    #[arg(long, value_name = "PATH", env = "E2E_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Directory for the run report.
    #[arg(long, value_name = "PATH", env = "E2E_OUTPUT_DIR")]
    pub output_dir: Utf8PathBuf,

    #[arg(long, value_enum, default_value_t)]
    pub output_format: OutputFormat,

    /// Only run scenarios whose name contains this text.
    #[arg(long, value_name = "SUBSTRING")]
    pub filter: Option<String>,

    /// Also run scenarios on the skip list.
    #[arg(long)]
    pub include_skipped: bool,
}

#[derive(Debug)]
pub struct TestEnvironment {
    pub output_dir: Utf8PathBuf,
    pub output_writer: OutputWriter,
    pub filter: Option<String>,
    pub include_skipped: bool,
}

impl From<Args> for TestEnvironment {
    fn from(args: Args) -> Self {
        Self {
            output_dir: args.output_dir,
            output_writer: OutputWriter::new(args.output_format),
            filter: args.filter,
            include_skipped: args.include_skipped,
        }
    }
}

impl TestEnvironment {
    async fn init(&self) -> EyreResult<()> {
        create_dir_all(&self.output_dir).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> EyreResult<()> {
    setup()?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => from_slice(&read(path).await?)
            .wrap_err_with(|| format!("malformed config file {path}"))?,
        None => Config::default(),
    };

    let driver = Driver::new(args.into(), config);

    driver.run().await
}

fn setup() -> EyreResult<()> {
    let directives = match var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => "e2e_tests=info,gnmi_=info".to_owned(),
    };

    registry()
        .with(EnvFilter::builder().parse(directives)?)
        .with(layer())
        .init();

    color_eyre::install()?;

    Ok(())
}
