use std::io::{IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use selectkms1::app::{run, Outcome};
use selectkms1::env::ProcessEnvironment;
use selectkms1::error::Error;
use sfkms_snowflake::db::OpenOptions;

/// Fatal errors are reported through this target whatever RUST_LOG says.
const FATAL_DIRECTIVE: &str = "selectkms1=error";

/// Runs SELECT 1 on Snowflake with a key-pair JWT signed by AWS KMS.
///
/// Connection settings come from SNOWFLAKE_TEST_ACCOUNT, SNOWFLAKE_TEST_USER,
/// SNOWFLAKE_TEST_PASSWORD, SNOWFLAKE_TEST_HOST, SNOWFLAKE_TEST_PORT, SNOWFLAKE_TEST_PROTOCOL
/// and SNOWFLAKE_TEST_KMSARN. AWS credentials, and an optional AWS_ENDPOINT_URL_KMS, follow the
/// AWS SDK defaults.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {}

fn filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match FATAL_DIRECTIVE.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Output is only a success once it has been flushed.
fn flushed(result: Result<Outcome, Error>, out: &mut impl Write) -> Result<Outcome, Error> {
    let outcome = result?;
    out.flush()?;
    Ok(outcome)
}

fn main() -> ExitCode {
    let _args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to start the runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut stdout = std::io::stdout().lock();
    let result = runtime.block_on(run(&ProcessEnvironment, OpenOptions::default(), &mut stdout));
    let result = flushed(result, &mut stdout);
    match result {
        // a row stream error has already been reported; the exit status stays 0
        Ok(Outcome::Success) | Ok(Outcome::RowError) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
