use keepdir::cli::{Invocation, run_cli};
use keepdir::output::OutputFormatter;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let invocation = Invocation::parse();

    // RUST_LOG wins over -v
    let level = match invocation.args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run_cli(invocation) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            OutputFormatter::error(&format!(
                "{} keepfile change(s) failed",
                report.failures
            ));
            ExitCode::FAILURE
        }
        Err(e) => {
            OutputFormatter::error(&format!("keepdir: {}", e));
            ExitCode::FAILURE
        }
    }
}
