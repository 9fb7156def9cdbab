//! render-diagram CLI entry point.
//!
//! Renders a Mermaid diagram file to an image by delegating to the Mermaid CLI.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use render_diagram::{Invoker, RenderError, RenderOutput, load_config};

#[derive(Parser, Debug)]
#[command(name = "render-diagram")]
#[command(version)]
#[command(about = "Render a Mermaid diagram file to an image", long_about = None)]
struct Args {
    /// Diagram source file (e.g. diagram.mmd)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Image to write (defaults to INPUT with a .png extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Renderer configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logger(args.verbose);

    match run(args).await {
        Ok(output) => match relay_success(&output) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

async fn run(args: Args) -> Result<RenderOutput, RenderError> {
    if args.input.is_none() {
        return Err(RenderError::Usage);
    }

    let config = load_config(args.config.as_deref())?;
    let invoker = Invoker::new(config);

    let request = invoker.request(args.input, args.output)?;
    let request = invoker.effective_request(&request)?;

    println!("Running: {}", invoker.command_line(&request));
    log::info!(
        "Rendering {} -> {}",
        request.input().display(),
        request.output().display()
    );

    invoker.render(&request).await
}

fn relay_success(output: &RenderOutput) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_block(&mut stdout, &output.stdout).context("Failed to relay renderer stdout")?;
    write_block(&mut stdout, &output.stderr).context("Failed to relay renderer stderr")?;
    writeln!(stdout, "Rendered image: {}", output.output.display())
        .context("Failed to write result line")?;
    stdout.flush().context("Failed to flush stdout")
}

fn report_failure(err: &RenderError) {
    if !err.is_render_failure() {
        match err {
            RenderError::Usage => eprintln!("{err}"),
            _ => eprintln!("Error: {err}"),
        }
        return;
    }

    if let RenderError::Failed { stdout, .. } = err {
        let _ = write_block(&mut std::io::stdout().lock(), stdout);
    }
    log::debug!("{err}");
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "Render failed:");
    let _ = write_block(&mut stderr, &err.diagnostic());
}

/// Write `bytes` verbatim, adding a trailing newline when they lack one.
fn write_block(out: &mut impl Write, bytes: &[u8]) -> std::io::Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    out.write_all(bytes)?;
    if !bytes.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}
