//! oxide-cgi
//!
//! Serves the demo application as a CGI program.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_cgi::routes::demo_dispatcher;
use oxide_cgi::{write_response, CgiError, CgiRequest};
use oxide_dispatch::{Options, Response};

/// Route resolution and dispatch behind a CGI gateway.
#[derive(Parser)]
#[command(name = "oxide-cgi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON options file.
    #[arg(short, long, env = "OXIDE_OPTIONS")]
    options: Option<PathBuf>,

    /// Prefix the application is mounted under.
    #[arg(long, env = "OXIDE_ROOT_URI")]
    root_uri: Option<String>,

    /// Show fault details in responses.
    #[arg(long)]
    debug: bool,

    /// Send fault responses as JSON.
    #[arg(long)]
    json_errors: bool,

    /// Directory the file routes download from and upload to.
    #[arg(long, env = "OXIDE_FILES_DIR", default_value = "test_files")]
    files_dir: PathBuf,

    /// Print the route table instead of serving a request.
    #[arg(long)]
    list_routes: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Stdout carries the response, so logs go to stderr
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut options = match &cli.options {
        Some(path) => Options::from_file(path)?,
        None => Options::default(),
    };
    if let Some(root_uri) = cli.root_uri {
        options.root_uri = root_uri;
    }
    options.debug_mode |= cli.debug;
    options.json_errors |= cli.json_errors;
    let mut stdout = io::stdout().lock();

    if cli.list_routes {
        let dispatcher = demo_dispatcher(options, cli.files_dir);
        for route in dispatcher.load_routes().routes() {
            writeln!(stdout, "{:<8} {}", route.method.to_string(), route.uri)?;
        }
        return Ok(());
    }

    let cgi = CgiRequest::from_env()?;
    cgi.default_root_uri(&mut options);
    debug!(?options, files_dir = %cli.files_dir.display(), "starting");

    let dispatcher = demo_dispatcher(options, cli.files_dir);
    let response = match cgi.into_host_request(io::stdin()) {
        Ok(request) => dispatcher.dispatch(request),
        Err(e @ CgiError::UnsupportedMethod(_)) => {
            warn!(error = %e, "rejecting request");
            Response::send("Not implemented", 501, "text/plain")?
        }
        Err(e) => return Err(e.into()),
    };
    write_response(&response, &mut stdout)?;

    Ok(())
}
