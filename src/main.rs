// memgate: CLI entry point
//
// Tracing init and top-level error reporting grounded on
// knhk-sidecar::main.rs's `tracing_subscriber::fmt()...init()` bootstrap,
// generalized to honor a configured log file and verbose flag; `anyhow`
// carries the top-level error to the process boundary as SPEC_FULL.md §1.1
// specifies.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use tracing::error;

use memgate::archive::ArchiveRegistry;
use memgate::bench::{spawn_sink, BenchmarkBroker, BenchmarkTap};
use memgate::config::{Cli, Command, ConfigOpts};
use memgate::error::MemgateError;
use memgate::fetch::{build_client, FetchSettings};
use memgate::server::{serve, AppState};
use memgate::session::{timegate, timemap, Disposition, SessionDeps};
use memgate::uri::normalize_urir;

fn init_tracing(opts: &ConfigOpts) -> anyhow::Result<()> {
    let filter = if opts.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &opts.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| MemgateError::LogFileOpen { path: path.clone(), detail: e.to_string() })?;
            builder.with_writer(file).init();
        }
        None => builder.init(),
    }
    Ok(())
}

fn benchmark_sink(opts: &ConfigOpts) -> anyhow::Result<tokio::sync::mpsc::UnboundedSender<memgate::bench::BenchmarkEvent>> {
    Ok(match &opts.benchmark_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| MemgateError::LogFileOpen { path: path.clone(), detail: e.to_string() })?;
            spawn_sink(file)
        }
        None => spawn_sink(std::io::sink()),
    })
}

fn fetch_settings(opts: &ConfigOpts) -> FetchSettings {
    FetchSettings {
        user_agent: opts.user_agent.clone(),
        spoof: opts.spoof,
        header_timeout: opts.header_timeout(),
        response_timeout: opts.response_timeout(),
    }
}

async fn build_registry(opts: &ConfigOpts) -> anyhow::Result<Arc<ArchiveRegistry>> {
    let registry = ArchiveRegistry::load(&opts.archive_list, opts.failure_tolerance, opts.dormant_period())
        .await
        .context("failed to load archive list")?;
    Ok(Arc::new(registry))
}

fn base_urls(opts: &ConfigOpts) -> (String, String, String) {
    let base = opts
        .proxy_base
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", opts.host, opts.port));
    let root = opts.root.trim_end_matches('/');
    let map_base = format!("{base}{root}/timemap");
    let gate_base = format!("{base}{root}/timegate");
    let service_base = format!("{base}{root}");
    (map_base, gate_base, service_base)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = match Cli::command().try_get_matches() {
        Ok(m) => m,
        Err(e) => {
            eprint!("{e}");
            std::process::exit(1);
        }
    };
    let cli = Cli::from_arg_matches(&matches).context("invalid arguments")?;
    let opts = cli.opts.clone().with_file_overlay(&matches).context("invalid configuration file")?;

    if let Err(e) = init_tracing(&opts) {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }

    let result = run(cli, opts).await;
    if let Err(e) = result {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli, opts: ConfigOpts) -> anyhow::Result<()> {
    let registry = build_registry(&opts).await?;
    let client = build_client(opts.connect_timeout(), opts.idle_timeout())?;
    let settings = fetch_settings(&opts);
    let sink = benchmark_sink(&opts)?;
    let broker = opts.monitor.then(BenchmarkBroker::spawn);
    let tap = BenchmarkTap::new(sink, broker.clone());
    let (map_base, gate_base, service_base) = base_urls(&opts);

    match cli.command {
        Some(Command::Server) => {
            let state = AppState {
                client,
                registry,
                settings,
                top_k: opts.top_k,
                tap,
                map_base,
                gate_base,
                service_base,
                static_dir: opts.static_dir.clone(),
                broker,
            };
            serve(&opts.host, opts.port, state).await?;
        }
        None => {
            let Some(urir) = cli.urir.clone() else {
                eprintln!("usage: memgate [flags] URI-R | memgate [flags] URI-R DATETIME | memgate [flags] server");
                std::process::exit(1);
            };
            let urir = normalize_urir(&urir)?;
            let deps = SessionDeps {
                client: &client,
                registry: &registry,
                settings: &settings,
                top_k: opts.top_k,
                tap: &tap,
                map_base,
                gate_base,
            };

            match cli.datetime {
                None => match timemap(&deps, &urir, opts.format).await {
                    Ok(r) => print!("{}", r.chunks.concat()),
                    Err(MemgateError::SessionEmpty(_)) => {}
                    Err(e) => return Err(e.into()),
                },
                Some(raw_dt) => {
                    let dt = memgate::datetime::parse_padded_datetime(&raw_dt)?;
                    match timegate(&deps, &urir, dt, Disposition::Describe(opts.format)).await {
                        Ok(memgate::session::TimegateResult::Describe { chunks }) => print!("{}", chunks.concat()),
                        Ok(_) => unreachable!(),
                        Err(MemgateError::SessionEmpty(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
    }
    Ok(())
}
