use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use lockbench::bench::{LoadGenerator, Target, compare, summarize};
use lockbench::config::Config;
use lockbench::handler::{self, Strategy};
use lockbench::logging::{LogFormat, init_logging};
use lockbench::server::{self, ServerHandle};
use lockbench::ui;

#[derive(Parser)]
#[command(name = "lockbench")]
#[command(about = "Compare held-lock, minimal-lock and lock-free shared state under HTTP load")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one strategy
    Serve {
        /// held-lock, minimal-lock or lock-free
        #[arg(short, long)]
        strategy: Strategy,

        /// Port to listen on (defaults to the strategy's configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind
        #[arg(long)]
        host: Option<std::net::IpAddr>,
    },
    /// Serve all three strategies, each on its own port
    ServeAll {
        /// Host to bind
        #[arg(long)]
        host: Option<std::net::IpAddr>,
    },
    /// Load one endpoint and print latency and throughput
    Bench {
        /// Target URL
        #[arg(default_value = "http://127.0.0.1:8081/process")]
        url: String,

        /// Number of concurrent workers
        #[arg(short, long, default_value = "10")]
        concurrency: usize,

        /// Total requests, split evenly across workers
        #[arg(short = 'n', long)]
        requests: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Benchmark all three running servers at several concurrency levels
    Compare {
        /// Comma-separated concurrency levels
        #[arg(long, value_delimiter = ',')]
        levels: Option<Vec<usize>>,

        /// Requests per level and strategy
        #[arg(short = 'n', long)]
        requests: Option<usize>,

        /// Host the servers listen on
        #[arg(long)]
        host: Option<std::net::IpAddr>,

        /// Print the rows as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, "info");

    if let Err(e) = run(cli).await {
        ui::print_error_box("lockbench failed", Some(format!("{e:#}").as_str()));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            strategy,
            port,
            host,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            let addr = SocketAddr::new(
                config.server.host,
                port.unwrap_or_else(|| config.server.port(strategy)),
            );
            let handler = handler::build(strategy, config.workload.workload());
            let listener = server::bind(addr).await?;
            server::serve(listener, handler, shutdown_signal()).await?;
        },
        Commands::ServeAll { host } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            let workload = config.workload.workload();
            let mut servers = Vec::with_capacity(Strategy::ALL.len());
            for strategy in Strategy::ALL {
                let handler = handler::build(strategy, workload);
                let server = ServerHandle::spawn(config.server.addr(strategy), handler)
                    .await
                    .with_context(|| format!("Failed to start {strategy} server"))?;
                info!(%strategy, url = %server.process_url(), "endpoint ready");
                servers.push(server);
            }

            shutdown_signal().await;
            for server in servers {
                server.shutdown().await?;
            }
        },
        Commands::Bench {
            url,
            concurrency,
            requests,
            json,
        } => {
            let requests = requests.unwrap_or(config.bench.requests);
            let generator = LoadGenerator::with_timeout(config.bench.timeout())?;

            if !json {
                println!("{}", ui::render_run_header(&url, concurrency, requests));
            }
            let run = generator.run(&url, concurrency, requests).await?;
            let result = summarize(&run);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", ui::render_result(&result));
                println!("{}", ui::render_summary_line(&result));
            }
        },
        Commands::Compare {
            levels,
            requests,
            host,
            json,
        } => {
            if let Some(levels) = levels {
                config.bench.levels = levels;
            }
            if let Some(requests) = requests {
                config.bench.requests = requests;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            config.validate()?;

            let targets: Vec<Target> = Strategy::ALL
                .iter()
                .map(|&s| Target::new(s, config.server.process_url(s)))
                .collect();
            let generator = LoadGenerator::with_timeout(config.bench.timeout())?;
            let rows = compare(
                &generator,
                &targets,
                &config.bench.levels,
                config.bench.requests,
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{}", ui::render_comparison(&rows));
            }
        },
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
