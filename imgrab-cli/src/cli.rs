use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use imgrab_engine::worker::parse_header;
use imgrab_engine::{
    ExecutionStrategy, FetchConfig, FetchConfigBuilder, HeaderName, HeaderValue, ProxyConfig,
    ProxyType,
};

/// Download images from URLs using threads, processes or async I/O.
#[derive(Parser, Debug)]
#[command(name = "imgrab", author, version, about, long_about = None)]
#[command(subcommand_negates_reqs = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// List of URLs to download images from
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Concurrency strategy
    #[arg(
        short,
        long,
        value_enum,
        visible_alias = "async",
        default_value_t = StrategyArg::Thread,
        env = "IMGRAB_STRATEGY"
    )]
    pub strategy: StrategyArg,

    /// Directory to write files into
    #[arg(short, long, default_value = ".", env = "IMGRAB_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Maximum number of downloads in flight (defaults to one per URL)
    #[arg(short, long, env = "IMGRAB_WORKERS", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    #[command(flatten)]
    pub http: HttpArgs,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Request options shared by the main command and worker processes.
#[derive(clap::Args, Debug, Clone)]
pub struct HttpArgs {
    /// Per-request timeout in seconds (0 disables)
    #[arg(short, long, default_value_t = 30, env = "IMGRAB_TIMEOUT")]
    pub timeout: u64,

    /// Connection timeout in seconds (0 disables)
    #[arg(long, default_value_t = 10, env = "IMGRAB_CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// User agent to send
    #[arg(long, env = "IMGRAB_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Extra request header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    pub headers: Vec<(HeaderName, HeaderValue)>,

    /// Write the body of non-2xx responses instead of failing the download
    #[arg(long, env = "IMGRAB_KEEP_ERROR_BODIES")]
    pub keep_error_bodies: bool,

    /// Do not follow redirects
    #[arg(long)]
    pub no_redirects: bool,

    /// Proxy server URL
    #[arg(long, env = "IMGRAB_PROXY")]
    pub proxy: Option<String>,

    /// Proxy type
    #[arg(long, value_enum, default_value_t = ProxyType::Http, requires = "proxy")]
    pub proxy_type: ProxyType,
}

impl HttpArgs {
    fn apply(&self, config: FetchConfig, timeout: Duration, connect: Duration) -> FetchConfig {
        let mut builder = FetchConfigBuilder::from(config)
            .timeout(timeout)
            .connect_timeout(connect)
            .accept_error_status(self.keep_error_bodies)
            .follow_redirects(!self.no_redirects)
            .proxy(self.proxy.as_ref().map(|url| ProxyConfig {
                url: url.clone(),
                proxy_type: self.proxy_type,
            }));

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder.headers(self.headers.iter().cloned()).build()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single URL and report the outcome as JSON (used by the process strategy)
    #[command(name = "__worker", hide = true)]
    Worker(WorkerArgs),
}

#[derive(clap::Args, Debug)]
pub struct WorkerArgs {
    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    #[arg(long, default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    #[command(flatten)]
    pub http: WorkerHttpArgs,

    pub url: String,
}

/// Worker-side request options; timeouts arrive in milliseconds.
#[derive(clap::Args, Debug)]
pub struct WorkerHttpArgs {
    #[arg(long)]
    pub user_agent: Option<String>,

    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(HeaderName, HeaderValue)>,

    #[arg(long)]
    pub keep_error_bodies: bool,

    #[arg(long)]
    pub no_redirects: bool,

    #[arg(long)]
    pub proxy: Option<String>,

    #[arg(long, value_enum, default_value_t = ProxyType::Http)]
    pub proxy_type: ProxyType,
}

impl From<&WorkerHttpArgs> for HttpArgs {
    fn from(args: &WorkerHttpArgs) -> Self {
        Self {
            timeout: 0,
            connect_timeout: 0,
            user_agent: args.user_agent.clone(),
            headers: args.headers.clone(),
            keep_error_bodies: args.keep_error_bodies,
            no_redirects: args.no_redirects,
            proxy: args.proxy.clone(),
            proxy_type: args.proxy_type,
        }
    }
}

/// Strategy selector; `all` runs the batch once per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Thread,
    Process,
    Async,
    All,
}

impl StrategyArg {
    pub fn strategies(self) -> Vec<ExecutionStrategy> {
        match self {
            StrategyArg::Thread => vec![ExecutionStrategy::Thread],
            StrategyArg::Process => vec![ExecutionStrategy::Process],
            StrategyArg::Async => vec![ExecutionStrategy::Async],
            StrategyArg::All => ExecutionStrategy::ALL.to_vec(),
        }
    }
}

impl Args {
    pub fn fetch_config(&self) -> FetchConfig {
        let base = FetchConfig::builder()
            .output_dir(self.output_dir.clone())
            .max_workers(self.workers.map(usize::from))
            .build();
        self.http.apply(
            base,
            Duration::from_secs(self.http.timeout),
            Duration::from_secs(self.http.connect_timeout),
        )
    }
}

impl WorkerArgs {
    pub fn fetch_config(&self) -> FetchConfig {
        let base = FetchConfig::builder()
            .output_dir(self.output_dir.clone())
            .build();
        HttpArgs::from(&self.http).apply(
            base,
            Duration::from_millis(self.timeout_ms),
            Duration::from_millis(self.connect_timeout_ms),
        )
    }
}
