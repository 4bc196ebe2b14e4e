use anyhow::{anyhow, Result};
use clap::Parser;
use crossbeam::channel::{self, Receiver};
use follow_rank::cache::{Cache, DiskCache, MemoryCache};
use follow_rank::config::{Config, RankingParameters, MAX_FANOUT_LIMIT};
use follow_rank::data::load_follow_snapshot;
use follow_rank::directory::{FollowsFetcher, Profile, ProfileDirectory, ProfileFetcher};
use follow_rank::rank::RankSolver;
use follow_rank::ranking::{Phase, RankingCreator, StatusHandle};
use follow_rank::report::{write_ranking, OutputFormat};
use std::io::Write;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(
    name = "follow-rank",
    about = "Recommends accounts relevant to you or to a group of accounts"
)]
struct Cli {
    /// Path to the follow links Parquet file
    #[clap(long)]
    links: String,

    /// Path to a Parquet file with account profiles (Fid, Username, DisplayName)
    #[clap(long)]
    profiles: Option<String>,

    /// Your account id or handle
    #[clap(long)]
    me: String,

    /// Comma separated ids or handles to recommend relative to (defaults to you)
    #[clap(long, short, value_delimiter = ',')]
    start: Vec<String>,

    /// Maximum number of recommended accounts
    #[clap(long, short, default_value = "100", value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,

    /// Maximum number of accounts expanded per level; larger is slower and more precise
    #[clap(long, short, default_value = "100", value_parser = clap::value_parser!(u32).range(1..=MAX_FANOUT_LIMIT as i64))]
    max_accounts_per_level: u32,

    /// Include accounts you already follow
    #[clap(long, short)]
    include_your_follows: bool,

    /// Directory of the on-disk cache
    #[clap(long, default_value = ".cache")]
    cache_dir: String,

    /// Keep fetched data in memory only
    #[clap(long)]
    no_cache: bool,

    /// Print results as JSON
    #[clap(long)]
    json: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = Config::with_cache_dir(&args.cache_dir);
    let directory = load_follow_snapshot(&args.links, args.profiles.as_deref())?;

    let (profile_cache, follows_cache) = open_caches(&config, args.no_cache)?;
    let profiles = ProfileFetcher::new(&directory, profile_cache, &config);
    let follows = FollowsFetcher::new(&directory, follows_cache, &config);

    let me = profiles
        .resolve_profiles(&[args.me.clone()])?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Can't find your account: {}", args.me))?;
    log::info!("Ranking for {} ({})", me.handle, me.id);

    let seeds = if args.start.iter().all(|s| s.is_empty()) {
        vec![args.me.clone()]
    } else {
        args.start.iter().filter(|s| !s.is_empty()).cloned().collect()
    };

    let params = RankingParameters::new(
        me.id,
        seeds,
        args.limit as usize,
        args.max_accounts_per_level as usize,
        args.include_your_follows,
        args.verbose,
    )?;

    let creator =
        RankingCreator::new(&profiles, &follows).with_solver(RankSolver::from_config(&config)?);
    let status = creator.status();
    let show_progress = !args.verbose;

    let ranked = crossbeam::scope(|s| {
        let (done_tx, done_rx) = channel::bounded::<()>(0);
        if show_progress {
            s.spawn(move |_| poll_progress(status, done_rx));
        }
        let result = creator.create(&params);
        drop(done_tx);
        result
    })
    .map_err(|_| anyhow!("progress reporter panicked"))??;

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_ranking(&ranked, format, &mut out)?;
    out.flush()?;

    Ok(())
}

type Caches = (Box<dyn Cache<Profile>>, Box<dyn Cache<Vec<Profile>>>);

fn open_caches(config: &Config, in_memory: bool) -> Result<Caches> {
    if in_memory {
        let profile_cache: Box<dyn Cache<Profile>> = Box::new(MemoryCache::<Profile>::new());
        let follows_cache: Box<dyn Cache<Vec<Profile>>> =
            Box::new(MemoryCache::<Vec<Profile>>::new());
        return Ok((profile_cache, follows_cache));
    }

    let profile_cache: Box<dyn Cache<Profile>> = Box::new(DiskCache::<Profile>::open(
        config.cache_dir.join("profile"),
        config.cache_version.as_str(),
        config.cache_ttl,
    )?);
    let follows_cache: Box<dyn Cache<Vec<Profile>>> = Box::new(DiskCache::<Vec<Profile>>::open(
        config.cache_dir.join("follows"),
        config.cache_version.as_str(),
        config.cache_ttl,
    )?);
    Ok((profile_cache, follows_cache))
}

/// Redraw the progress line once per second until the run completes
fn poll_progress(status: StatusHandle, done: Receiver<()>) {
    let ticker = channel::tick(Duration::from_secs(1));
    loop {
        let current = status.snapshot();
        eprint!("\rprocessing... {:>3.0}%", current.percent_complete());
        if current.phase == Phase::Completed {
            break;
        }
        crossbeam::select! {
            recv(ticker) -> _ => {}
            recv(done) -> _ => break,
        }
    }
    eprintln!("\rprocessing... {:>3.0}%", status.percent_complete());
}
