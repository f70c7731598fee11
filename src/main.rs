use clap::{Parser, Subcommand};
use community_leaderboard::leaderboard::{self, SortKey};
use community_leaderboard::{Config, Result, storage};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Collect community posts and build the per-author leaderboard
#[derive(Parser)]
#[command(name = "community-leaderboard", version)]
#[command(about = "Collect community posts and build the per-author leaderboard", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through the community, fetch linked posts, write both JSON files
    Collect {
        /// JSON config file; every field is optional
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the posts output path
        #[arg(long)]
        posts: Option<PathBuf>,

        /// Override the leaderboard output path
        #[arg(long)]
        leaderboard: Option<PathBuf>,
    },
    /// Print a ranked leaderboard from a posts file
    Report {
        /// Posts file written by `collect`
        #[arg(long, default_value = "all_tweets.json")]
        posts: PathBuf,

        /// Rank a leaderboard file written by `collect` instead of the posts
        #[arg(long, conflicts_with = "days")]
        leaderboard: Option<PathBuf>,

        /// Only count posts from the last N days
        #[arg(long)]
        days: Option<u32>,

        /// Ranking column: posts, likes, retweets, comments, quotes or views
        #[arg(long, default_value_t = SortKey::Views)]
        sort: SortKey,

        /// Rank ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// Number of rows to print (0 for all)
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Only show handles containing this text
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "community_leaderboard=debug"
    } else {
        "community_leaderboard=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Collect {
            config,
            posts,
            leaderboard,
        } => collect(config.as_deref(), posts, leaderboard).await,
        Commands::Report {
            posts,
            leaderboard,
            days,
            sort,
            asc,
            limit,
            search,
        } => {
            let source = match leaderboard {
                Some(path) => Source::Leaderboard(path),
                None => Source::Posts { path: posts, days },
            };
            report(source, sort, asc, limit, search.as_deref()).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn collect(
    config_path: Option<&Path>,
    posts: Option<PathBuf>,
    leaderboard: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env();
    if let Some(path) = posts {
        config.output.posts_path = path;
    }
    if let Some(path) = leaderboard {
        config.output.leaderboard_path = path;
    }

    let summary = community_leaderboard::run(&config).await?;
    info!(
        community = summary.community_posts,
        linked = summary.linked_posts,
        merged = summary.merged_posts,
        authors = summary.authors,
        end = ?summary.end,
        "Run complete"
    );
    Ok(())
}

/// Where `report` reads its numbers from
enum Source {
    Posts { path: PathBuf, days: Option<u32> },
    Leaderboard(PathBuf),
}

async fn report(
    source: Source,
    sort: SortKey,
    ascending: bool,
    limit: usize,
    search: Option<&str>,
) -> Result<()> {
    let mut board = match source {
        Source::Leaderboard(path) => storage::load_leaderboard(&path).await?,
        Source::Posts { path, days } => {
            let posts = storage::load_posts(&path).await?;
            match days {
                Some(days) => leaderboard::aggregate(leaderboard::within_days(
                    &posts,
                    chrono::Utc::now(),
                    days,
                )),
                None => leaderboard::aggregate(&posts),
            }
        }
    };
    leaderboard::rank(&mut board, sort, ascending);

    let totals = leaderboard::totals(&board);
    println!(
        "Posts: {}  Users: {}  Views: {}",
        totals.posts, totals.users, totals.views
    );

    if let Some(needle) = search {
        let needle = needle.to_lowercase();
        board.retain(|(handle, _)| handle.to_lowercase().contains(&needle));
    }
    let shown = if limit == 0 { board.len() } else { limit };

    println!(
        "{:>4}  {:<24} {:>6} {:>8} {:>8} {:>8} {:>6} {:>10}  avatar",
        "#", "handle", "posts", "likes", "retweets", "comments", "quotes", "views"
    );
    for (position, (handle, entry)) in board.iter().take(shown).enumerate() {
        let avatar = entry
            .avatar_url
            .as_deref()
            .map(leaderboard::full_size_avatar)
            .unwrap_or_default();
        println!(
            "{:>4}  {:<24} {:>6} {:>8} {:>8} {:>8} {:>6} {:>10}  {}",
            position + 1,
            format!("@{handle}"),
            entry.posts,
            entry.likes,
            entry.reposts,
            entry.comments,
            entry.quotes,
            entry.views,
            avatar
        );
    }
    Ok(())
}
