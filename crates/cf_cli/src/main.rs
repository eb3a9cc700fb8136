use anyhow::{Context, Result};
use cf_core::FeedStore;
use cf_feed::{FeedConfig, FilePreferenceStore, Theme, ThemePreference};
use cf_storage::{check_store, create_store, SQLiteStore, Seed, StorageKind};
use cf_web::ServerConfig;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod browse;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_millis = 0u64;
        let mut current_number = String::new();
        let mut chars = s.trim().chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let num = current_number
                .parse::<u64>()
                .map_err(|_| format!("Invalid character in duration: {}", c))?;
            let unit_millis = match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                's' => 1_000,
                'm' => 60_000,
                'h' => 3_600_000,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_millis += num * unit_millis;
            current_number.clear();
        }

        // bare number means seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_millis += num * 1_000;
        }

        if total_millis == 0 {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_millis(total_millis)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Swipeable article cards with linked concepts", long_about = None)]
struct Cli {
    /// Storage backend: memory, sqlite or rest
    #[arg(long, global = true, default_value = "memory", env = "CARDFEED_STORAGE")]
    storage: StorageKind,
    /// SQLite path, or project URL for the rest backend
    #[arg(long, global = true, env = "CARDFEED_BACKEND_URL")]
    backend_url: Option<String>,
    /// Public API key sent to the rest backend
    #[arg(long, global = true, env = "CARDFEED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Preferences file (defaults to the user config dir)
    #[arg(long, global = true, env = "CARDFEED_PREFS")]
    prefs: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the article and concept API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
        /// JSON seed document loaded into memory or sqlite stores
        #[arg(long)]
        seed: Option<PathBuf>,
        #[arg(long, default_value_t = 100)]
        max_limit: usize,
    },
    /// Browse the feed in the terminal, one card at a time
    Browse {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        api: String,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
        #[arg(long, default_value_t = 5)]
        batch_size: usize,
        /// Request timeout (e.g. 10s, 500ms, 1m)
        #[arg(long, default_value = "10s")]
        timeout: HumanDuration,
    },
    /// Show or change the stored theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    /// Load a JSON seed document into the sqlite store
    Seed {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ThemeAction {
    Get,
    Set { theme: Theme },
    Toggle,
}

async fn check_store_with_retry(
    store: &Arc<dyn FeedStore>,
    max_retries: u32,
    timeout: Duration,
) -> cf_core::Result<()> {
    let mut retries = 0;
    loop {
        match check_store(store, timeout).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                retries += 1;
                if retries >= max_retries {
                    return Err(e);
                }
                info!("Store health check failed ({}), retrying {}/{}...", e, retries, max_retries);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

fn theme_preference(prefs: Option<PathBuf>) -> Result<ThemePreference> {
    let path = match prefs {
        Some(path) => path,
        None => FilePreferenceStore::default_path()?,
    };
    Ok(ThemePreference::load(Arc::new(FilePreferenceStore::new(path))))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cf_core::logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Serve { bind, seed, max_limit } => {
            let seed = match seed {
                Some(path) => Some(
                    Seed::from_file(&path)
                        .await
                        .with_context(|| format!("reading seed {}", path.display()))?,
                ),
                None => None,
            };
            let store = create_store(cli.storage, cli.backend_url.as_deref(), cli.api_key, seed).await?;
            info!("💾 Checking store connection...");
            if let Err(e) = check_store_with_retry(&store, 3, Duration::from_secs(10)).await {
                error!("{}", cli.storage.get_error_message());
                return Err(e.into());
            }

            let config = ServerConfig {
                bind,
                max_limit,
                ..ServerConfig::default()
            };
            cf_web::serve(store, config).await?;
        }
        Commands::Browse { api, page_size, batch_size, timeout } => {
            let config = FeedConfig {
                initial_page_size: page_size,
                batch_size,
                request_timeout: timeout.0,
                ..FeedConfig::default()
            };
            let theme = theme_preference(cli.prefs)?;
            browse::run(&api, config, theme).await?;
        }
        Commands::Theme { action } => {
            let prefs = theme_preference(cli.prefs)?;
            let theme = match action.unwrap_or(ThemeAction::Get) {
                ThemeAction::Get => prefs.get(),
                ThemeAction::Set { theme } => {
                    prefs.set(theme)?;
                    theme
                }
                ThemeAction::Toggle => prefs.toggle()?,
            };
            println!("{}", theme);
        }
        Commands::Seed { file } => {
            if cli.storage != StorageKind::Sqlite {
                anyhow::bail!("seed only persists into the sqlite backend (use --storage sqlite)");
            }
            let seed = Seed::from_file(&file)
                .await
                .with_context(|| format!("reading seed {}", file.display()))?;
            let path = cli.backend_url.as_deref().unwrap_or(SQLiteStore::DEFAULT_PATH);
            let store = SQLiteStore::new_with_path(std::path::Path::new(path)).await?;
            store.load_seed(&seed).await?;
            info!(
                "🌱 Seeded {} articles and {} concepts into {}",
                seed.articles.len(),
                seed.concepts.len(),
                store.get_db_path().display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration() {
        assert_eq!("10s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(10));
        assert_eq!("1m30s".parse::<HumanDuration>().unwrap().0, Duration::from_secs(90));
        assert_eq!("250ms".parse::<HumanDuration>().unwrap().0, Duration::from_millis(250));
        assert_eq!("5".parse::<HumanDuration>().unwrap().0, Duration::from_secs(5));
        assert!("0s".parse::<HumanDuration>().is_err());
        assert!("10x".parse::<HumanDuration>().is_err());
        assert!("s".parse::<HumanDuration>().is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["cardfeed", "--storage", "sqlite", "serve", "--max-limit", "50"]).unwrap();
        assert_eq!(cli.storage, StorageKind::Sqlite);
        assert!(matches!(cli.command, Commands::Serve { max_limit: 50, .. }));

        let cli = Cli::try_parse_from(["cardfeed", "theme", "set", "dark"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Theme { action: Some(ThemeAction::Set { theme: Theme::Dark }) }
        ));

        assert!(Cli::try_parse_from(["cardfeed", "--storage", "qdrant", "serve"]).is_err());
    }

    #[tokio::test]
    async fn test_retry_returns_on_healthy_store() {
        let store = create_store(StorageKind::Memory, None, None, None).await.unwrap();
        check_store_with_retry(&store, 3, Duration::from_secs(1)).await.unwrap();
    }
}
