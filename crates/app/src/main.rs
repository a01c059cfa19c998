use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use proctor_core::model::{LinkId, TabScope};
use services::{Clock, HttpSessionApi, InMemorySessionApi, ServiceConfig, SessionApi};
use storage::repository::RecoveryStore;
use storage::sqlite::SqliteRepository;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ui::{App, UiApp, build_app_context};

const DEMO_LINK: &str = "demo";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTab { raw: String },
    InvalidLink { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTab { raw } => write!(f, "invalid --tab value: {raw}"),
            ArgsError::InvalidLink { raw } => write!(f, "invalid --link value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    initial_link: Option<LinkId>,
    api: Arc<dyn SessionApi>,
    recovery: Arc<dyn RecoveryStore>,
    clock: Clock,
}

impl UiApp for DesktopApp {
    fn initial_link(&self) -> Option<LinkId> {
        self.initial_link.clone()
    }

    fn session_api(&self) -> Arc<dyn SessionApi> {
        Arc::clone(&self.api)
    }

    fn recovery(&self) -> Arc<dyn RecoveryStore> {
        Arc::clone(&self.recovery)
    }

    fn clock(&self) -> Clock {
        self.clock
    }
}

struct Args {
    db_url: String,
    tab: Option<TabScope>,
    link: Option<LinkId>,
    demo: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--tab <uuid>] [--link <id-or-url>] [--demo]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://proctor.sqlite3");
    eprintln!("  --tab a fresh scope (pass a previous one to resume after a restart)");
    eprintln!("  --demo opens the built-in `demo` link without contacting a server");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PROCTOR_DB_URL, PROCTOR_API_URL, PROCTOR_HTTP_TIMEOUT_SECS, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("PROCTOR_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://proctor.sqlite3".into(), normalize_sqlite_url);
        let mut tab = None;
        let mut link = None;
        let mut demo = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--tab" => {
                    let value = require_value(args, "--tab")?;
                    let parsed: TabScope = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTab { raw: value.clone() })?;
                    tab = Some(parsed);
                }
                "--link" => {
                    let value = require_value(args, "--link")?;
                    let parsed = LinkId::from_link_or_id(&value)
                        .map_err(|_| ArgsError::InvalidLink { raw: value.clone() })?;
                    link = Some(parsed);
                }
                "--demo" => demo = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            tab,
            link,
            demo,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let (scope, resumed) = match parsed.tab {
        Some(scope) => (scope, true),
        None => (TabScope::generate(), false),
    };
    let repo = SqliteRepository::connect(&parsed.db_url, scope).await?;
    repo.migrate().await?;
    if !resumed {
        let discarded = repo.discard_other_scopes().await?;
        if discarded > 0 {
            info!(discarded, "dropped progress left by other windows");
        }
    }
    info!(tab = %scope, resumed, "recovery store ready; pass --tab {scope} to resume this window");

    let api: Arc<dyn SessionApi> = if parsed.demo {
        info!("using the built-in demo service");
        Arc::new(InMemorySessionApi::demo())
    } else {
        let config = ServiceConfig::from_env()?;
        info!(base_url = %config.base_url, "using the remote assessment service");
        Arc::new(HttpSessionApi::new(config)?)
    };
    let initial_link = parsed.link.or_else(|| {
        parsed
            .demo
            .then(|| LinkId::new(DEMO_LINK).ok())
            .flatten()
    });

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        initial_link,
        api,
        recovery: Arc::new(repo),
        clock: Clock::default_clock(),
    });
    let context = build_app_context(&app);

    // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
    // Explicitly disable it so the app doesn't behave like a modal window.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Online Assessment")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
