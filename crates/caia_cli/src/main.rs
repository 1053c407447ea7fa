mod commands;
mod config;
mod helpers;
mod output;

use std::path::PathBuf;

use caia_db::LearnedMemoryKind;
use clap::{Parser, Subcommand};
use miette::Result;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::LoggingConfig;
use crate::output::Output;

#[derive(Parser)]
#[command(name = "caia")]
#[command(about = "CAIA memory and workfocus database tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Database file path (overrides config and CAIA_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Database inspection and maintenance
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Pack vendors
    Vendor {
        #[command(subcommand)]
        cmd: VendorCommands,
    },
    /// Memory packs
    Pack {
        #[command(subcommand)]
        cmd: PackCommands,
    },
    /// Tenants, installs and overrides
    Tenant {
        #[command(subcommand)]
        cmd: TenantCommands,
    },
    /// Learned memories
    Learned {
        #[command(subcommand)]
        cmd: LearnedCommands,
    },
    /// Scoped key/value memories
    Kv {
        #[command(subcommand)]
        cmd: KvCommands,
    },
    /// User accounts
    User {
        #[command(subcommand)]
        cmd: UserCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Show row counts
    Stats,
    /// Checkpoint the WAL and reclaim space
    Vacuum,
    /// Run integrity and foreign key checks
    Check,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Save the effective configuration to a file
    Save {
        /// Path to save configuration
        #[arg(default_value = "caia.toml")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum VendorCommands {
    /// Register a vendor
    Add {
        name: String,
        #[arg(long)]
        website: Option<String>,
    },
    /// List vendors
    List,
}

#[derive(Subcommand)]
enum PackCommands {
    /// Import a pack manifest (JSON)
    Import { file: PathBuf },
    /// Export a pack as a manifest
    Export {
        pack_id: String,
        /// Write to this file instead of stdout
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// List a vendor's packs
    List { vendor_id: String },
    /// List a pack's items
    Items {
        pack_id: String,
        /// Only items of this kind
        #[arg(long)]
        kind: Option<String>,
    },
    /// Store the pack's content digest as its signature
    Sign { pack_id: String },
    /// Check the pack's signature against its contents
    Verify { pack_id: String },
}

#[derive(Subcommand)]
enum TenantCommands {
    /// Register a tenant
    Add { name: String, brand_slug: String },
    /// List tenants
    List,
    /// Install a pack for a tenant
    Install { brand_slug: String, pack_id: String },
    /// Remove a pack from a tenant
    Uninstall { brand_slug: String, pack_id: String },
    /// Override a pack item's content for a tenant
    Override {
        brand_slug: String,
        item_id: String,
        /// Replacement content (omit with --clear)
        #[arg(required_unless_present = "clear")]
        content: Option<String>,
        /// Replacement tags, comma-separated
        #[arg(long)]
        tags: Option<String>,
        /// Remove the override instead
        #[arg(long, conflicts_with_all = ["content", "tags"])]
        clear: bool,
    },
    /// Show a tenant's items with overrides applied
    Resolve {
        brand_slug: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LearnedCommands {
    /// Record a learned memory
    Add {
        tenant: String,
        content: String,
        #[arg(long, default_value_t = LearnedMemoryKind::Fact)]
        kind: LearnedMemoryKind,
        #[arg(long, default_value_t = 0)]
        importance: i64,
        #[arg(long)]
        subject: Option<String>,
        /// Owning user ID
        #[arg(long)]
        user: Option<String>,
        /// Expire after this many days
        #[arg(long)]
        expires_in_days: Option<i64>,
    },
    /// List a tenant's memories, best ranked first
    List {
        tenant: String,
        #[arg(long)]
        kind: Option<LearnedMemoryKind>,
        #[arg(long)]
        min_importance: Option<i64>,
        /// Only memories containing this text
        #[arg(long)]
        contains: Option<String>,
        /// Include expired memories
        #[arg(long)]
        all: bool,
        #[arg(short = 'l', long)]
        limit: Option<i64>,
    },
    /// Mark a memory as just used
    Touch { id: String },
    /// Delete expired memories
    Prune,
    /// Keep only a tenant's best ranked memories
    Trim {
        tenant: String,
        #[arg(long)]
        keep: i64,
    },
}

#[derive(Subcommand)]
enum KvCommands {
    /// Print a value
    Get { scope: String, key: String },
    /// Store a value (JSON, or a plain string)
    Set {
        scope: String,
        key: String,
        value: String,
    },
    /// List a scope's keys and values
    List { scope: String },
    /// Delete a key, or the whole scope
    Delete { scope: String, key: Option<String> },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create or update a user
    Add {
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// List users
    List {
        #[arg(short = 'l', long)]
        limit: Option<i64>,
    },
}

/// Install the tracing subscriber.
///
/// Terminal output goes to stderr. When `logging.directory` is set, a
/// daily-rotated file gets debug-level logs too; the returned guard must
/// live until exit so buffered lines are flushed.
fn init_tracing(debug: bool, logging: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::{
        EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };

    let env_filter = if debug {
        EnvFilter::new("caia_db=debug,caia_cli=debug,sqlx=warn,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let terminal_layer = if debug {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .compact()
            .boxed()
    };

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "caia.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("caia_db=debug,caia_cli=debug,info"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(env_filter))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    let config = config::resolve(cli.config.as_deref(), cli.db_path.clone()).await?;
    let _log_guard = init_tracing(cli.debug, &config.logging);
    if let Some(dir) = &config.logging.directory {
        info!("Writing logs to {}", dir.join("caia.log").display());
    }
    debug!(db_path = %config.database.path.display(), "configuration resolved");

    let output = Output::new();

    // Config commands don't touch the database
    if let Commands::Config { cmd } = &cli.command {
        return match cmd {
            ConfigCommands::Show => commands::config::show(&config, &output).await,
            ConfigCommands::Save { path } => commands::config::save(&config, path, &output).await,
        };
    }

    let db = helpers::get_db(&config).await?;

    let result = match cli.command {
        Commands::Config { .. } => Ok(()),
        Commands::Db { cmd } => match cmd {
            DbCommands::Stats => commands::db::stats(&db, &config, &output).await,
            DbCommands::Vacuum => commands::db::vacuum(&db, &output).await,
            DbCommands::Check => commands::db::check(&db, &output).await,
        },
        Commands::Vendor { cmd } => match cmd {
            VendorCommands::Add { name, website } => {
                commands::vendor::add(&db, &name, website.as_deref(), &output).await
            }
            VendorCommands::List => commands::vendor::list(&db, &output).await,
        },
        Commands::Pack { cmd } => match cmd {
            PackCommands::Import { file } => commands::pack::import(&db, &file, &output).await,
            PackCommands::Export { pack_id, out } => {
                commands::pack::export(&db, &pack_id, out.as_deref(), &output).await
            }
            PackCommands::List { vendor_id } => {
                commands::pack::list(&db, &vendor_id, &output).await
            }
            PackCommands::Items { pack_id, kind } => {
                commands::pack::items(&db, &pack_id, kind.as_deref(), &output).await
            }
            PackCommands::Sign { pack_id } => commands::pack::sign(&db, &pack_id, &output).await,
            PackCommands::Verify { pack_id } => {
                commands::pack::verify(&db, &pack_id, &output).await
            }
        },
        Commands::Tenant { cmd } => match cmd {
            TenantCommands::Add { name, brand_slug } => {
                commands::tenant::add(&db, &name, &brand_slug, &output).await
            }
            TenantCommands::List => commands::tenant::list(&db, &output).await,
            TenantCommands::Install {
                brand_slug,
                pack_id,
            } => commands::tenant::install(&db, &brand_slug, &pack_id, &output).await,
            TenantCommands::Uninstall {
                brand_slug,
                pack_id,
            } => commands::tenant::uninstall(&db, &brand_slug, &pack_id, &output).await,
            TenantCommands::Override {
                brand_slug,
                item_id,
                clear: true,
                ..
            } => commands::tenant::clear_override(&db, &brand_slug, &item_id, &output).await,
            TenantCommands::Override {
                brand_slug,
                item_id,
                content,
                tags,
                clear: false,
            } => {
                let content = content.unwrap_or_default();
                commands::tenant::set_override(
                    &db,
                    &brand_slug,
                    &item_id,
                    &content,
                    tags.as_deref(),
                    &output,
                )
                .await
            }
            TenantCommands::Resolve { brand_slug, json } => {
                commands::tenant::resolve(&db, &brand_slug, json, &output).await
            }
        },
        Commands::Learned { cmd } => match cmd {
            LearnedCommands::Add {
                tenant,
                content,
                kind,
                importance,
                subject,
                user,
                expires_in_days,
            } => {
                let new = commands::learned::NewMemory {
                    tenant: &tenant,
                    content: &content,
                    kind,
                    importance,
                    subject: subject.as_deref(),
                    user_id: user.as_deref(),
                    expires_in_days,
                };
                commands::learned::add(&db, new, &output).await
            }
            LearnedCommands::List {
                tenant,
                kind,
                min_importance,
                contains,
                all,
                limit,
            } => {
                let filter =
                    commands::learned::filter(&tenant, kind, min_importance, contains, all, limit);
                commands::learned::list(&db, filter, &output).await
            }
            LearnedCommands::Touch { id } => commands::learned::touch(&db, &id, &output).await,
            LearnedCommands::Prune => commands::learned::prune(&db, &output).await,
            LearnedCommands::Trim { tenant, keep } => {
                commands::learned::trim(&db, &tenant, keep, &output).await
            }
        },
        Commands::Kv { cmd } => match cmd {
            KvCommands::Get { scope, key } => commands::kv::get(&db, &scope, &key, &output).await,
            KvCommands::Set { scope, key, value } => {
                commands::kv::set(&db, &scope, &key, &value, &output).await
            }
            KvCommands::List { scope } => commands::kv::list(&db, &scope, &output).await,
            KvCommands::Delete { scope, key } => {
                commands::kv::delete(&db, &scope, key.as_deref(), &output).await
            }
        },
        Commands::User { cmd } => match cmd {
            UserCommands::Add { email, name, role } => {
                commands::user::add(&db, &email, name.as_deref(), role.as_deref(), &output).await
            }
            UserCommands::List { limit } => commands::user::list(&db, limit, &output).await,
        },
    };

    db.close().await;
    result
}
