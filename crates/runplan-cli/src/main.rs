mod config;
mod generate_cmd;
mod schedule_cmds;
mod serve_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use runplan_core::Orchestrator;
use runplan_db::{MemoryScheduleStore, PgScheduleStore, ScheduleStore, pool};

use config::{Backend, CliOverrides, RunplanConfig};

#[derive(Parser)]
#[command(name = "runplan", about = "LLM-generated running training schedules")]
struct Cli {
    /// Database URL (overrides RUNPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Model name (overrides RUNPLAN_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Generator backend (overrides `[generator] backend` in the config file)
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a runplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/runplan")]
        db_url: String,
        /// Gemini API key to store (otherwise read GEMINI_API_KEY at runtime)
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the runplan database (requires config file or env vars)
    DbInit,
    /// List training methods and their rules
    Methods,
    /// Print the prompt for a request file without calling the model
    Prompt {
        /// Path to the request JSON file
        file: PathBuf,
    },
    /// Generate a schedule from a request file
    Generate {
        /// Path to the request JSON file
        file: PathBuf,
        /// Write the schedule JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Do not store the schedule in the database
        #[arg(long)]
        no_store: bool,
    },
    /// Extract and repair a saved raw model reply
    Validate {
        /// Path to the reply text file
        file: PathBuf,
    },
    /// Show a stored schedule
    Show {
        /// Schedule ID
        id: String,
    },
    /// List stored schedules, newest first
    List {
        /// Maximum number of schedules to list
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Keep schedules in memory instead of PostgreSQL
        #[arg(long)]
        memory: bool,
    },
}

/// Execute the `runplan init` command: write config file.
fn cmd_init(
    db_url: &str,
    model: Option<&str>,
    backend: Backend,
    api_key: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: Some(db_url.to_string()),
            ..Default::default()
        },
        generator: config::GeneratorSection {
            backend,
            model: model.map(str::to_string),
            api_key,
            ..Default::default()
        },
        retry: config::RetrySection::default(),
    };

    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  generator.backend = {backend}");
    if let Some(model) = model {
        println!("  generator.model = {model}");
    }
    if has_key {
        println!("  generator.api_key = (set)");
    }
    println!();
    println!("Next: run `runplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `runplan db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &RunplanConfig) -> anyhow::Result<()> {
    println!("Initializing runplan database...");

    let name = resolved.db_config.database_name().unwrap_or("?");
    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("Created database {name}.");
    } else {
        println!("Database {name} already exists.");
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    let result = async {
        let migrations = pool::run_migrations(&db_pool).await?;
        let stats = pool::schedule_stats(&db_pool).await?;
        println!("Migrations applied: {migrations}");
        println!("Stored schedules: {}", stats.schedules);
        if let Some(newest) = stats.newest {
            println!("Newest schedule: {}", newest.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        anyhow::Ok(())
    }
    .await;

    db_pool.close().await;
    result?;

    println!("runplan db-init complete.");
    Ok(())
}

fn cli_overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        database_url: cli.database_url.clone(),
        model: cli.model.clone(),
        backend: cli.backend,
    }
}

fn build_orchestrator(resolved: &RunplanConfig) -> anyhow::Result<Orchestrator> {
    let generator = resolved.build_generator()?;
    Ok(Orchestrator::new(generator, resolved.orchestrator.clone()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = cli_overrides(&cli);

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            force,
        } => {
            let backend = cli.backend.unwrap_or_default();
            cmd_init(&db_url, cli.model.as_deref(), backend, api_key, force)?;
        }
        Commands::DbInit => {
            let resolved = RunplanConfig::resolve(&overrides)?;
            cmd_db_init(&resolved).await?;
        }
        Commands::Methods => {
            schedule_cmds::run_methods();
        }
        Commands::Prompt { file } => {
            schedule_cmds::run_prompt(&file)?;
        }
        Commands::Validate { file } => {
            schedule_cmds::run_validate(&file)?;
        }
        Commands::Generate {
            file,
            output,
            no_store,
        } => {
            let resolved = RunplanConfig::resolve(&overrides)?;
            let orchestrator = build_orchestrator(&resolved)?;
            if no_store {
                generate_cmd::run_generate(&orchestrator, None, &file, output.as_deref()).await?;
            } else {
                let db_pool = pool::create_pool(&resolved.db_config).await?;
                let store = PgScheduleStore::new(db_pool.clone());
                let result =
                    generate_cmd::run_generate(&orchestrator, Some(&store), &file, output.as_deref())
                        .await;
                db_pool.close().await;
                result?;
            }
        }
        Commands::Show { id } => {
            let resolved = RunplanConfig::resolve(&overrides)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgScheduleStore::new(db_pool.clone());
            let result = schedule_cmds::run_show(&store, &id).await;
            db_pool.close().await;
            result?;
        }
        Commands::List { limit } => {
            let resolved = RunplanConfig::resolve(&overrides)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgScheduleStore::new(db_pool.clone());
            let result = schedule_cmds::run_list(&store, limit).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port, memory } => {
            let resolved = RunplanConfig::resolve(&overrides)?;
            let orchestrator = Arc::new(build_orchestrator(&resolved)?);
            if memory {
                let state = serve_cmd::AppState {
                    orchestrator,
                    store: Arc::new(MemoryScheduleStore::new()),
                };
                serve_cmd::run_serve(state, &bind, port).await?;
            } else {
                let db_pool = pool::create_pool(&resolved.db_config)
                    .await
                    .context("failed to connect to database (use --memory to serve without one)")?;
                let store: Arc<dyn ScheduleStore> = Arc::new(PgScheduleStore::new(db_pool.clone()));
                let state = serve_cmd::AppState {
                    orchestrator,
                    store,
                };
                let result = serve_cmd::run_serve(state, &bind, port).await;
                db_pool.close().await;
                result?;
            }
        }
    }

    Ok(())
}
