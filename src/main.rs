use std::fs;
use std::sync::Arc;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use funpass::auth::TokenGenerator;
use funpass::config::ServerConfig;
use funpass::notify::{LogNotifier, PriceFeed};
use funpass::server::{AppState, create_router};
use funpass::store::{SqliteStore, Store};
use funpass::types::{Employee, PassAllocations, Token};

fn create_token(
    generator: &TokenGenerator,
    is_admin: bool,
    employee_id: Option<String>,
) -> anyhow::Result<(Token, String)> {
    let (raw_token, lookup, hash) = generator.generate()?;
    let token = Token {
        id: Uuid::new_v4().to_string(),
        token_hash: hash,
        token_lookup: lookup,
        is_admin,
        employee_id,
        created_at: Utc::now(),
        expires_at: None,
        last_used_at: None,
    };
    Ok((token, raw_token))
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "funpass")]
#[command(about = "An amusement park ticketing server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database, seed prices, create admin token)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: data_dir.into(),
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = config.admin_token_path();

    if store.has_admin_token()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let generator = TokenGenerator::new();
    let (token, raw_token) = create_token(&generator, true, None)?;

    store.create_token(&token)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    if !non_interactive {
        create_first_employee_prompt(&store, &generator)?;
    }

    Ok(())
}

fn create_first_employee_prompt(
    store: &SqliteStore,
    generator: &TokenGenerator,
) -> anyhow::Result<()> {
    let create_employee = inquire::Confirm::new("Would you like to create a first employee?")
        .with_default(false)
        .prompt()?;

    if !create_employee {
        return Ok(());
    }

    let name = inquire::Text::new("Full name:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Err("Name cannot be empty".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    let username = inquire::Text::new("Username:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Err("Username cannot be empty".into())
            } else if input.contains(char::is_whitespace) {
                Err("Username cannot contain whitespace".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    use rand::Rng;
    let mut rng = rand::thread_rng();
    let employee_id = loop {
        let suffix: String = (0..5).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect();
        let candidate = format!("E{suffix}");
        if store.get_employee(&candidate)?.is_none() {
            break candidate;
        }
    };

    let employee = Employee {
        id: employee_id.clone(),
        name: name.trim().to_string(),
        username: username.clone(),
        allocations: PassAllocations::default(),
        created_at: Utc::now(),
    };
    store.create_employee(&employee)?;

    let (employee_token, raw_token) = create_token(generator, false, Some(employee_id.clone()))?;
    store.create_token(&employee_token)?;

    println!();
    println!("========================================");
    println!("Created employee '{username}' ({employee_id}) with token:");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Pass allocations start at zero; raise them via the admin API.");
    println!("========================================");
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("funpass=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            let token_file = config.admin_token_path();
            if !token_file.exists() {
                bail!(
                    "Server not initialized. Run 'funpass admin init' first to create the database and admin token."
                );
            }

            let store = SqliteStore::new(config.db_path())?;
            if !store.has_admin_token()? {
                bail!(
                    "Server not initialized. Run 'funpass admin init' first to create the database and admin token."
                );
            }

            info!("Admin token available at {}", token_file.display());

            let price_feed = PriceFeed::default();

            // Log price changes as they land so an operator can correlate
            // them with sales activity.
            let mut price_rx = price_feed.subscribe();
            tokio::spawn(async move {
                while let Ok(update) = price_rx.recv().await {
                    for price in &update.prices {
                        info!("price update: {} -> {:.2}", price.pass_type, price.price);
                    }
                }
            });

            let state = Arc::new(AppState {
                store: Arc::new(store),
                notifier: Arc::new(LogNotifier),
                price_feed,
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
