/// Ledger - local-first work order and expense ledger
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ledger_cli::{App, LedgerConfig};
use ledger_core::types::{CompanyInfo, Expense, WorkOrder};
use ledger_sync::{download_filename, ImportMode, ImportOutcome};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ledger")]
#[command(
    about = "Local-first work order and expense ledger with server backup",
    long_about = None
)]
struct Cli {
    /// Configuration file path (defaults to ./ledger.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials for commands acting on a user's data
#[derive(Args)]
struct Credentials {
    /// Username
    #[arg(short, long, env = "LEDGER_USER")]
    user: String,
    /// Password
    #[arg(short, long, env = "LEDGER_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new local account (mirrored on the sync server when configured)
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log in and pull the server backup
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Add a work order
    AddOrder {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        designation: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "Autre")]
        category: String,
        /// ISO date, e.g. 2024-03-01
        #[arg(long)]
        date: String,
    },
    /// Add an expense
    AddExpense {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        description: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "Autre")]
        category: String,
        #[arg(long)]
        date: String,
    },
    /// List work orders and expenses
    List {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Write a backup file, optionally pushing it to the server
    Export {
        #[command(flatten)]
        credentials: Credentials,
        /// Output path (defaults to OT_Backup_<month>-<year>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also push the snapshot to the sync server
        #[arg(long)]
        push: bool,
    },
    /// Import a backup file into the current user's data
    Import {
        #[command(flatten)]
        credentials: Credentials,
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = ModeArg::Merge)]
        mode: ModeArg,
    },
    /// Add records from a backup file whose identifiers are not present yet
    ImportData {
        #[command(flatten)]
        credentials: Credentials,
        file: PathBuf,
    },
    /// Restore a user's records, settings and account from a backup file
    ///
    /// The backup must belong to --user. An account already present locally
    /// must also pass its password check.
    Restore {
        #[command(flatten)]
        credentials: Credentials,
        file: PathBuf,
    },
    /// Delete every record and setting of the user
    Clear {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Set the company profile
    CompanyInfo {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        siret: String,
        #[arg(long, default_value = "")]
        tva: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Replace the current user's records
    Merge,
    /// Restore everything for the file's user
    Restore,
}

impl From<ModeArg> for ImportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Merge => ImportMode::Merge,
            ModeArg::Restore => ImportMode::CompleteRestore,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = LedgerConfig::load_from(cli.config.as_deref())?;
    config.validate()?;

    let app = App::open(&config).await?;
    let result = run(&app, cli.command).await;
    app.shutdown().await?;

    result
}

async fn sign_in(app: &App, credentials: &Credentials) -> anyhow::Result<()> {
    let outcome = app
        .engine
        .login(&credentials.user, &credentials.password)
        .await
        .with_context(|| format!("login failed for {}", credentials.user))?;
    tracing::debug!(username = %outcome.user.username, pull = ?outcome.pull, "Signed in");
    Ok(())
}

async fn read_file(path: &PathBuf) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let user = app.engine.register(&username, &email, &password).await?;
            println!("Registered {} <{}>", user.username, user.email);
        }
        Commands::Login { credentials } => {
            let outcome = app
                .engine
                .login(&credentials.user, &credentials.password)
                .await?;
            println!("Logged in as {} ({:?})", outcome.user.username, outcome.pull);
        }
        Commands::AddOrder {
            credentials,
            designation,
            amount,
            category,
            date,
        } => {
            sign_in(app, &credentials).await?;
            let order = app
                .engine
                .add(WorkOrder::new(designation, amount, category, date))
                .await?;
            println!("Added work order #{}", order.id.unwrap_or_default());
        }
        Commands::AddExpense {
            credentials,
            description,
            amount,
            category,
            date,
        } => {
            sign_in(app, &credentials).await?;
            let expense = app
                .engine
                .add(Expense::new(description, amount, category, date))
                .await?;
            println!("Added expense #{}", expense.id.unwrap_or_default());
        }
        Commands::List { credentials } => {
            sign_in(app, &credentials).await?;
            let orders = app.engine.list::<WorkOrder>().await?;
            let expenses = app.engine.list::<Expense>().await?;

            println!("Work orders:");
            for order in &orders {
                println!(
                    "  #{:<5} {}  {:>10.2}  {}  {}",
                    order.id.unwrap_or_default(),
                    order.date,
                    order.amount,
                    order.category,
                    order.designation
                );
            }
            println!("Expenses:");
            for expense in &expenses {
                println!(
                    "  #{:<5} {}  {:>10.2}  {}  {}",
                    expense.id.unwrap_or_default(),
                    expense.date,
                    expense.amount,
                    expense.category,
                    expense.description
                );
            }
        }
        Commands::Export {
            credentials,
            output,
            push,
        } => {
            sign_in(app, &credentials).await?;
            let json = app.backup.export_json(&credentials.user).await?;
            let output = output.unwrap_or_else(|| {
                PathBuf::from(download_filename(chrono::Local::now().date_naive()))
            });
            tokio::fs::write(&output, json)
                .await
                .with_context(|| format!("cannot write {}", output.display()))?;
            println!("Backup written to {}", output.display());

            if push {
                app.engine.export_user_data().await?;
                println!("Backup pushed to the sync server");
            }
        }
        Commands::Import {
            credentials,
            file,
            mode,
        } => {
            let contents = read_file(&file).await?;
            match mode {
                ModeArg::Merge => sign_in(app, &credentials).await?,
                ModeArg::Restore => {
                    app.authorize_restore(&credentials.user, &credentials.password, &contents)
                        .await?;
                }
            }
            match app.backup.import_snapshot(&contents, mode.into()).await? {
                ImportOutcome::Merged(report) => println!(
                    "Imported {} work orders and {} expenses{}",
                    report.orders,
                    report.expenses,
                    if report.legacy { " (legacy file)" } else { "" }
                ),
                ImportOutcome::Restored(report) => print_restore(&report),
            }
        }
        Commands::ImportData { credentials, file } => {
            let contents = read_file(&file).await?;
            sign_in(app, &credentials).await?;
            let report = app.backup.import_data(&contents).await?;
            println!(
                "Imported {} work orders and {} expenses, skipped {} already present",
                report.imported_orders, report.imported_expenses, report.skipped
            );
        }
        Commands::Restore { credentials, file } => {
            let contents = read_file(&file).await?;
            app.authorize_restore(&credentials.user, &credentials.password, &contents)
                .await?;
            let report = app.engine.import_complete_user_data(&contents).await?;
            print_restore(&report);
        }
        Commands::Clear { credentials } => {
            sign_in(app, &credentials).await?;
            let report = app.backup.clear_all_owned_data(&credentials.user).await?;
            println!(
                "Deleted {} work orders, {} expenses and {} settings",
                report.orders, report.expenses, report.settings
            );
        }
        Commands::CompanyInfo {
            credentials,
            name,
            address,
            phone,
            email,
            siret,
            tva,
        } => {
            sign_in(app, &credentials).await?;
            let info = CompanyInfo {
                name,
                address,
                phone,
                email,
                siret,
                tva,
            };
            app.engine.save_company_info(&info).await?;
            println!("Company profile saved");
        }
    }

    Ok(())
}

fn print_restore(report: &ledger_sync::RestoreReport) {
    println!(
        "Restored {} work orders and {} expenses for {}",
        report.imported_orders, report.imported_expenses, report.username
    );
    match &report.remote_error {
        None if report.remote_synced => println!("Restore pushed to the sync server"),
        Some(error) => println!("Restore kept locally, server sync failed: {error}"),
        None => {}
    }
}
