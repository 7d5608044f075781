use anyhow::Context;
use campusdesk::cli::create_admin;
use campusdesk::cli::seeder::{SeedCounts, clear_seeded_data, seed_database};
use campusdesk::campusdesk_config::ServerConfig;
use campusdesk::utils::expiry::purge_expired;
use campusdesk_db::{PgPool, init_db_pool};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "campusdesk-cli")]
#[command(about = "Campusdesk CLI - administrative tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Full name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed departments, faculty and students with fake data
    Seed {
        #[arg(short = 'd', long, default_value = "4")]
        departments: usize,

        #[arg(short = 'f', long, default_value = "10")]
        faculty: usize,

        #[arg(short = 's', long, default_value = "100")]
        students: usize,
    },
    /// Remove seeded users and departments (admins are kept)
    ClearSeed,
    /// Delete expired notices and exams now
    PurgeExpired,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("\n❌ {e:#}");
        std::process::exit(1);
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let pool = connect().await?;

    match command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(&pool, name, email, password).await,
        Commands::Seed {
            departments,
            faculty,
            students,
        } => {
            let counts = SeedCounts {
                departments,
                faculty,
                students,
            };
            seed_database(&pool, counts).await
        }
        Commands::ClearSeed => clear_seeded_data(&pool).await,
        Commands::PurgeExpired => {
            let retention = ServerConfig::from_env().exam_retention_days;
            let report = purge_expired(&pool, retention).await?;
            println!(
                "✅ Purged {} notices and {} exams",
                report.notices, report.exams
            );
            Ok(())
        }
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("Full name").interact_text()?,
    };

    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let admin = create_admin(pool, &name, &email, &password).await?;
    println!("\n✅ Admin created successfully!");
    println!("   Email: {}", admin.email);
    println!("   Name: {}", admin.name);
    Ok(())
}
