use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use learnhub_cli::admin::{NewAdmin, create_admin};
use learnhub_cli::backfill::backfill_student_ids;
use learnhub_cli::seeder::{self, SeedConfig};
use learnhub_config::{AppConfig, DatabaseConfig};
use learnhub_core::SystemIdGenerator;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "learnhub-cli")]
#[command(about = "LearnHub CLI - administrative tools for LearnHub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Prompted for when omitted
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake users, schools, families, groups and enrollments
    Seed {
        #[arg(long, default_value = "5")]
        teachers: usize,

        #[arg(long, default_value = "30")]
        students: usize,

        #[arg(short = 's', long, default_value = "3")]
        schools: usize,

        #[arg(long, default_value = "20")]
        students_per_school: usize,

        #[arg(long, default_value = "10")]
        families: usize,

        #[arg(long, default_value = "3")]
        members_per_family: usize,

        #[arg(long, default_value = "4")]
        groups: usize,
    },
    /// Issue student system ids to student accounts that lack one
    BackfillStudentIds,
    /// Delete all seeded data
    ClearSeed,
}

fn prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Input::new()
            .with_prompt(label)
            .interact_text()
            .with_context(|| format!("Failed to read {}", label.to_lowercase())),
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut db_config =
        DatabaseConfig::from_env().ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
    db_config.max_connections = db_config.max_connections.min(5);
    let pool = learnhub_db::init_db_pool(&db_config)
        .await
        .context("Failed to connect to database")?;
    let generator = SystemIdGenerator::new(AppConfig::from_env().system_id_max_attempts);

    match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            teachers,
            students,
            schools,
            students_per_school,
            families,
            members_per_family,
            groups,
        } => {
            let config = SeedConfig {
                teachers,
                students,
                schools,
                students_per_school,
                families,
                members_per_family,
                groups,
            };
            seeder::seed_all(&pool, &generator, config).await
        }
        Commands::BackfillStudentIds => {
            let issued = backfill_student_ids(&pool, &generator).await?;
            println!("✅ Backfilled {} student ids", issued);
            Ok(())
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await,
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let first_name = prompt(first_name, "First name")?;
    let last_name = prompt(last_name, "Last name")?;
    let email = prompt(email, "Email address")?;
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .context("Failed to read password")?,
    };

    let admin = NewAdmin {
        first_name,
        last_name,
        email,
        password,
    };
    create_admin(pool, &admin).await?;

    println!("\n✅ Admin created successfully!");
    println!("   Email: {}", admin.email);
    println!("   Name: {} {}", admin.first_name, admin.last_name);
    Ok(())
}
