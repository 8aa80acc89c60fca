use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::auth::digest_password;
use crate::database::manager::DatabaseManager;
use crate::database::users;

const SCHEMA: &str = include_str!("../../schema.sql");

#[derive(Parser)]
#[command(name = "desk", about = "Support Desk API management CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply schema.sql to the configured database
    Init,
    /// Create a superuser account (staff + superuser + support flags)
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                std::env::set_var("DESK_API_PORT", port.to_string());
            }
            crate::app::serve().await;
            Ok(())
        }
        Commands::Init => {
            let pool = DatabaseManager::pool().await?;
            sqlx::raw_sql(SCHEMA)
                .execute(&pool)
                .await
                .context("failed to apply schema.sql")?;
            println!("schema applied");
            Ok(())
        }
        Commands::CreateSuperuser {
            email,
            username,
            password,
        } => {
            let pool = DatabaseManager::pool().await?;
            let user = users::insert(
                &pool,
                &users::NewUser {
                    email,
                    username,
                    password_digest: digest_password(&password),
                    screen_name: String::new(),
                    personal_information: String::new(),
                    hide_private_info: false,
                    is_staff: true,
                    is_superuser: true,
                    is_support: true,
                },
            )
            .await
            .context("failed to create superuser")?;
            println!("superuser created with id {}", user.id);
            Ok(())
        }
    }
}
