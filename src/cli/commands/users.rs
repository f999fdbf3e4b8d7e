use clap::Subcommand;

use crate::cli::utils::{output_collection, truncate};
use crate::cli::OutputFormat;
use crate::database::models::{Role, UserProfile};
use crate::services::Services;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List accounts, optionally filtered by role")]
    List {
        #[arg(long, help = "user, worker or admin")]
        role: Option<Role>,
    },
}

pub async fn handle(cmd: UserCommands, services: &Services, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List { role } => {
            let users: Vec<UserProfile> = services
                .accounts
                .all_users()
                .await?
                .into_iter()
                .filter(|u| role.map_or(true, |r| u.role == r))
                .collect();

            output_collection(
                output_format,
                "users",
                &users,
                &format!("{:<36}  {:<8}  {:<28}  {}", "ID", "ROLE", "EMAIL", "NAME"),
                |u| {
                    format!(
                        "{:<36}  {:<8}  {:<28}  {}",
                        u.id,
                        u.role,
                        truncate(&u.email, 28),
                        u.name
                    )
                },
            )
        }
    }
}
