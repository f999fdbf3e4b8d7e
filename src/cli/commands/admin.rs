use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::services::Services;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an admin account (no-op if it already exists)")]
    Create {
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Password; read from HOMESERVE_ADMIN_PASSWORD when omitted")]
        password: Option<String>,
        #[arg(long, default_value = "Administrator", help = "Display name")]
        name: String,
    },
}

pub async fn handle(cmd: AdminCommands, services: &Services, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create { email, password, name } => {
            let password = match password {
                Some(p) => p,
                None => std::env::var("HOMESERVE_ADMIN_PASSWORD")
                    .map_err(|_| anyhow::anyhow!("pass --password or set HOMESERVE_ADMIN_PASSWORD"))?,
            };
            let admin = services.accounts.create_admin(&name, &email, &password).await?;
            output_success(
                output_format,
                &format!("Admin account {} ready", admin.email),
                Some(json!({ "user": admin })),
            )
        }
    }
}
