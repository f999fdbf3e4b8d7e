use clap::Subcommand;

use crate::cli::utils::{output_collection, truncate};
use crate::cli::OutputFormat;
use crate::database::models::{RequestStatus, ServiceRequest};
use crate::services::Services;

#[derive(Subcommand)]
pub enum RequestCommands {
    #[command(about = "List service requests, oldest first")]
    List {
        #[arg(long, value_parser = parse_status, help = "pending, accepted, rejected or completed")]
        status: Option<RequestStatus>,
    },
}

fn parse_status(raw: &str) -> Result<RequestStatus, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown status '{}'", raw))
}

pub async fn handle(cmd: RequestCommands, services: &Services, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RequestCommands::List { status } => {
            let requests: Vec<ServiceRequest> = services
                .bookings
                .all_requests()
                .await?
                .into_iter()
                .filter(|r| status.map_or(true, |s| r.status == s))
                .collect();

            output_collection(
                output_format,
                "requests",
                &requests,
                &format!(
                    "{:<36}  {:<16}  {:<10}  {:<12}  {:<18}  {}",
                    "ID", "SERVICE", "STATUS", "PAYMENT", "CUSTOMER", "WORKER"
                ),
                |r| {
                    format!(
                        "{:<36}  {:<16}  {:<10}  {:<12}  {:<18}  {}",
                        r.id,
                        truncate(&r.service_type, 16),
                        r.status,
                        r.payment_status,
                        truncate(&r.user_name, 18),
                        r.worker_name
                    )
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_argument_parses() {
        assert_eq!(parse_status("Completed"), Ok(RequestStatus::Completed));
        assert!(parse_status("done").is_err());
    }
}
