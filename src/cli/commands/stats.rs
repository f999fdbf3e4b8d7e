use crate::cli::OutputFormat;
use crate::services::Services;

pub async fn handle(services: &Services, output_format: OutputFormat) -> anyhow::Result<()> {
    let stats = services.bookings.stats().await?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            println!("Accounts: {}", stats.total_users);
            for (role, count) in &stats.users_by_role {
                println!("  {:<10} {}", role, count);
            }
            println!("Workers:  {} ({} verified)", stats.total_workers, stats.verified_workers);
            println!("Requests: {}", stats.total_requests);
            for (status, count) in &stats.requests_by_status {
                println!("  {:<10} {}", status, count);
            }
            println!("Revenue:  {}", stats.revenue);
        }
    }
    Ok(())
}
