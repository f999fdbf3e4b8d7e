use clap::Args;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::{Role, WorkerDetails};
use crate::services::{RegisterInput, ServiceError, Services};

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long, help = "YAML file listing workers to create (built-in demo set when omitted)")]
    pub file: Option<PathBuf>,
}

/// Shape of a seed file:
///
/// ```yaml
/// workers:
///   - name: Ravi Kumar
///     email: ravi@example.com
///     serviceTypes: [plumber]
///     hourlyRate: 450
///     verified: true
/// ```
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub workers: Vec<SeedWorker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedWorker {
    pub name: String,
    pub email: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(flatten)]
    pub details: WorkerDetails,
}

fn default_password() -> String {
    "password123".to_string()
}

const DEMO_WORKERS: &str = r#"
workers:
  - name: Ravi Kumar
    email: ravi.plumber@homeserve.local
    phone: "9845000001"
    serviceTypes: [plumber, gas-repair]
    hourlyRate: 450
    experience: 8 years
    location: Bengaluru
    verified: true
  - name: Meena Iyer
    email: meena.electric@homeserve.local
    phone: "9845000002"
    serviceTypes: [electrician, appliance-repair]
    hourlyRate: 600
    advancePayment: 250
    experience: 5 years
    location: Chennai
    verified: true
  - name: Arjun Das
    email: arjun.cool@homeserve.local
    phone: "9845000003"
    serviceTypes: [ac-repair]
    availableTimes: 10 AM - 8 PM
    location: Kolkata
  - name: Fatima Shaikh
    email: fatima.clean@homeserve.local
    phone: "9845000004"
    serviceTypes: [cleaner, pest-control]
    hourlyRate: 350
    advancePayment: 150
    location: Mumbai
    verified: true
"#;

pub fn parse_seed(raw: &str) -> anyhow::Result<SeedFile> {
    Ok(serde_yaml::from_str(raw)?)
}

pub async fn handle(args: SeedArgs, services: &Services, output_format: OutputFormat) -> anyhow::Result<()> {
    let seed = match &args.file {
        Some(path) => parse_seed(&tokio::fs::read_to_string(path).await?)?,
        None => parse_seed(DEMO_WORKERS)?,
    };

    let categories = services.catalog.services().await?;
    let (created, skipped) = seed_workers(services, seed).await?;

    output_success(
        output_format,
        &format!(
            "Catalogue has {} services; created {} workers, skipped {} existing",
            categories.len(),
            created,
            skipped
        ),
        Some(json!({ "services": categories.len(), "created": created, "skipped": skipped })),
    )
}

/// Register every worker in `seed`; emails already taken are skipped.
pub async fn seed_workers(services: &Services, seed: SeedFile) -> anyhow::Result<(usize, usize)> {
    let mut created = 0;
    let mut skipped = 0;

    for worker in seed.workers {
        let input = RegisterInput {
            name: worker.name,
            email: worker.email.clone(),
            password: worker.password,
            role: Role::Worker,
            phone: worker.phone,
            worker: Some(worker.details),
            ..Default::default()
        };
        match services.accounts.register(input).await {
            Ok(view) => {
                if worker.verified {
                    services.catalog.set_verified(view.user.id, true).await?;
                }
                created += 1;
            }
            Err(ServiceError::Conflict(_)) => {
                tracing::info!("{} already registered, skipping", worker.email);
                skipped += 1;
            }
            Err(e) => return Err(anyhow::anyhow!("seeding {} failed: {}", worker.email, e)),
        }
    }

    Ok((created, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::kv::memory::MemoryKvStore;
    use crate::database::kv_repository::KvRepository;
    use crate::database::repository::Repository;
    use std::sync::Arc;

    fn services() -> Services {
        let repo: Arc<dyn Repository> = Arc::new(KvRepository::new(MemoryKvStore::new()));
        Services::new(repo, &AppConfig::development())
    }

    #[test]
    fn demo_set_parses() {
        let seed = parse_seed(DEMO_WORKERS).unwrap();
        assert_eq!(seed.workers.len(), 4);
        assert_eq!(seed.workers[0].details.service_types, vec!["plumber", "gas-repair"]);
        assert_eq!(seed.workers[0].details.hourly_rate, Some(450));
        assert_eq!(seed.workers[2].details.hourly_rate, None);
        assert_eq!(seed.workers[2].password, "password123");
    }

    #[tokio::test]
    async fn seeding_twice_skips_existing() {
        let services = services();
        let (created, skipped) = seed_workers(&services, parse_seed(DEMO_WORKERS).unwrap()).await.unwrap();
        assert_eq!((created, skipped), (4, 0));

        let (created, skipped) = seed_workers(&services, parse_seed(DEMO_WORKERS).unwrap()).await.unwrap();
        assert_eq!((created, skipped), (0, 4));

        let plumbers = services.catalog.workers_for("plumber").await.unwrap();
        assert_eq!(plumbers.len(), 1);
        assert!(plumbers[0].verified);
    }
}
