use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::Result;
use rox_central::{RestTransport, RetryConfig};
use rox_cli::config::{self, RoxConfig};
use rox_cli::persistence::ResourceStore;
use rox_cli::secrets::FileSecretStore;
use rox_cli::sweep::{self, SweepOptions};
use rox_provisioner::{
    Connector, CredentialResolver, InMemorySecretStore, SecretStore, StaticProviderConfigs,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "rox-provisioner")]
#[command(about = "Reconcile StackRox Central clusters and init bundles")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one reconciliation pass for every record
    Sweep {
        /// Override the per-pass timeout from the config, in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print each record's conditions
    Status,
    /// Request deletion of a record; the next sweep carries it out
    Delete { name: String },
    /// Write a starter config file
    Init {
        /// Central endpoint, host[:port]
        #[arg(long)]
        endpoint: String,
        /// Environment variable holding the API token
        #[arg(long, default_value = "ROX_API_TOKEN")]
        token_env: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("ROX_LOG_FORMAT").is_ok_and(|f| f == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };

    match cli.command {
        Command::Init {
            endpoint,
            token_env,
        } => init(&config_path, endpoint, token_env),
        Command::Status => {
            let config = config::load_config(&config_path)?;
            status(&config)
        }
        Command::Delete { name } => {
            let config = config::load_config(&config_path)?;
            request_deletion(&config, &name)
        }
        Command::Sweep { timeout } => {
            let mut config = config::load_config(&config_path)?;
            if let Some(secs) = timeout {
                config.pass_timeout_secs = secs;
            }
            run_sweep(&config).await
        }
    }
}

fn init(path: &std::path::Path, endpoint: String, token_env: String) -> Result<()> {
    if path.exists() {
        return Err(eyre::eyre!("config already exists at {}", path.display()));
    }
    let config = RoxConfig {
        config_version: config::CURRENT_VERSION,
        provider_configs: [(
            "default".to_string(),
            rox_core::ProviderConfig {
                endpoint,
                credentials: rox_core::CredentialsSource::Environment {
                    env: rox_core::EnvSelector { name: token_env },
                },
            },
        )]
        .into(),
        resources_path: "resources.json".into(),
        secrets_dir: None,
        connection_details_dir: "connection-details".into(),
        ca_certificate: None,
        pass_timeout_secs: 60,
        concurrency: 4,
    };
    config::save_config(path, &config)
}

fn status(config: &RoxConfig) -> Result<()> {
    let records = ResourceStore::new(&config.resources_path).load()?;
    for record in &records {
        let meta = record.meta();
        let conditions = record.conditions();
        println!(
            "{:<11} {:<24} external={:<24} ready={:<11} synced={:?}",
            record.kind().to_string(),
            meta.name,
            meta.external_name,
            conditions.ready.to_string(),
            conditions.synced,
        );
    }
    Ok(())
}

fn request_deletion(config: &RoxConfig, name: &str) -> Result<()> {
    let store = ResourceStore::new(&config.resources_path);
    let mut records = store.load()?;
    let record = records
        .iter_mut()
        .find(|r| r.meta().name == name)
        .ok_or_else(|| eyre::eyre!("no resource named {name}"))?;
    record.meta_mut().deletion_requested = true;
    store.flush(&records)?;
    tracing::info!(resource = %name, "deletion requested");
    Ok(())
}

fn build_connector(config: &RoxConfig) -> Result<Connector> {
    let configs: StaticProviderConfigs = config
        .provider_configs
        .iter()
        .map(|(name, pc)| (name.clone(), pc.clone()))
        .collect();

    let secrets: Arc<dyn SecretStore> = match &config.secrets_dir {
        Some(dir) => Arc::new(FileSecretStore::new(dir)),
        None => Arc::new(InMemorySecretStore::new()),
    };

    let mut transport = RestTransport::new().with_retry(RetryConfig::default());
    if let Some(ca) = &config.ca_certificate {
        let pem = std::fs::read(ca)
            .map_err(|e| eyre::eyre!("failed to read CA certificate {}: {e}", ca.display()))?;
        transport = transport.with_ca_certificate(pem);
    }

    Ok(Connector::new(
        Arc::new(configs),
        CredentialResolver::new(secrets),
        Arc::new(transport),
    )?)
}

async fn run_sweep(config: &RoxConfig) -> Result<()> {
    let connector = build_connector(config)?;
    let store = ResourceStore::new(&config.resources_path);
    let mut records = store.load()?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling in-flight passes");
            on_signal.cancel();
        }
    });

    let options = SweepOptions {
        pass_timeout: config.pass_timeout(),
        concurrency: config.concurrency,
    };
    let report = sweep::sweep(
        &connector,
        &shutdown,
        &mut records,
        &config.connection_details_dir,
        &options,
    )
    .await;

    store.flush(&records)?;

    tracing::info!(
        created = report.created,
        updated = report.updated,
        deleted = report.deleted,
        orphaned = report.orphaned,
        unchanged = report.unchanged,
        failed = report.failed,
        released = report.released.len(),
        requeue = report.requeue,
        "sweep complete"
    );

    if report.failed > 0 {
        return Err(eyre::eyre!("{} of the passes failed", report.failed));
    }
    Ok(())
}
