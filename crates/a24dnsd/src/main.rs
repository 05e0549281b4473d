// # a24dnsd - Active24 DNS record driver
//
// Thin command-line layer over `a24dns-core`: one operation per invocation,
// JSON documents in, JSON documents out. No DNS logic lives here.
//
// ## Commands
//
// - `create --desired <file>`: create the record, print the observed record
// - `read --observed <file>`: refresh, print the observed record or `null` if it vanished
// - `update --desired <file> --observed <file>`: replace, print the observed record
// - `delete --observed <file>`: delete the record
// - `import <id>`: resolve an import identifier, print the observed record
//
// ## Configuration
//
// - `--config <file>`: JSON provider configuration (`api_key`, `api_secret`, `base_url`, ...)
// - `ACTIVE24_API_KEY`, `ACTIVE24_API_SECRET`, `ACTIVE24_BASE_URL`: fallbacks
// - `ACTIVE24_DEBUG`: log every request and response body
// - `A24DNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// Logs go to stderr; stdout carries only the result document.
//
// ## Example
//
// ```bash
// export ACTIVE24_API_KEY=your_key
// export ACTIVE24_API_SECRET=your_secret
// echo '{"domain":"example.com","name":"@","type":"A","content":"203.0.113.5","ttl":300}' > www.json
// a24dnsd create --desired www.json > state.json
// a24dnsd read --observed state.json
// ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use a24dns_core::{DesiredRecord, ObservedRecord, ProviderConfig, Reconciler};
use a24dns_provider_active24::Active24Client;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Environment variable selecting the log level
const ENV_LOG_LEVEL: &str = "A24DNS_LOG_LEVEL";

/// Exit codes
///
/// - 0: operation succeeded
/// - 1: configuration or input error, nothing was sent
/// - 2: the operation failed
#[derive(Debug, Clone, Copy)]
enum A24ExitCode {
    /// Operation succeeded
    Success = 0,
    /// Configuration error or unreadable input
    ConfigError = 1,
    /// Operation failed
    RuntimeError = 2,
}

impl From<A24ExitCode> for ExitCode {
    fn from(code: A24ExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Debug, Parser)]
#[command(name = "a24dnsd", version, about = "Reconcile DNS records against the Active24 REST API")]
struct Cli {
    /// Provider configuration document (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a record from a desired-state document
    Create {
        #[arg(long, value_name = "FILE")]
        desired: PathBuf,
    },
    /// Refresh an observed record
    Read {
        #[arg(long, value_name = "FILE")]
        observed: PathBuf,
    },
    /// Replace a record with desired state
    Update {
        #[arg(long, value_name = "FILE")]
        desired: PathBuf,
        #[arg(long, value_name = "FILE")]
        observed: PathBuf,
    },
    /// Delete an observed record
    Delete {
        #[arg(long, value_name = "FILE")]
        observed: PathBuf,
    },
    /// Resolve an import identifier and read the record
    Import {
        /// zone:id, zone:service:id, zone:name:type, zone:service:name:type
        /// or zone:service:name:type:content
        id: String,
    },
}

/// Inputs read before any network call
enum Operation {
    Create(DesiredRecord),
    Read(ObservedRecord),
    Update(DesiredRecord, ObservedRecord),
    Delete(ObservedRecord),
    Import(String),
}

impl Operation {
    fn load(command: Command) -> Result<Self> {
        Ok(match command {
            Command::Create { desired } => Operation::Create(load_document(&desired)?),
            Command::Read { observed } => Operation::Read(load_document(&observed)?),
            Command::Update { desired, observed } => {
                Operation::Update(load_document(&desired)?, load_document(&observed)?)
            }
            Command::Delete { observed } => Operation::Delete(load_document(&observed)?),
            Command::Import { id } => Operation::Import(id),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Read(_) => "read",
            Operation::Update(..) => "update",
            Operation::Delete(_) => "delete",
            Operation::Import(_) => "import",
        }
    }
}

/// Read and parse a JSON document
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Provider configuration from `--config`, or an empty one relying on the environment
fn load_config(path: Option<&Path>) -> Result<ProviderConfig> {
    match path {
        Some(path) => load_document(path),
        None => Ok(ProviderConfig::default()),
    }
}

/// Resolve credentials and build the HTTP client
fn build_client(config: Option<&Path>) -> Result<Active24Client> {
    let resolved = load_config(config)?.resolve()?;
    info!("Using Active24 API at {}", resolved.base_url);
    Ok(Active24Client::from_config(&resolved)?)
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            raw
        ),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode result")?;
    println!("{}", out);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match parse_log_level(&env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string())) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return A24ExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return A24ExitCode::ConfigError.into();
    }

    // Configuration and documents are validated before any network call
    let client = match build_client(cli.config.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return A24ExitCode::ConfigError.into();
        }
    };

    let operation = match Operation::load(cli.command) {
        Ok(op) => op,
        Err(e) => {
            error!("Input error: {:#}", e);
            return A24ExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return A24ExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling request");
                interrupt.cancel();
            }
        });

        let client = client.with_cancellation(cancel);
        let name = operation.name();
        match run(Reconciler::new(Arc::new(client)), operation).await {
            Ok(()) => {
                info!("{} finished", name);
                A24ExitCode::Success
            }
            Err(e) => {
                error!("{} failed: {:#}", name, e);
                A24ExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run one operation and print its result
async fn run(reconciler: Reconciler, operation: Operation) -> Result<()> {
    match operation {
        Operation::Create(desired) => {
            let observed = reconciler.create(&desired).await?;
            print_json(&observed)
        }
        Operation::Read(prior) => match reconciler.read(&prior).await? {
            Some(observed) => print_json(&observed),
            None => {
                warn!("Record {} is gone, drop it from state", prior.id);
                print_json(&serde_json::Value::Null)
            }
        },
        Operation::Update(desired, prior) => {
            let observed = reconciler.update(&desired, &prior).await?;
            print_json(&observed)
        }
        Operation::Delete(prior) => {
            reconciler.delete(&prior).await?;
            Ok(())
        }
        Operation::Import(id) => {
            let observed = reconciler.import(&id).await?;
            print_json(&observed)
        }
    }
}
