use std::process::ExitCode;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use vaultadm_adapter_vault::VaultClient;
use vaultadm_bootstrap::{
    config_dir, init_runtime, vault_config, ProvisionFailure, ProvisionPlan, Provisioner,
};
use vaultadm_config::AppConfig;
use vaultadm_errors::{AppError, AppResult};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match AppConfig::load(&config_dir()) {
        Ok(config) => config,
        Err(e) => {
            let err = AppError::config(e.to_string());
            eprintln!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };
    init_runtime(&config);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Provisioning failed");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(config: &AppConfig) -> AppResult<()> {
    let plan = ProvisionPlan::from_config(config)?;
    let client = VaultClient::new(&vault_config(&config.vault))?;

    let outcome = match Provisioner::new(client, plan).run().await {
        Ok(outcome) => outcome,
        Err(ProvisionFailure { error, init }) => {
            // stdout is the only place the init material ever reaches
            if let Some(init) = init {
                print_json(&json!({ "init": init }))?;
            }
            return Err(error);
        }
    };
    info!(
        unsealed = outcome.unsealed,
        policies = outcome.policies_installed.len(),
        engines = outcome.engines_enabled.len(),
        "Provisioning complete"
    );

    print_json(&outcome)
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let summary = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("cannot encode provisioning outcome: {e}")))?;
    println!("{summary}");
    Ok(())
}
