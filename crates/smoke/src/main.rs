// Kubedeploy smoke test CLI
//
// Design Decision: Exit status is the verdict so CI steps can gate on it.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use kubedeploy_smoke::{SmokeClient, DEFAULT_BASE_URL};

#[derive(Parser)]
#[command(name = "kubedeploy-smoke")]
#[command(about = "Probe a deployed demo-app's health and root endpoints")]
#[command(version)]
struct Cli {
    /// Base URL of the deployed application
    #[arg(env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let client = SmokeClient::new(cli.base_url)?;

    let mut all_passed = true;
    for outcome in client.run_all().await {
        match &outcome.result {
            Ok(()) => println!("Running {}... PASSED", outcome.name),
            Err(e) => {
                println!("Running {}... FAILED ({e})", outcome.name);
                all_passed = false;
            }
        }
    }

    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
