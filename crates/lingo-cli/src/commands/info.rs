//! Info command - show the resolved backend configuration.

use std::path::Path;

use miette::miette;

use lingo_backend::BackendConfig;

use crate::config;

pub(crate) fn run(config_path: &Path) -> miette::Result<()> {
    let config = config::load(config_path).map_err(|e| miette!("{e}"))?;

    println!("Mode: {}", config.mode());
    println!("History window: {} turns", config.default_history_window());

    match &config {
        BackendConfig::Remote(remote) => {
            println!("Endpoint: https://{}:{}", remote.host, remote.port);
            println!("API key: {}", mask(&remote.api_key));
        }
        BackendConfig::Local(local) => {
            println!("Executable: {}", local.executable.display());
            println!("Model: {}", local.model.display());
            println!("Context length: {}", local.context_length);
            println!("Port: {}", local.port);
            if !local.extra_args.is_empty() {
                println!("Extra args: {}", local.extra_args.join(" "));
            }
        }
    }

    Ok(())
}

/// Keep only a short prefix of a credential for display.
fn mask(key: &str) -> String {
    if key.chars().count() <= 6 {
        "******".to_string()
    } else {
        let prefix: String = key.chars().take(6).collect();
        format!("{prefix}...")
    }
}
