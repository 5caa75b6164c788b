use crate::config::{generate::generate_starter_config, load_or_default, user_config_path};
use std::fs;
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    // Prefer ~/.config/elb2loki/config.yml, fall back to /etc/elb2loki/config.yml
    let config_path = user_config_path()
        .filter(|path| path.parent().map_or(false, |p| fs::create_dir_all(p).is_ok()))
        .unwrap_or_else(|| PathBuf::from("/etc/elb2loki/config.yml"));

    if config_path.exists() {
        return Err(format!(
            "Config file already exists at {}. Remove it first or use --stdout to print the config",
            config_path.display()
        )
        .into());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, config_content)?;

    println!("Config file written to {}", config_path.display());
    Ok(())
}

pub fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match &config_path {
        Some(path) => println!("Validating config file: {}", path.display()),
        None => println!("No config file found, validating defaults and environment"),
    }

    match load_or_default(config_path.as_deref()) {
        Ok(config) => {
            println!("✓ Config is valid (job label: {})", config.ingest.job_label());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Config validation failed:\n{}", e);
            std::process::exit(1);
        }
    }
}
