//! Interactive catalog entry point.
//!
//! # Responsibility
//! - Load `shelfkeep.toml` from the working directory (defaults when absent).
//! - Start file logging, open the catalog store, and hand off to the menu.

mod menu;

use log::info;
use shelfkeep_core::config::DEFAULT_CONFIG_FILE_NAME;
use shelfkeep_core::{default_log_level, init_logging, open_catalog, AppConfig};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match AppConfig::load(DEFAULT_CONFIG_FILE_NAME) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    start_logging(&config);

    let mut catalog = match open_catalog(&config.store_path, config.catalog.clone()) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!(
                "Could not open catalog store `{}`: {err}",
                config.store_path.display()
            );
            return ExitCode::FAILURE;
        }
    };
    info!(
        "event=cli_start module=cli status=ok store={} records={}",
        config.store_path.display(),
        catalog.len()
    );

    let stdin = io::stdin();
    let result = menu::Menu::new(&mut catalog, stdin.lock(), io::stdout()).run();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("terminal error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Logging is best effort; the menu still runs when it cannot start.
fn start_logging(config: &AppConfig) {
    let level = resolve_log_level(config);
    let log_dir = match &config.log_dir {
        Some(dir) => dir.clone(),
        None => match std::env::current_dir() {
            Ok(cwd) => cwd.join("logs"),
            Err(err) => {
                eprintln!("logging disabled: cannot resolve working directory: {err}");
                return;
            }
        },
    };

    if let Err(err) = init_logging(level, &log_dir) {
        eprintln!("logging disabled: {err}");
    }
}

fn resolve_log_level(config: &AppConfig) -> &str {
    config
        .log_level
        .as_deref()
        .unwrap_or(default_log_level())
}

#[cfg(test)]
mod tests {
    use super::resolve_log_level;
    use shelfkeep_core::{default_log_level, AppConfig};

    #[test]
    fn configured_log_level_wins_over_build_default() {
        let config = AppConfig {
            log_level: Some("warn".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(resolve_log_level(&config), "warn");
    }

    #[test]
    fn missing_log_level_uses_build_default() {
        assert_eq!(
            resolve_log_level(&AppConfig::default()),
            default_log_level()
        );
    }
}
