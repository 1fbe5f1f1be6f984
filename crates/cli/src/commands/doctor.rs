//! `habitcoach doctor`: Diagnose configuration and backends.

use habitcoach_config::AppConfig;
use habitcoach_core::catalog::ExerciseCatalog;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("HabitCoach Doctor: System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file, using defaults. Run `habitcoach onboard`");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config and run doctor again.");
            return Ok(());
        }
    };

    let selection = match habitcoach_providers::select(&config) {
        Ok(selection) => {
            println!("  ✅ Provider: {} at {} ({})", selection.name, selection.base_url, selection.model);
            Some(selection)
        }
        Err(e) => {
            println!("  ❌ Provider: {e}");
            issues += 1;
            None
        }
    };

    if selection.as_ref().is_some_and(|s| !s.has_key) {
        println!("  ⚠️  No API key; every request will be served by a fallback");
        issues += 1;
    }

    match &config.catalog_path {
        Some(path) => match ExerciseCatalog::load(path) {
            Ok(catalog) => println!("  ✅ Exercise catalog: {} entries from {}", catalog.len(), path.display()),
            Err(e) => {
                println!("  ❌ Exercise catalog: {e}");
                issues += 1;
            }
        },
        None => println!("  ✅ Exercise catalog: {} built-in entries", ExerciseCatalog::builtin().len()),
    }

    match habitcoach_store::build_from_config(&config).await {
        Ok(backends) => println!(
            "  ✅ Backends: store={}, ledger={}",
            backends.store.name(),
            backends.ledger.name()
        ),
        Err(e) => {
            println!("  ❌ Backends: {e}");
            issues += 1;
        }
    }

    if let Some(selection) = selection.filter(|s| s.has_key) {
        match selection.provider().health_check().await {
            Ok(true) => println!("  ✅ Provider {} reachable", selection.name),
            Ok(false) | Err(_) => {
                println!("  ❌ Provider {} not reachable", selection.name);
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
