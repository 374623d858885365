//! `ragloop config` — Configuration management commands.

use ragloop_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:    {}", config.default_provider);
            println!("   Model:       {}", config.active_model());
            println!(
                "   Store:       {} at {}",
                config.vector_store.backend, config.vector_store.url
            );
            println!("   Collection:  {}", config.vector_store.collection);
            println!(
                "   Retrieval:   {} rounds × {} docs, {} token context",
                config.retrieval.max_retries,
                config.retrieval.result_limit,
                config.retrieval.context_token_limit
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Non-fatal problems in an otherwise valid config.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key() {
        warnings.push("No API key set (set OPENAI_API_KEY or RAGLOOP_API_KEY env var)".to_string());
    }

    if config.vector_store.backend == "in_memory" && config.vector_store.documents_path.is_none() {
        warnings.push(
            "in_memory store has no documents_path; every search will come back empty".to_string(),
        );
    }

    if config.retrieval.retry_delay_ms == 0 && config.retrieval.max_retries > 1 {
        warnings.push("retry_delay_ms = 0 sends follow-up rounds back to back".to_string());
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    redact_secrets(&mut config);
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn redact_secrets(config: &mut AppConfig) {
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("[REDACTED]".into());
        }
    };
    mask(&mut config.api_key);
    mask(&mut config.vector_store.api_key);
    for provider in config.providers.values_mut() {
        mask(&mut provider.api_key);
    }
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
