//! `ragloop doctor` — Diagnose configuration and backend health.

use ragloop_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 RagLoop Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `ragloop onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set OPENAI_API_KEY");
        issues += 1;
    }

    match ragloop_agent::context::build_counter(&config.retrieval.tokenizer) {
        Ok(counter) => println!("  ✅ Tokenizer '{}' loaded", counter.name()),
        Err(e) => {
            println!("  ❌ Tokenizer: {e}");
            issues += 1;
        }
    }

    let router = ragloop_providers::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Provider '{}' answered but is not healthy", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}': {e}", provider.name());
                issues += 1;
            }
        },
        None => {
            println!("  ❌ No default provider configured");
            issues += 1;
        }
    }

    match ragloop_retrieval::build_from_config(&config.vector_store) {
        Ok(store) => match store.health_check().await {
            Ok(true) => println!(
                "  ✅ Vector store '{}' ready ({})",
                store.name(),
                config.vector_store.url
            ),
            Ok(false) => {
                println!("  ⚠️  Vector store '{}' is not ready", store.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Vector store '{}': {e}", store.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Vector store: {e}");
            issues += 1;
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
