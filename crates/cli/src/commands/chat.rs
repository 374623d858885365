//! `ragloop chat` — Interactive or single-question mode.

use std::io::Write;
use std::time::Duration;

use ragloop_agent::RetrievalLoop;
use ragloop_config::{AppConfig, DisplayConfig};
use ragloop_core::session::Session;
use tokio::io::{self, AsyncBufReadExt, BufReader};

pub async fn run(
    message: Option<String>,
    model: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(model) = model {
        config.default_model = model;
        if let Some(provider) = config.providers.get_mut(&config.default_provider) {
            provider.default_model = None;
        }
    }

    // Check for API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENAI_API_KEY='sk-...'");
        eprintln!("    export RAGLOOP_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = ragloop_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let store = ragloop_retrieval::build_from_config(&config.vector_store)?;
    let agent = RetrievalLoop::from_config(&config, provider, store)?;
    tracing::debug!(
        model = config.active_model(),
        store = %config.vector_store.backend,
        collection = %config.vector_store.collection,
        "Retrieval loop ready"
    );

    let mut session = Session::new();

    if let Some(question) = message {
        eprint!("  Thinking...");
        let result = agent.handle_turn(&mut session, &question).await;
        eprint!("\r              \r");
        let turn = result?;
        let mut out = std::io::stdout();
        render_answer(&mut out, &turn.answer, &config.display).await?;
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        RagLoop — Interactive Chat            ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:    {}", config.default_provider);
    println!("  Model:       {}", config.active_model());
    println!(
        "  Collection:  {} ({})",
        config.vector_store.collection, config.vector_store.backend
    );
    println!("  Max rounds:  {}", config.retrieval.max_retries);
    if config.retrieval.log_retrievals {
        println!("  Log:         {}", config.retrieval.log_path.display());
    }
    println!();
    println!("  Ask your question and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt()?;
            continue;
        }
        if is_exit(line) {
            break;
        }

        eprint!("  Retrieving context and generating response...");
        let result = agent.handle_turn(&mut session, line).await;
        eprint!("\r{}\r", " ".repeat(48));

        match result {
            Ok(turn) => {
                println!();
                print!("  Assistant > ");
                let mut out = std::io::stdout();
                render_answer(&mut out, &turn.answer, &config.display).await?;
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn is_exit(line: &str) -> bool {
    matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q")
}

/// Print `answer` followed by a newline, one character at a time when the
/// typewriter effect is on. The whole answer is already known; only the
/// display is paced.
pub async fn render_answer<W: Write>(
    out: &mut W,
    answer: &str,
    display: &DisplayConfig,
) -> std::io::Result<()> {
    if !display.typewriter || display.char_delay_ms == 0 {
        writeln!(out, "{answer}")?;
        return out.flush();
    }

    let delay = Duration::from_millis(display.char_delay_ms);
    let mut buf = [0u8; 4];
    for c in answer.chars() {
        out.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        out.flush()?;
        tokio::time::sleep(delay).await;
    }
    writeln!(out)?;
    out.flush()
}
