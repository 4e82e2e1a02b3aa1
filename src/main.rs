mod config;
mod error;
mod shell;
mod core {
    pub mod checks;
    pub mod form;
}
mod ai {
    pub mod agents;
    pub mod client;
    pub mod prompts;
    pub mod schema_utils;
    pub mod streaming;
}
mod orchestrator;

use std::error::Error as _;
use std::io::Write;
use std::process::ExitCode;

use ai::client::OpenAiClient;
use config::Config;
use dotenv::dotenv;
use orchestrator::Orchestrator;
use shell::{Shell, TerminalPrompter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Unexpected error: {e}");
            let mut cause = e.source();
            while let Some(inner) = cause {
                eprintln!("   caused by: {inner}");
                cause = inner.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> error::Result<()> {
    let config = Config::from_env()?;
    log::info!(
        "🤖 Using model {} (temperature {}, streaming {})",
        config.model,
        config.temperature,
        config.stream
    );

    let client = OpenAiClient::new(&config)?.with_partial_output(Box::new(|chunk| {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(chunk.as_bytes());
        let _ = stdout.flush();
    }));
    let orchestrator = Orchestrator::new(client, config.build_policy);

    let mut shell = Shell::new(
        orchestrator,
        TerminalPrompter,
        std::io::stdout(),
        config.lang,
        config.output_dir,
    );
    shell.run().await?;
    Ok(())
}
