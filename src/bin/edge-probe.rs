use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use serde_json::Value;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "edge-probe")]
#[command(about = "Smoke-test a running spa-edge instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query /api/health; exits non-zero unless the server reports healthy
    Health,
    /// Query /api/keys and report which credentials are configured
    Keys {
        /// Origin header to present
        #[arg(short, long)]
        origin: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/api/health", cli.url)).send().await?;
            let Some(json) = read_json(res).await? else {
                return Ok(false);
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(json["status"] == "healthy")
        }
        Commands::Keys { origin } => {
            let mut headers = HeaderMap::new();
            if let Some(origin) = origin {
                headers.insert(ORIGIN, HeaderValue::from_str(&origin)?);
            }
            let res = client
                .get(format!("{}/api/keys", cli.url))
                .headers(headers)
                .send()
                .await?;
            let Some(json) = read_json(res).await? else {
                return Ok(false);
            };

            // Never print the secrets themselves.
            for provider in ["groq", "perplexity", "gemini"] {
                let configured = json[provider].as_str().is_some_and(|s| !s.is_empty());
                println!("{:<12} {}", provider, if configured { "configured" } else { "missing" });
            }
            Ok(true)
        }
    }
}

async fn read_json(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }

    Ok(Some(res.json().await?))
}
