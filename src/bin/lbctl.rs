use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "lbctl")]
#[command(about = "Management CLI for the edge balancer admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "EDGE_LB_URL")]
    url: String,

    #[arg(short, long, env = "EDGE_LB_API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show request counters and per-backend state
    Stats,
    /// Switch the selection strategy at runtime
    SetStrategy {
        /// roundrobin, leastconnections, random, weighted or iphash
        strategy: String,
    },
    /// Force a backend alive or down
    Mark {
        /// Backend address as configured
        backend: String,
        /// Mark the backend down instead of alive
        #[arg(long)]
        down: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Stats => {
            client
                .get(format!("{}/admin/stats", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::SetStrategy { strategy } => {
            client
                .put(format!("{}/admin/strategy", cli.url))
                .headers(headers)
                .json(&json!({ "strategy": strategy }))
                .send()
                .await?
        }
        Commands::Mark { backend, down } => {
            client
                .put(format!("{}/admin/backends", cli.url))
                .headers(headers)
                .json(&json!({ "url": backend, "alive": !down }))
                .send()
                .await?
        }
    };
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
