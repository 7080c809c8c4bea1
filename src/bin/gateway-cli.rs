use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the service gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "GATEWAY_URL")]
    url: String,

    /// Bearer token, sent only when set.
    #[arg(short, long, env = "GATEWAY_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered instance and its health
    Services,
    /// Probe a service's instances now
    Health { name: String },
    /// Register an instance of a service
    Register { name: String, url: String },
    /// Push a health report for a service
    Report {
        name: String,
        /// healthy, ok or up mean healthy; anything else marks unhealthy
        status: String,
        /// Restrict the report to the instance at this base URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Remove one instance by id
    Unregister { name: String, id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    let request = match cli.command {
        Commands::Services => client.get(format!("{}/services", base)),
        Commands::Health { name } => client.get(format!("{}/services/{}/health", base, name)),
        Commands::Register { name, url } => client
            .post(format!("{}/services/register", base))
            .json(&json!({ "name": name, "url": url })),
        Commands::Report { name, status, url } => client
            .post(format!("{}/services/health/{}", base, name))
            .json(&json!({ "status": status, "url": url })),
        Commands::Unregister { name, id } => {
            client.delete(format!("{}/services/{}/{}", base, name, id))
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
