use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slipway-cli")]
#[command(about = "Operations CLI for a running slipway server", long_about = None)]
struct Cli {
    /// Base URL of the server.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the health endpoint; exits non-zero when unhealthy
    Health {
        #[arg(long, default_value = "/health")]
        path: String,
    },
    /// Fetch the Prometheus metrics exposition
    Metrics {
        #[arg(long, default_value = "http://localhost:9090")]
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health { path } => {
            let res = client.get(format!("{}{}", cli.url, path)).send().await?;
            let status = res.status();
            print!("{}", res.text().await?);
            if !status.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Metrics { address } => {
            let res = client.get(address).send().await?;
            print!("{}", res.text().await?);
        }
    }

    Ok(())
}
