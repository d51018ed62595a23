use clap::{Parser, Subcommand};
use serde::Serialize;

use compute_balancer::compute::ComputeKind;
use compute_balancer::http::messages::{ComputeRequest, ComputeResponse, GetServerResponse, WorkersResponse};

#[derive(Parser)]
#[command(name = "balancer-cli")]
#[command(about = "Client for the compute load balancer", long_about = None)]
struct Cli {
    /// Balancer base URL.
    #[arg(short, long, default_value = "http://localhost:50051")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the balancer for a server
    Server,
    /// Get a server and run a compute request on it
    Compute {
        /// Kind of work: sum (1..=n) or sleep (n seconds)
        #[arg(long, value_parser = parse_kind, default_value = "sum")]
        kind: ComputeKind,
        #[arg(long)]
        n: i64,
    },
    /// List registered workers
    Workers,
}

fn parse_kind(s: &str) -> Result<ComputeKind, String> {
    match s {
        "sum" | "1" => Ok(ComputeKind::SumToN),
        "sleep" | "2" => Ok(ComputeKind::SleepForSeconds),
        other => Err(format!("unknown kind '{}', expected sum or sleep", other)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Server => {
            let server = get_server(&client, &cli.url).await?;
            print_json(&server)?;
        }
        Commands::Compute { kind, n } => {
            let server = get_server(&client, &cli.url).await?;
            let (Some(ip), Some(port)) = (server.ip.as_deref(), server.port) else {
                eprintln!("Error: {}", server.msg);
                return Ok(());
            };
            let res: ComputeResponse = client
                .post(format!("http://{}:{}/v1/compute", ip, port))
                .json(&ComputeRequest { kind: kind.into(), n })
                .send()
                .await?
                .json()
                .await?;
            if res.err_code != 0 {
                eprintln!("Error from worker {}: {}", server.id.unwrap_or_default(), res.msg);
                return Ok(());
            }
            print_json(&res)?;
        }
        Commands::Workers => {
            let res: WorkersResponse = client
                .get(format!("{}/v1/workers", cli.url))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            print_json(&res)?;
        }
    }

    Ok(())
}

/// A 503 still carries a JSON body explaining why no server was found.
async fn get_server(client: &reqwest::Client, url: &str) -> Result<GetServerResponse, reqwest::Error> {
    client.get(format!("{}/v1/server", url)).send().await?.json().await
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
