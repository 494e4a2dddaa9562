//! Command-line front end for the jetton gateway.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use jetton_gateway::{HttpRpcTransport, JettonGateway, TonAddress};

#[derive(Parser)]
#[command(name = "jetton-gateway")]
#[command(about = "Rate-limited, caching access to jetton balances", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the display balance for an owner address
    Balance { owner: String },
    /// Resolve the jetton wallet address for an owner
    WalletAddress { owner: String },
    /// Convert a display amount to base units
    ToUnits { amount: f64 },
    /// Convert base units to a display amount
    FromUnits { units: u128 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    jetton_gateway::observability::logging::init("jetton_gateway=info");

    let cli = Cli::parse();
    let config = jetton_gateway::config::load_config(&cli.config)?;
    let transport = Arc::new(HttpRpcTransport::new(&config.rpc)?);
    let gateway = JettonGateway::new(config, transport);

    match cli.command {
        Commands::Balance { owner } => {
            let balance = gateway.display_balance(&TonAddress::new(owner)).await;
            println!("{balance}");
        }
        Commands::WalletAddress { owner } => {
            let wallet = gateway.wallet_address(&TonAddress::new(owner)).await?;
            println!("{wallet}");
        }
        Commands::ToUnits { amount } => {
            println!("{}", gateway.amount_to_units(amount));
        }
        Commands::FromUnits { units } => {
            println!("{}", gateway.units_to_amount(units));
        }
    }

    Ok(())
}
