//! Ledger CLI
//!
//! Command-line interface for the invoice ledger API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use ledger_client::LedgerClient;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author, version, about = "Invoice ledger API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the ledger API
    #[arg(long, env = "LEDGER_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoice operations
    Invoice {
        #[command(subcommand)]
        action: InvoiceCommands,
    },
    /// User operations
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum InvoiceCommands {
    /// Create a pending invoice
    Create {
        #[arg(long)]
        user_id: i64,
        /// Amount in major units, e.g. 150.00
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        label: String,
    },
    /// Settle a pending invoice with its exact amount
    Settle {
        #[arg(long)]
        invoice_id: i64,
        #[arg(long)]
        amount: f64,
        /// Payment reference
        #[arg(long)]
        reference: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users in ascending id order
    List {
        /// Only users with a greater id
        #[arg(long)]
        from_id: Option<i64>,
        /// Page size (server caps it at 50)
        #[arg(long)]
        count: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = LedgerClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Invoice { action } => match action {
            InvoiceCommands::Create {
                user_id,
                amount,
                label,
            } => {
                client.create_invoice(user_id, amount, &label).await?;
                println!("✓ Invoice created for user {}", user_id);
            }
            InvoiceCommands::Settle {
                invoice_id,
                amount,
                reference,
            } => {
                client.settle_invoice(invoice_id, amount, &reference).await?;
                println!("✓ Invoice {} settled", invoice_id);
            }
        },

        Commands::Users { action } => match action {
            UserCommands::List { from_id, count } => {
                let users = client.list_users(from_id, count).await?;
                println!("{}", serde_json::to_string_pretty(&users)?);
            }
        },
    }

    Ok(())
}
