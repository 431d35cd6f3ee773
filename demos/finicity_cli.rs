use chrono::{Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use finicity::models::CustomerType;
use finicity::{
    Client, Credentials, Customer, CustomerQuery, InstitutionQuery, Sort, TransactionQuery,
};
use std::error::Error;

#[derive(Debug, Parser)]
#[command(name = "finicity-cli", about = "CLI wrapper for the Finicity aggregation API")]
struct Cli {
    /// Application key; falls back to FINICITY_APP_KEY env var
    #[arg(long, env = "FINICITY_APP_KEY")]
    app_key: String,

    /// Partner id; falls back to FINICITY_PARTNER_ID env var
    #[arg(long, env = "FINICITY_PARTNER_ID")]
    partner_id: String,

    /// Partner secret; falls back to FINICITY_PARTNER_SECRET env var
    #[arg(long, env = "FINICITY_PARTNER_SECRET", hide_env_values = true)]
    partner_secret: String,

    /// Override the API base URL
    #[arg(long, env = "FINICITY_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search institutions by name
    Institutions {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 25)]
        limit: u32,
    },
    /// List customers
    Customers {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<Kind>,
    },
    /// Create a testing customer
    AddTestingCustomer {
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Delete a customer and all of its accounts
    DeleteCustomer {
        #[arg(long, value_name = "ID")]
        customer_id: String,
    },
    /// List accounts of a customer
    Accounts {
        #[arg(long, value_name = "ID")]
        customer_id: String,
    },
    /// List transactions of a customer for the last N days
    Transactions {
        #[arg(long, value_name = "ID")]
        customer_id: String,
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// Newest first
        #[arg(long)]
        desc: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Testing,
    Active,
}

impl From<Kind> for CustomerType {
    fn from(value: Kind) -> Self {
        match value {
            Kind::Testing => CustomerType::Testing,
            Kind::Active => CustomerType::Active,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let credentials = Credentials::new(cli.app_key, cli.partner_id, cli.partner_secret);
    let mut builder = Client::builder(credentials);
    if let Some(base_url) = cli.base_url {
        builder = builder.base_url(base_url);
    }
    let client = builder.build().await?;

    match cli.command {
        Commands::Institutions { search, limit } => {
            let query = InstitutionQuery {
                search,
                limit: Some(limit),
                ..InstitutionQuery::default()
            };
            for institution in client.institutions().await?.get_institutions(&query).await? {
                println!("{} | {}", institution.id, institution.name);
            }
        }
        Commands::Customers { search, kind } => {
            let query = CustomerQuery {
                search,
                customer_type: kind.map(CustomerType::from),
                ..CustomerQuery::default()
            };
            for customer in client.customers().await?.get_customers(&query).await? {
                println!(
                    "{} | {} | {} {}",
                    customer.id.unwrap_or_default(),
                    customer.username.unwrap_or_default(),
                    customer.first_name.unwrap_or_default(),
                    customer.last_name.unwrap_or_default()
                );
            }
        }
        Commands::AddTestingCustomer {
            username,
            first_name,
            last_name,
        } => {
            let customer = Customer::new(username, first_name, last_name);
            let created = client
                .customers()
                .await?
                .add_testing_customer(&customer)
                .await?;
            println!("Created customer {}", created.id.unwrap_or_default());
        }
        Commands::DeleteCustomer { customer_id } => {
            client.customers().await?.delete_customer(&customer_id).await?;
            println!("Deleted customer {customer_id}");
        }
        Commands::Accounts { customer_id } => {
            for account in client.accounts().await?.get_accounts(&customer_id).await? {
                println!(
                    "{} | {} | {:?} | {}",
                    account.id,
                    account.name,
                    account.account_type,
                    account
                        .balance
                        .map(|b| b.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        Commands::Transactions {
            customer_id,
            days,
            desc,
        } => {
            let to = Utc::now();
            let from = to - Duration::days(days);
            let sort = if desc { Sort::Desc } else { Sort::Asc };
            let query = TransactionQuery::new(from, to).sort(sort);
            let transactions = client
                .transactions()
                .await?
                .get_transactions(&customer_id, &query)
                .await?;
            println!("Fetched {} transactions:", transactions.len());
            for txn in &transactions {
                println!(
                    "{} | {} | {}",
                    txn.id.as_deref().unwrap_or("-"),
                    txn.amount.map(|a| a.to_string()).unwrap_or_default(),
                    txn.description.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}
