use chrono::{Duration, Utc};
use finicity::{Client, Credentials, TransactionQuery};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let customer_id = env::var("FINICITY_CUSTOMER_ID")
        .map_err(|_| "Set FINICITY_CUSTOMER_ID in your environment or .env file")?;

    let client = Client::new(Credentials::from_env()?).await?;

    // Transactions of the last 30 days, pending ones included.
    let to = Utc::now();
    let from = to - Duration::days(30);
    let query = TransactionQuery::new(from, to).include_pending(true);

    let transactions = client
        .transactions()
        .await?
        .get_transactions(&customer_id, &query)
        .await?;

    println!(
        "Fetched {} transactions from {} to {}:",
        transactions.len(),
        from.date_naive(),
        to.date_naive()
    );
    for txn in &transactions {
        println!(
            "{} | {} | {} | {}",
            txn.id.as_deref().unwrap_or("-"),
            txn.posted_date
                .map(|d| d.date_naive().to_string())
                .unwrap_or_default(),
            txn.amount.map(|a| a.to_string()).unwrap_or_default(),
            txn.description.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
