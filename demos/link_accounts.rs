use finicity::{Client, Credentials, OperationResult};
use std::env;
use std::io::{self, BufRead, Write};

// Give up after this many consecutive challenges.
const MAX_CHALLENGE_ROUNDS: usize = 5;

/// Link every account a testing customer holds at an institution, answering
/// MFA questions on stdin.
///
/// Usage: link_accounts <customer_id> <institution_id> <username> <password>
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [customer_id, institution_id, username, password] = args.as_slice() else {
        return Err("usage: link_accounts <customer_id> <institution_id> <username> <password>".into());
    };

    let client = Client::new(Credentials::from_env()?).await?;
    let institutions = client.institutions().await?;
    let mut form = institutions.get_institution_login_form(institution_id).await?;
    if !form.set_value(0, username.as_str()) || !form.set_value(1, password.as_str()) {
        return Err("institution login form has fewer than two fields".into());
    }

    let accounts = client.accounts().await?;
    let mut result = accounts
        .add_all_accounts(customer_id, institution_id, &form.into())
        .await?;

    let stdin = io::stdin();
    let mut rounds = 0;
    let linked = loop {
        let mut challenge = match result {
            OperationResult::Resources(linked) => break linked,
            OperationResult::Challenge(challenge) => challenge,
        };
        rounds += 1;
        if rounds > MAX_CHALLENGE_ROUNDS {
            return Err("institution kept asking MFA questions".into());
        }

        let mut input = stdin.lock();
        for question in challenge.questions_mut() {
            println!("{}", question.text);
            for choice in &question.choices {
                println!("  [{}] {}", choice.value, choice.label);
            }
            print!("> ");
            io::stdout().flush()?;
            let mut answer = String::new();
            input.read_line(&mut answer)?;
            question.set_answer(answer.trim());
        }
        drop(input);

        result = accounts
            .add_all_accounts_mfa(&challenge.session, customer_id, institution_id, &challenge)
            .await?;
    };

    println!("Linked {} account(s):", linked.len());
    for account in &linked {
        println!("{} | {} | {:?}", account.id, account.name, account.status);
    }

    Ok(())
}
