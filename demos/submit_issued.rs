use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;
use sii::core::*;
use sii::submit::Submitter;
use sii::transport::{ClientConfig, ClientIdentity, Environment, RetryPolicy, SiiClient};

#[tokio::main]
async fn main() {
    // Certificate material comes from wherever the deployment keeps it;
    // this demo reads the paths from the environment.
    let archive = match std::env::var("SII_PKCS12_PATH") {
        Ok(path) => std::fs::read(path).expect("readable PKCS#12 archive"),
        Err(_) => {
            eprintln!("set SII_PKCS12_PATH (and optionally SII_PKCS12_PASS) to run this demo");
            return;
        }
    };
    let passphrase = std::env::var("SII_PKCS12_PASS").ok();

    let mut config = ClientConfig::new(
        Environment::Sandbox,
        ClientIdentity::pkcs12(archive, passphrase),
    );
    config.timeout = Duration::from_secs(20);
    config.retry = RetryPolicy {
        max_attempts: 4,
        initial_delay: Duration::from_secs(1),
        multiplier: 2.0,
        max_delay: Duration::from_secs(30),
    };

    let client = SiiClient::new(config).expect("client construction");
    let submitter = Submitter::new(client);

    let holder = Party::new("B76365789", "ACME Ibérica SL");
    let today = Utc::now().date_naive();

    let batch = SubmissionBatch::issued(
        holder.clone(),
        today.format("%Y").to_string().parse().unwrap_or(2026),
        PeriodCode::Month(u8::try_from(chrono::Datelike::month(&today)).unwrap_or(1)),
        vec![
            IssuedInvoiceBuilder::new("FA-2026-0042", today - chrono::Duration::days(1), InvoiceType::F1)
                .issuer(holder)
                .counterparty(Party::new("87654321K", "Cliente Ejemplo"))
                .description("Desarrollo de software")
                .add_line(VatLineBuilder::new("01", dec!(1200.00), dec!(21.00)).build())
                .total(dec!(1452.00))
                .build(),
        ],
    );

    match submitter.submit(&batch).await {
        Ok(result) => {
            println!(
                "submission {}: {} accepted, {} rejected",
                result.submission_id.as_deref().unwrap_or("-"),
                result.accepted,
                result.rejected
            );
            for outcome in &result.outcomes {
                println!(
                    "  [{}] {} -> {}",
                    outcome.book,
                    outcome.invoice_number,
                    if outcome.accepted { "accepted" } else { "rejected" }
                );
            }
        }
        Err(error) => eprintln!("submission failed: {error}"),
    }
}
