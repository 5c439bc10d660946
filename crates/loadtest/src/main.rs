use goose::prelude::*;
use std::env;

const PHONE_SAMPLES: &[&str] = &[
    "%28415%29%20234-5678",
    "%2B91%2098765%2043210",
    "1-748-234-5678",
    "098765%2043210",
];

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

/// Hits the page a QR code scan would load. Set PUBLIC_TOKEN to a real
/// profile's token; otherwise every request is a 404.
async fn get_public_profile(user: &mut GooseUser) -> TransactionResult {
    let token = env::var("PUBLIC_TOKEN").unwrap_or_else(|_| "0".repeat(64));
    let path = format!("/api/public/{token}");
    let mut goose = user.get(&path).await?;

    // 429 means the public page limiter is doing its job
    if let Ok(response) = &goose.response {
        if response.status().as_u16() == 429 {
            return user.set_success(&mut goose.request);
        }
    }
    Ok(())
}

async fn check_phone(user: &mut GooseUser) -> TransactionResult {
    let sample = PHONE_SAMPLES[user.weighted_users_index % PHONE_SAMPLES.len()];
    let path = format!("/api/phone/check?phone={sample}");
    let _goose_metrics = user.get(&path).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    if env::var("PUBLIC_TOKEN").is_err() {
        println!("No PUBLIC_TOKEN environment variable set; public page requests will 404");
    }

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("PublicPage").register_transaction(transaction!(get_public_profile)),
        )
        .register_scenario(scenario!("PhoneCheck").register_transaction(transaction!(check_phone)))
        .execute()
        .await?;

    Ok(())
}
