//! Runs a fixed battery of events through the serverless handler.
//!
//! Takes no flags. Artifact locations follow the usual environment and
//! configuration overrides.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use churn_gateway::config::AppConfig;
use churn_gateway::handler::{ChurnHandler, InvocationContext};
use churn_gateway::metrics::MetricsRegistry;
use churn_model::cache::PredictorCache;

fn scenarios() -> Vec<(&'static str, Value)> {
    let germany = json!({
        "Geography": "Germany",
        "Gender": "Male",
        "Age": 35,
        "CreditScore": 750,
        "Tenure": 5,
        "Balance": 100_000.0,
        "EstimatedSalary": 75000,
        "NumOfProducts": 2,
        "HasCrCard": 1,
        "IsActiveMember": 1
    });

    vec![
        (
            "Valid customer data",
            json!({
                "Geography": "France",
                "Gender": "Female",
                "Age": 42,
                "CreditScore": 600,
                "Tenure": 3,
                "Balance": 0.0,
                "EstimatedSalary": 50000,
                "NumOfProducts": 1,
                "HasCrCard": 1,
                "IsActiveMember": 1
            }),
        ),
        (
            "API Gateway format",
            json!({ "body": germany.to_string() }),
        ),
        (
            "Missing required fields",
            json!({ "Geography": "Spain", "Gender": "Female", "Age": 30 }),
        ),
        (
            "High churn risk customer",
            json!({
                "Geography": "Germany",
                "Gender": "Female",
                "Age": 55,
                "CreditScore": 400,
                "Tenure": 1,
                "Balance": 0.0,
                "EstimatedSalary": 30000,
                "NumOfProducts": 4,
                "HasCrCard": 0,
                "IsActiveMember": 0
            }),
        ),
        ("Malformed body", json!({ "body": "{bad" })),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = AppConfig::from_env()?;
    let locator = config.artifacts.locator();

    let paths = locator.resolve();
    println!("Checking model files...");
    for (label, path) in [("Model", &paths.model), ("Model columns", &paths.manifest)] {
        if path.exists() {
            println!("  {label} file: {} [found]", path.display());
        } else {
            println!("  {label} file: {} [MISSING]", path.display());
        }
    }

    let handler = ChurnHandler::new(
        Arc::new(PredictorCache::from_locator(locator)),
        Arc::new(MetricsRegistry::new()),
    );

    for (i, (name, event)) in scenarios().into_iter().enumerate() {
        println!("\n=== Test {}: {name} ===", i + 1);
        let ctx = InvocationContext::with_request_id(format!("scenario-{}", i + 1));
        let response = handler.handle(event, &ctx).await;

        println!("Status Code: {}", response.status_code);
        let body = match response.body_json() {
            Ok(json) => serde_json::to_string_pretty(&json)?,
            Err(_) => response.body.clone(),
        };
        println!("Response: {body}");
    }

    println!(
        "\nArtifact load attempts: {}",
        handler.cache().load_attempts()
    );
    Ok(())
}
