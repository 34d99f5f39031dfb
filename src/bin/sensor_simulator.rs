//! Posts a simulated gunshot event to the backend, jittered around Nairobi.
//!
//! Usage: `sensor_simulator [api-base]` (default http://localhost:3000/api).

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    let api_base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:3000/api".to_string());

    let mut rng = rand::thread_rng();
    let event = json!({
        "sensorId": "sensor_alpha_01",
        "timestamp": Utc::now().to_rfc3339(),
        "location": {
            "type": "Point",
            "coordinates": [
                36.8219 + (rng.gen::<f64>() - 0.5) * 0.01,
                -1.2921 + (rng.gen::<f64>() - 0.5) * 0.01,
            ]
        }
    });

    println!("Sending simulated gunshot event...");
    println!("{}", serde_json::to_string_pretty(&event)?);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/event", api_base))
        .header("User-Agent", "SensorSimulator/1.0")
        .json(&event)
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("Response status: {}", status);
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        anyhow::bail!("simulation failed: HTTP {}", status);
    }

    println!(
        "Simulation successful! Alert created with ID: {}",
        body["alert"]["id"]
    );
    Ok(())
}
