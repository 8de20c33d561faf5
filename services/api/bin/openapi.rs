//! Writes the OpenAPI document of the smart home API to disk.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use smarthome_api::router::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    std::fs::write(&path, ApiDoc::openapi().to_pretty_json()?)?;
    println!("OpenAPI document written to {}", path);
    Ok(())
}
