use std::error::Error;

use api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env is optional; production deployments set these directly.
    let _ = dotenvy::dotenv();

    api::start().await?;

    Ok(())
}
