use dotenv::dotenv;
use quotation_tracker::app::App;
use quotation_tracker::util::logger::Logger;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_result = dotenv();
    let _logger = Logger::new()?;

    info!("Starting quotation tracker");
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {} (using system env vars)", e),
    }

    let app = App::new().await.map_err(|e| {
        error!("Failed to initialise application: {e}");
        e
    })?;
    app.start().await?;
    Ok(())
}
