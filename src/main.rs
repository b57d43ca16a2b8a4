/*
 * Responsibility
 * - Start the tokio runtime
 * - Call app::run() (no logic lives here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cdn_api::app::run().await
}
