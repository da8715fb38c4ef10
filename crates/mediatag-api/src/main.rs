use mediatag_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, storage, services, routes)
    let (_state, router) = mediatag_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    mediatag_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
