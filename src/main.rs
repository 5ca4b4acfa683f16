use std::net::TcpListener;

use anyhow::Context;
use env_logger::Env;
use gmaps_scraper::{
    configuration::get_configuration,
    services::{ChromeLauncher, MapsScraper},
    startup::run,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration")?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;

    log::info!(
        "Listening on {}, webdriver at {} (max {} sessions)",
        address,
        configuration.webdriver.url,
        configuration.webdriver.max_sessions
    );

    let max_sessions = configuration.webdriver.max_sessions;
    let scraper = MapsScraper::new(
        ChromeLauncher::new(configuration.webdriver),
        configuration.scraper,
        configuration.selectors,
        max_sessions,
    );

    run(listener, scraper)?.await?;
    Ok(())
}
