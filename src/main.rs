#[macro_use]
extern crate async_trait;

use std::sync::Arc;

use tokio::runtime::Builder;
use tracing::{error, info};

mod config;
mod extension;
mod logging;
mod server;
mod settings;
mod store;

use extension::MessageExtension;
use settings::Settings;
use store::AppConfigurationClient;

fn main() {
    logging::init();

    match run() {
        Ok(_) => info!("[main] server stopped. Bye!"),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        },
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Arc::new(Settings::from_env()?);
    let client = AppConfigurationClient::new(&settings)?;
    info!(
        "[main] using configuration store {} with {} credential",
        client.endpoint(),
        client.credential().kind(),
    );

    let extension = Arc::new(MessageExtension::new(Arc::clone(&settings), Box::new(client)));
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(server::serve(extension, settings.port));
    return Ok(());
}
