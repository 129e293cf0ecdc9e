use dbbroker_server::ServerBuilder;
use dbbroker_server::config::loader::{ConfigLocation, load_config};
use dbbroker_server::observability;

#[tokio::main]
async fn main() {
    load_dotenv();
    observability::init_tracing();

    let location = ConfigLocation::resolve(
        std::env::args().skip(1),
        std::env::var("DBBROKER_CONFIG").ok(),
    );
    let cfg = match load_config(Some(&location.path)) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("invalid configuration in {}: {err}", location.path);
            std::process::exit(2);
        }
    };
    tracing::info!(path = %location.path, source = location.source, "configuration loaded");
    observability::apply_logging_level(&cfg.logging.level);

    let server = match ServerBuilder::new().with_config(cfg).build() {
        Ok(server) => server,
        Err(err) => {
            eprintln!("broker startup failed: {err:#}");
            std::process::exit(2);
        }
    };

    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "broker stopped");
        std::process::exit(1);
    }
}

/// A missing `.env` is fine; a broken one is reported.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => eprintln!("ignoring .env: {err}"),
    }
}
