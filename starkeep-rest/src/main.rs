use std::{io, time::Duration};

use actix_web::{web::Data, HttpServer};
use starkeep_rest::{config::AppConfig, create_app};
use tracing::info;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt::init();

    let config = AppConfig::default();

    let ctx = config
        .create_context()
        .map(Data::new)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    if config.serverless {
        info!("serverless mode: retention sweeps are left to an external trigger");
    } else {
        let sweeper_ctx = ctx.clone();

        actix_rt::spawn(async move {
            let mut interval = actix_rt::time::interval(SWEEP_INTERVAL);

            loop {
                interval.tick().await;
                starkeep::retention::sweep(&sweeper_ctx);
            }
        });
    }

    let addr = config.socket_addr();
    info!("listening on {addr}");

    HttpServer::new(move || create_app!(ctx))
        .bind(addr)?
        .run()
        .await
}
