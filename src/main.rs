mod api;
mod config;
mod error;
mod finger_table;
mod identifier;
mod node;
mod record;
mod ring;
mod rpc_client;
mod store;
mod wire;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{error, info, warn, LevelFilter};

use config::Config;
use ring::Ring;
use wire::JoinRequest;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cfg = Config::parse();
    if let Err(message) = cfg.validate() {
        eprintln!("invalid configuration: {message}");
        std::process::exit(1);
    }

    simple_logger::SimpleLogger::new().env().with_level(LevelFilter::Info).init().unwrap();

    let ring = Ring::new(&cfg).map_err(|e| std::io::Error::other(e.to_string()))?;
    let ring = web::Data::new(ring);

    info!("starting node {} (m = {})", cfg.own_addr(), cfg.ft_size);

    let server = HttpServer::new({
        let ring = ring.clone();
        move || App::new().app_data(ring.clone()).configure(api::configure)
    })
    .workers(4)
    .bind((cfg.host.as_str(), cfg.port))?
    .run();

    actix_rt::spawn({
        let ring = ring.clone();
        let request = JoinRequest::from_config(&cfg);
        async move {
            match ring.join(request).await {
                Ok(num_hops) => info!("startup join completed in {num_hops} hop(s)"),
                Err(e) => {
                    error!("startup join failed: {e}");
                    warn!("{} is up but not part of any ring; join manually via POST /join", ring.own_addr());
                }
            }
        }
    });

    server.await
}
