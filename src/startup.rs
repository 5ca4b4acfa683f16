use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{default_route, scrape_route},
    services::{MapsScraper, SessionLauncher},
};

pub fn run<L: SessionLauncher>(
    listener: TcpListener,
    scraper: MapsScraper<L>,
) -> Result<Server, std::io::Error> {
    let scraper = web::Data::new(scraper);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::QueryConfig::default().error_handler(scrape_route::query_error_handler))
            .service(default_route::default)
            .route("/scrape-get", web::get().to(scrape_route::scrape_get::<L>))
            .app_data(scraper.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
