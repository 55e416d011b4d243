use actix_files as fs;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use log::{info, warn};

use chess_sync_server::config::Config;
use chess_sync_server::models::AppState;
use chess_sync_server::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::parse();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_level.clone()));

    let app_state = web::Data::new(AppState::in_memory(config.heartbeat()));

    let static_dir = config.static_dir.is_dir().then(|| config.static_dir.clone());
    if static_dir.is_none() {
        warn!(
            "Static directory {} not found; /static will not be served",
            config.static_dir.display()
        );
    }

    info!("Starting chess server at http://{}", config.bind);

    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .configure(routes::configure_routes);
        if let Some(dir) = &static_dir {
            app = app.service(fs::Files::new("/static", dir).index_file("index.html"));
        }
        app
    })
    .bind(&config.bind)?
    .run()
    .await
}
