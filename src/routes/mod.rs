use actix_web::{web, HttpResponse, Responder};

pub mod api;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess sync server: connect a client to /ws")
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/user").route(web::post().to(api::register)))
        .service(
            web::resource("/session")
                .route(web::post().to(api::login))
                .route(web::delete().to(api::logout)),
        )
        .service(
            web::resource("/game")
                .route(web::get().to(api::list_games))
                .route(web::post().to(api::create_game))
                .route(web::put().to(api::join_game)),
        );
}
