//! Account and game-lobby endpoints. These only create users, sessions and
//! seats; all play happens over `/ws`.

use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::dataaccess::{Authenticator, DataAccessError, GameStore, UserStore};
use crate::error::ApiError;
use crate::game::Color;
use crate::models::{AppState, GameId, GameRecord};

#[derive(Deserialize, Debug)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateGameRequest {
    #[serde(rename = "gameName", default)]
    pub game_name: String,
}

#[derive(Deserialize, Debug)]
pub struct JoinGameRequest {
    #[serde(rename = "playerColor")]
    pub player_color: Option<Color>,
    #[serde(rename = "gameID")]
    pub game_id: Option<GameId>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    pub white_username: Option<String>,
    pub black_username: Option<String>,
    pub game_name: String,
}

impl From<GameRecord> for GameSummary {
    fn from(record: GameRecord) -> Self {
        Self {
            game_id: record.game_id,
            white_username: record.white_username,
            black_username: record.black_username,
            game_name: record.game_name,
        }
    }
}

/// Username behind the request's `authorization` header.
fn authorize(req: &HttpRequest, state: &AppState) -> Result<String, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError(DataAccessError::Unauthorized))?;
    state
        .store
        .resolve_token(token)?
        .ok_or(ApiError(DataAccessError::Unauthorized))
}

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let auth = state.store.register(&body.username, &body.password)?;
    Ok(HttpResponse::Ok().json(auth))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let auth = state.store.login(&body.username, &body.password)?;
    info!("{} logged in", auth.username);
    Ok(HttpResponse::Ok().json(auth))
}

pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError(DataAccessError::Unauthorized))?;
    state.store.logout(token)?;
    Ok(HttpResponse::Ok().json(json!({})))
}

pub async fn list_games(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    authorize(&req, &state)?;
    let games: Vec<GameSummary> = state
        .store
        .list_games()?
        .into_iter()
        .map(GameSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "games": games })))
}

pub async fn create_game(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateGameRequest>,
) -> Result<HttpResponse, ApiError> {
    let username = authorize(&req, &state)?;
    let game_id = state.store.create_game(&body.game_name)?;
    info!("{} created game {}", username, game_id);
    Ok(HttpResponse::Ok().json(json!({ "gameID": game_id })))
}

pub async fn join_game(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<JoinGameRequest>,
) -> Result<HttpResponse, ApiError> {
    let username = authorize(&req, &state)?;
    let (Some(color), Some(game_id)) = (body.player_color, body.game_id) else {
        return Err(ApiError(DataAccessError::BadRequest));
    };
    if game_id == 0 {
        return Err(ApiError(DataAccessError::BadRequest));
    }
    state.store.claim_seat(game_id, color, &username)?;
    Ok(HttpResponse::Ok().json(json!({})))
}
