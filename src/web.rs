use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::board::{Player, Position};
use crate::config::ServerConfig;
use crate::error::{GameError, StoreError};
use crate::game::{Outcome, Scores, Selection, TurnPhase};
use crate::history::GameRecord;
use crate::movegen::Move;
use crate::save::{BoardShape, PlayerNames, board_shape};
use crate::session::GameSession;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<GameSession>>,
}

impl AppState {
    pub fn new(session: GameSession) -> Self {
        AppState {
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn session(&self) -> Arc<Mutex<GameSession>> {
        Arc::clone(&self.session)
    }
}

#[derive(Serialize, Deserialize, Default)]
pub struct NewGameRequest {
    #[serde(default)]
    black_name: String,
    #[serde(default)]
    white_name: String,
}

#[derive(Serialize, Deserialize)]
pub struct SquareRequest {
    row: usize,
    col: usize,
}

#[derive(Serialize)]
pub struct OutcomeResponse {
    #[serde(flatten)]
    outcome: Outcome,
    winner_name: Option<String>,
    reason_text: String,
}

#[derive(Serialize, Default)]
pub struct GameResponse {
    active: bool,
    has_saved_game: bool,
    board: BoardShape,
    current_player: Option<Player>,
    black_name: String,
    white_name: String,
    scores: Scores,
    moves_since_pawn_or_capture: u32,
    remaining_time: u64,
    low_time: bool,
    paused: bool,
    phase: Option<TurnPhase>,
    capture_mandatory: bool,
    capturing_pieces: Vec<Position>,
    selection: Option<Selection>,
    legal_moves: Vec<Move>,
    outcome: Option<OutcomeResponse>,
    message: String,
}

fn rejection(err: &GameError) -> Response {
    let status = match err {
        GameError::GameOver
        | GameError::GamePaused
        | GameError::ChainInProgress
        | GameError::NoActiveGame => StatusCode::CONFLICT,
        GameError::InternalInconsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(serde_json::json!({
            "error": err.reason_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

fn storage_failure(err: &StoreError) -> Response {
    error!(error = %err, "storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "storage",
            "message": err.to_string(),
        })),
    )
        .into_response()
}

fn snapshot(session: &GameSession, message: String) -> GameResponse {
    let names = session.names();
    let mut response = GameResponse {
        has_saved_game: session.has_saved_game(),
        black_name: names.black.clone(),
        white_name: names.white.clone(),
        remaining_time: session.clock().remaining(),
        low_time: session.low_time(),
        paused: session.is_paused(),
        message,
        ..GameResponse::default()
    };

    let Some(game) = session.game() else {
        return response;
    };

    response.active = !game.is_game_over();
    response.board = board_shape(game.board());
    response.current_player = Some(game.current_player());
    response.scores = game.scores();
    response.moves_since_pawn_or_capture = game.moves_since_progress();
    response.phase = Some(game.phase());
    response.capture_mandatory = game.capture_mandatory();
    response.capturing_pieces = game.capturing_pieces();
    response.selection = game.selection().cloned();
    response.legal_moves = game.legal_moves();
    response.outcome = game.outcome().map(|outcome| OutcomeResponse {
        outcome: *outcome,
        winner_name: outcome.winner().map(|w| names.get(w).to_string()),
        reason_text: outcome.reason().to_string(),
    });
    response
}

#[axum::debug_handler]
async fn new_game(
    State(app_state): State<AppState>,
    req: Option<Json<NewGameRequest>>,
) -> Response {
    let Json(req) = req.unwrap_or_default();
    let mut session = app_state.session.lock().unwrap();
    session.start_new_game(PlayerNames::new(req.black_name, req.white_name));
    Json(snapshot(&session, "New game started".to_string())).into_response()
}

async fn load_game(State(app_state): State<AppState>) -> Response {
    let mut session = app_state.session.lock().unwrap();
    match session.load_game() {
        Ok(true) => Json(snapshot(&session, "Saved game loaded".to_string())).into_response(),
        Ok(false) => Json(snapshot(&session, "No saved game".to_string())).into_response(),
        Err(e) => storage_failure(&e),
    }
}

async fn select_piece(
    State(app_state): State<AppState>,
    Json(req): Json<SquareRequest>,
) -> Response {
    let mut session = app_state.session.lock().unwrap();
    match session.select(Position::new(req.row, req.col)) {
        Ok(moves) => {
            let message = format!("{} possible move(s)", moves.len());
            Json(snapshot(&session, message)).into_response()
        }
        Err(e) => rejection(&e),
    }
}

async fn deselect(State(app_state): State<AppState>) -> Response {
    let mut session = app_state.session.lock().unwrap();
    match session.deselect() {
        Ok(()) => Json(snapshot(&session, String::new())).into_response(),
        Err(e) => rejection(&e),
    }
}

#[axum::debug_handler]
async fn make_move(State(app_state): State<AppState>, Json(req): Json<SquareRequest>) -> Response {
    let mut session = app_state.session.lock().unwrap();
    match session.choose_destination(Position::new(req.row, req.col)) {
        Ok(report) => {
            let message = if let Some(outcome) = report.outcome {
                format!("Game over: {}", outcome)
            } else if report.continuation {
                "Multiple capture: keep jumping".to_string()
            } else if report.promoted {
                "Crowned!".to_string()
            } else {
                String::new()
            };
            Json(snapshot(&session, message)).into_response()
        }
        Err(e) => rejection(&e),
    }
}

async fn resign(State(app_state): State<AppState>) -> Response {
    let mut session = app_state.session.lock().unwrap();
    match session.resign() {
        Ok(outcome) => {
            Json(snapshot(&session, format!("Game over: {}", outcome))).into_response()
        }
        Err(e) => rejection(&e),
    }
}

async fn pause(State(app_state): State<AppState>) -> Response {
    let mut session = app_state.session.lock().unwrap();
    match session.toggle_pause() {
        Ok(paused) => {
            let message = if paused { "Paused" } else { "Resumed" };
            Json(snapshot(&session, message.to_string())).into_response()
        }
        Err(e) => rejection(&e),
    }
}

async fn get_game_state(State(app_state): State<AppState>) -> Json<GameResponse> {
    let session = app_state.session.lock().unwrap();
    Json(snapshot(&session, String::new()))
}

async fn get_history(State(app_state): State<AppState>) -> Response {
    let session = app_state.session.lock().unwrap();
    match session.history() {
        Ok(history) => Json::<Vec<GameRecord>>(history).into_response(),
        Err(e) => storage_failure(&e),
    }
}

async fn get_wins(State(app_state): State<AppState>) -> Response {
    let session = app_state.session.lock().unwrap();
    match session.win_counts() {
        Ok(wins) => {
            let ranking: Vec<serde_json::Value> = wins
                .ranking()
                .into_iter()
                .map(|(name, wins)| serde_json::json!({ "name": name, "wins": wins }))
                .collect();
            Json(ranking).into_response()
        }
        Err(e) => storage_failure(&e),
    }
}

/// The JSON API without static files or request tracing.
pub fn api_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/new-game", post(new_game))
        .route("/api/load-game", post(load_game))
        .route("/api/select", post(select_piece))
        .route("/api/deselect", post(deselect))
        .route("/api/move", post(make_move))
        .route("/api/resign", post(resign))
        .route("/api/pause", post(pause))
        .route("/api/game-state", get(get_game_state))
        .route("/api/history", get(get_history))
        .route("/api/wins", get(get_wins))
        .with_state(app_state)
}

/// Drive the turn clock once per second. Ticks take the same lock as requests,
/// so an expiry never interleaves with a move.
pub fn spawn_clock(app_state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await;
        loop {
            interval.tick().await;
            let mut session = app_state.session.lock().unwrap();
            if session.tick() {
                info!("turn passed on time");
            }
        }
    })
}

pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&config.data_dir)?;
    let app_state = AppState::new(GameSession::new(config.game.clone(), store));
    let clock = spawn_clock(app_state.clone());

    let app = api_router(app_state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "checkers server listening");

    let served = axum::serve(listener, app).await;
    clock.abort();
    served?;
    Ok(())
}
