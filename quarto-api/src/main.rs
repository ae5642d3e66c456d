//! Quarto match server.
//!
//! HTTP orchestrator around quarto-core: it owns match creation,
//! per-request turn/stage validation, persistence of the serialized
//! game text keyed by the participant pair, and the Elo bookkeeping
//! applied when a match concludes. All game rules live in the core;
//! this binary is glue.
//!
//! Single-writer discipline: one mutex guards the store, and every
//! handler runs load -> mutate -> persist under it, so at most one
//! select/place is in flight per match.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use quarto_core::{
    label_for_code, next_rating, win_probability, Game, Line, PlaceOutcome, Player, SelectOutcome,
    Stage, Status, Trait, BOARD_DIM,
};

// =============================================================================
// Store
// =============================================================================

/// Starting Elo for players seen for the first time.
const DEFAULT_ELO: i64 = 1000;

/// SQLite-backed store for serialized matches and player ratings.
struct Store {
    conn: Connection,
}

/// A player's rating row.
#[derive(Debug, Clone, Copy, Serialize)]
struct Rating {
    wins: i64,
    losses: i64,
    elo: i64,
}

impl Store {
    fn open(path: &str) -> Result<Store, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS matches (
                player_a INTEGER NOT NULL,
                player_b INTEGER NOT NULL,
                state    TEXT NOT NULL,
                PRIMARY KEY (player_a, player_b)
            );
            CREATE TABLE IF NOT EXISTS ratings (
                player INTEGER PRIMARY KEY,
                wins   INTEGER NOT NULL,
                losses INTEGER NOT NULL,
                elo    INTEGER NOT NULL
            );",
        )?;
        Ok(Store { conn })
    }

    fn load_match(&self, a: u64, b: u64) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT state FROM matches WHERE player_a = ?1 AND player_b = ?2",
                params![a as i64, b as i64],
                |row| row.get(0),
            )
            .optional()
    }

    fn save_match(&self, a: u64, b: u64, state: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO matches (player_a, player_b, state) VALUES (?1, ?2, ?3)
             ON CONFLICT (player_a, player_b) DO UPDATE SET state = excluded.state",
            params![a as i64, b as i64, state],
        )?;
        Ok(())
    }

    fn delete_match(&self, a: u64, b: u64) -> rusqlite::Result<()> {
        self.conn.execute(
            "DELETE FROM matches WHERE player_a = ?1 AND player_b = ?2",
            params![a as i64, b as i64],
        )?;
        Ok(())
    }

    fn rating(&self, player: u64) -> rusqlite::Result<Option<Rating>> {
        self.conn
            .query_row(
                "SELECT wins, losses, elo FROM ratings WHERE player = ?1",
                params![player as i64],
                |row| {
                    Ok(Rating {
                        wins: row.get(0)?,
                        losses: row.get(1)?,
                        elo: row.get(2)?,
                    })
                },
            )
            .optional()
    }

    fn ensure_rating(&self, player: u64) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO ratings (player, wins, losses, elo) VALUES (?1, 0, 0, ?2)",
            params![player as i64, DEFAULT_ELO],
        )?;
        Ok(())
    }

    fn put_rating(&self, player: u64, rating: Rating) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE ratings SET wins = ?2, losses = ?3, elo = ?4 WHERE player = ?1",
            params![player as i64, rating.wins, rating.losses, rating.elo],
        )?;
        Ok(())
    }
}

/// Shared application state.
struct AppStateInner {
    store: Mutex<Store>,
}

type AppState = Arc<AppStateInner>;

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Serialize)]
struct CellModel {
    label: String,
    code: u32,
}

#[derive(Serialize)]
struct MatchModel {
    id: String,
    player_a: u64,
    player_b: u64,
    board: Vec<Vec<CellModel>>,
    turn: Player,
    stage: Stage,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    win_line: Option<Line>,
    last_xy: (usize, usize),
    /// Label of the piece currently handed to the placer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<String>,
    remaining: Vec<String>,
    message_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[derive(Deserialize)]
struct CreateMatchRequest {
    player_a: u64,
    player_b: u64,
}

#[derive(Deserialize)]
struct SelectRequest {
    player: u64,
    label: String,
}

#[derive(Deserialize)]
struct PlaceRequest {
    player: u64,
    x: usize,
    y: usize,
}

#[derive(Serialize)]
struct HealthModel {
    status: String,
}

#[derive(Serialize)]
struct ErrorModel {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorModel>);

fn bad_request(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorModel {
            detail: detail.into(),
        }),
    )
}

fn not_found(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorModel {
            detail: detail.into(),
        }),
    )
}

fn db_error(err: rusqlite::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorModel {
            detail: format!("store error: {err}"),
        }),
    )
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Convert a Game to its JSON view for the given participant pair.
fn match_to_model(game: &Game, player_a: u64, player_b: u64, note: Option<String>) -> MatchModel {
    let dim = game.board().dim();
    let mut rows = Vec::with_capacity(dim);
    for x in 0..dim {
        let mut cells = Vec::with_capacity(dim);
        for y in 0..dim {
            let code = game.board().cell(x, y);
            cells.push(CellModel {
                label: label_for_code(code).to_string(),
                code,
            });
        }
        rows.push(cells);
    }

    let selected = game.last_selected();
    MatchModel {
        id: game.id().to_string(),
        player_a,
        player_b,
        board: rows,
        turn: game.turn(),
        stage: game.stage(),
        status: game.status(),
        win_line: game.win_line(),
        last_xy: game.last_xy(),
        selected: (!selected.is_null()).then(|| selected.label().to_string()),
        remaining: game.pool().iter().map(|p| p.label().to_string()).collect(),
        message_token: game.last_message().to_string(),
        note,
    }
}

fn line_name(line: Line) -> &'static str {
    match line {
        Line::Row => "row",
        Line::Col => "col",
        Line::MainDiag => "diag1",
        Line::AntiDiag => "diag2",
    }
}

fn trait_name(shared: Trait) -> &'static str {
    match shared {
        Trait::Light => "light",
        Trait::Dark => "dark",
        Trait::Round => "round",
        Trait::Square => "square",
        Trait::Tall => "tall",
        Trait::Short => "short",
        Trait::Full => "full",
        Trait::Hollow => "hollow",
    }
}

/// Look up the match for a pair in either order; the stored order is
/// canonical (first player = Player::One).
fn load_pair(store: &Store, a: u64, b: u64) -> rusqlite::Result<Option<(u64, u64, String)>> {
    if let Some(text) = store.load_match(a, b)? {
        return Ok(Some((a, b, text)));
    }
    if let Some(text) = store.load_match(b, a)? {
        return Ok(Some((b, a, text)));
    }
    Ok(None)
}

/// Stored state is only ever written by this process, so a parse
/// failure is our fault, not the client's.
fn parse_game(text: &str) -> Result<Game, ApiError> {
    Game::from_text(text).map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorModel {
                detail: format!("stored match state is corrupt: {err}"),
            }),
        )
    })
}

fn player_on_turn(game: &Game, player_a: u64, player_b: u64) -> u64 {
    match game.turn() {
        Player::One => player_a,
        Player::Two => player_b,
    }
}

/// Apply the Elo update for a concluded match. Returns the old and new
/// ratings, or None (changing nothing) when either participant has no
/// rating row - the match still concludes.
fn apply_ratings(
    store: &Store,
    winner: u64,
    loser: u64,
) -> rusqlite::Result<Option<(i64, i64, i64, i64)>> {
    let (Some(w), Some(l)) = (store.rating(winner)?, store.rating(loser)?) else {
        return Ok(None);
    };
    let p_winner = win_probability(w.elo, l.elo);
    let p_loser = 1.0 - p_winner;
    let winner_elo = next_rating(w.elo, p_winner, true);
    let loser_elo = next_rating(l.elo, p_loser, false);
    store.put_rating(
        winner,
        Rating {
            wins: w.wins + 1,
            losses: w.losses,
            elo: winner_elo,
        },
    )?;
    store.put_rating(
        loser,
        Rating {
            wins: l.wins,
            losses: l.losses + 1,
            elo: loser_elo,
        },
    )?;
    Ok(Some((w.elo, winner_elo, l.elo, loser_elo)))
}

// =============================================================================
// API Endpoints
// =============================================================================

async fn create_match(
    State(state): State<AppState>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<Json<MatchModel>, ApiError> {
    if req.player_a == req.player_b {
        return Err(bad_request("a match needs two distinct players"));
    }

    let store = state.store.lock().unwrap();
    if load_pair(&store, req.player_a, req.player_b)
        .map_err(db_error)?
        .is_some()
    {
        return Err(bad_request(
            "these players already have an unfinished match",
        ));
    }

    store.ensure_rating(req.player_a).map_err(db_error)?;
    store.ensure_rating(req.player_b).map_err(db_error)?;

    let mut game = Game::new(Uuid::new_v4().to_string());
    game.set_last_message(Uuid::new_v4().to_string());
    store
        .save_match(req.player_a, req.player_b, &game.to_text())
        .map_err(db_error)?;
    info!(
        id = game.id(),
        player_a = req.player_a,
        player_b = req.player_b,
        "match created"
    );

    Ok(Json(match_to_model(
        &game,
        req.player_a,
        req.player_b,
        None,
    )))
}

async fn get_match(
    State(state): State<AppState>,
    Path((a, b)): Path<(u64, u64)>,
) -> Result<Json<MatchModel>, ApiError> {
    let store = state.store.lock().unwrap();
    let (p1, p2, text) = load_pair(&store, a, b)
        .map_err(db_error)?
        .ok_or_else(|| not_found("no active match between these players"))?;
    let game = parse_game(&text)?;
    Ok(Json(match_to_model(&game, p1, p2, None)))
}

async fn select_piece(
    State(state): State<AppState>,
    Path((a, b)): Path<(u64, u64)>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<MatchModel>, ApiError> {
    let store = state.store.lock().unwrap();
    let (p1, p2, text) = load_pair(&store, a, b)
        .map_err(db_error)?
        .ok_or_else(|| not_found("no active match between these players"))?;
    let mut game = parse_game(&text)?;

    if req.player != p1 && req.player != p2 {
        return Err(bad_request("only the two participants may play"));
    }
    if game.stage() != Stage::Selecting {
        return Err(bad_request("this is not the selection stage of the match"));
    }
    if req.player != player_on_turn(&game, p1, p2) {
        return Err(bad_request("it's not your turn, wait for your opponent"));
    }

    match game.select(&req.label) {
        SelectOutcome::Unavailable => Err(bad_request("that piece is already taken")),
        SelectOutcome::PoolExhausted => {
            store.delete_match(p1, p2).map_err(db_error)?;
            info!(id = game.id(), "match drawn with an exhausted pool");
            Ok(Json(match_to_model(
                &game,
                p1,
                p2,
                Some("The game is a draw!".to_string()),
            )))
        }
        SelectOutcome::Selected => {
            if game.is_full() {
                game.declare_draw();
                store.delete_match(p1, p2).map_err(db_error)?;
                info!(id = game.id(), "match drawn on a full board");
                return Ok(Json(match_to_model(
                    &game,
                    p1,
                    p2,
                    Some("The game is a draw!".to_string()),
                )));
            }
            game.set_last_message(Uuid::new_v4().to_string());
            store
                .save_match(p1, p2, &game.to_text())
                .map_err(db_error)?;
            Ok(Json(match_to_model(&game, p1, p2, None)))
        }
    }
}

async fn place_piece(
    State(state): State<AppState>,
    Path((a, b)): Path<(u64, u64)>,
    Json(req): Json<PlaceRequest>,
) -> Result<Json<MatchModel>, ApiError> {
    let store = state.store.lock().unwrap();
    let (p1, p2, text) = load_pair(&store, a, b)
        .map_err(db_error)?
        .ok_or_else(|| not_found("no active match between these players"))?;
    let mut game = parse_game(&text)?;

    if req.player != p1 && req.player != p2 {
        return Err(bad_request("only the two participants may play"));
    }
    if game.stage() != Stage::Placing {
        return Err(bad_request("this is not the placement stage of the match"));
    }
    if req.player != player_on_turn(&game, p1, p2) {
        return Err(bad_request("it's not your turn, wait for your opponent"));
    }
    if req.x >= BOARD_DIM || req.y >= BOARD_DIM {
        return Err(bad_request("coordinates out of range"));
    }

    match game.place(req.x, req.y).map_err(|e| bad_request(e.to_string()))? {
        PlaceOutcome::CellOccupied => Err(bad_request("you selected a non-empty cell")),
        PlaceOutcome::Win { line, shared } => {
            let winner = player_on_turn(&game, p1, p2);
            let loser = if winner == p1 { p2 } else { p1 };
            let mut note = format!(
                "Player {} won by {} with {} pieces",
                game.turn().code(),
                line_name(line),
                trait_name(shared),
            );
            match apply_ratings(&store, winner, loser).map_err(db_error)? {
                Some((winner_old, winner_new, loser_old, loser_new)) => {
                    note.push_str(&format!(
                        ". Winner rating {winner_old} -> {winner_new}, loser {loser_old} -> {loser_new}"
                    ));
                }
                None => {
                    note.push_str(". The players' ratings could not be retrieved and were not updated");
                }
            }
            store.delete_match(p1, p2).map_err(db_error)?;
            info!(id = game.id(), winner, loser, "match won");
            Ok(Json(match_to_model(&game, p1, p2, Some(note))))
        }
        PlaceOutcome::Placed => {
            if game.is_full() {
                game.declare_draw();
                store.delete_match(p1, p2).map_err(db_error)?;
                info!(id = game.id(), "match drawn on a full board");
                return Ok(Json(match_to_model(
                    &game,
                    p1,
                    p2,
                    Some("The game ended in a draw!".to_string()),
                )));
            }
            game.begin_selection();
            game.set_last_message(Uuid::new_v4().to_string());
            store
                .save_match(p1, p2, &game.to_text())
                .map_err(db_error)?;
            Ok(Json(match_to_model(&game, p1, p2, None)))
        }
    }
}

async fn get_rating(
    State(state): State<AppState>,
    Path(player): Path<u64>,
) -> Result<Json<Rating>, ApiError> {
    let store = state.store.lock().unwrap();
    let rating = store
        .rating(player)
        .map_err(db_error)?
        .ok_or_else(|| not_found("this player has no rating yet"))?;
    Ok(Json(rating))
}

async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let db_path = std::env::var("QUARTO_DB").unwrap_or_else(|_| "quarto.db".to_string());
    let store = Store::open(&db_path).expect("failed to open the match store");
    info!(path = %db_path, "match store ready");

    let state: AppState = Arc::new(AppStateInner {
        store: Mutex::new(store),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/matches", post(create_match))
        .route("/matches/{a}/{b}", get(get_match))
        .route("/matches/{a}/{b}/select", post(select_piece))
        .route("/matches/{a}/{b}/place", post(place_piece))
        .route("/ratings/{player}", get(get_rating))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state);

    let addr = std::env::var("QUARTO_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!(%addr, "quarto API running");
    axum::serve(listener, app).await.unwrap();
}
