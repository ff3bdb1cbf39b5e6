//! Web server exposing the tournament engine as a REST API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use dart_tournament::logic::{group_name, knockout};
use dart_tournament::models::MatchId;
use dart_tournament::{
    advance_phase, create_groups, import_roster, reset_current_phase_results,
    reset_to_group_phase, start_tournament, submit_group_result, MatchScore, NodeId, PlayerId,
    ServerConfig, Tournament, TournamentError, TournamentId, TournamentSettings,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-tournament entry: tournament data + last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID. Entries are removed after inactivity.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    settings: TournamentSettings,
}

fn default_name() -> String {
    "Dart Tournament".to_string()
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
}

#[derive(Deserialize)]
struct CreateGroupsBody {
    count: usize,
}

#[derive(Deserialize)]
struct GiveByeBody {
    #[serde(default)]
    winner: Option<PlayerId>,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct TournamentPlayerPath {
    id: TournamentId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct GroupMatchPath {
    id: TournamentId,
    group: usize,
    match_id: MatchId,
}

/// Path segments: tournament id and node id as printed (e.g. /nodes/W3).
#[derive(Deserialize)]
struct NodePath {
    id: TournamentId,
    node: String,
}

fn error_response(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Run `op` on one tournament, refresh its activity time, log the events it
/// emitted and answer with the updated tournament.
fn with_tournament<F>(state: &AppState, id: TournamentId, op: F) -> HttpResponse
where
    F: FnOnce(&mut Tournament) -> Result<(), TournamentError>,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    let result = op(&mut *t);
    for event in t.take_events() {
        log::debug!("Tournament {id}: {event:?}");
    }
    match result {
        Ok(()) => HttpResponse::Ok().json(&*t),
        Err(e) => {
            log::warn!("Tournament {id}: rejected: {e}");
            error_response(e)
        }
    }
}

fn parse_node(raw: &str) -> Result<NodeId, HttpResponse> {
    raw.parse::<NodeId>().map_err(error_response)
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "dart-tournament",
    })
}

/// Create a new tournament (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Option<Json<CreateTournamentBody>>) -> HttpResponse {
    let (name, settings) = match body {
        Some(b) => {
            let b = b.into_inner();
            (b.name, b.settings)
        }
        None => (default_name(), TournamentSettings::default()),
    };
    if let Err(e) = settings.validate() {
        return error_response(e);
    }
    let tournament = Tournament::new(name, settings);
    let id = tournament.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    log::info!("Created tournament {id}");
    let response = HttpResponse::Ok().json(&tournament);
    g.insert(
        id,
        TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        },
    );
    response
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |_| Ok(()))
}

#[post("/api/tournaments/{id}/players")]
async fn api_add_player(state: AppState, path: Path<TournamentPath>, body: Json<AddPlayerBody>) -> HttpResponse {
    with_tournament(&state, path.id, |t| t.add_player(body.name.trim()).map(|_| ()))
}

#[delete("/api/tournaments/{id}/players/{player_id}")]
async fn api_remove_player(state: AppState, path: Path<TournamentPlayerPath>) -> HttpResponse {
    with_tournament(&state, path.id, |t| t.remove_player(path.player_id))
}

/// Upload a CSV roster (`name[,seed]` per row) as the request body.
#[post("/api/tournaments/{id}/roster")]
async fn api_import_roster(state: AppState, path: Path<TournamentPath>, body: String) -> HttpResponse {
    with_tournament(&state, path.id, |t| import_roster(t, body.as_bytes()).map(|_| ()))
}

#[post("/api/tournaments/{id}/groups")]
async fn api_create_groups(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<CreateGroupsBody>,
) -> HttpResponse {
    with_tournament(&state, path.id, |t| {
        create_groups(t, body.count)?;
        log::info!(
            "Tournament {}: {} groups created ({} .. {})",
            t.id,
            body.count,
            group_name(0),
            group_name(body.count.saturating_sub(1))
        );
        Ok(())
    })
}

/// Start the tournament (Setup -> Running).
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, start_tournament)
}

/// Record a group (or round-robin finals) match result.
#[put("/api/tournaments/{id}/groups/{group}/matches/{match_id}")]
async fn api_group_result(
    state: AppState,
    path: Path<GroupMatchPath>,
    body: Json<MatchScore>,
) -> HttpResponse {
    with_tournament(&state, path.id, |t| {
        submit_group_result(t, path.group, path.match_id, body.into_inner())
    })
}

/// Move to the next phase once every match of the current one is decided.
#[post("/api/tournaments/{id}/advance")]
async fn api_advance(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, |t| advance_phase(t).map(|_| ()))
}

#[get("/api/tournaments/{id}/bracket")]
async fn api_bracket(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    match entry.tournament.bracket() {
        Some(bracket) => HttpResponse::Ok().json(bracket),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No bracket in the current phase" })),
    }
}

#[post("/api/tournaments/{id}/nodes/{node}/start")]
async fn api_start_match(state: AppState, path: Path<NodePath>) -> HttpResponse {
    let node = match parse_node(&path.node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    with_tournament(&state, path.id, |t| knockout::start_match(t, node))
}

#[put("/api/tournaments/{id}/nodes/{node}/result")]
async fn api_submit_result(state: AppState, path: Path<NodePath>, body: Json<MatchScore>) -> HttpResponse {
    let node = match parse_node(&path.node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    with_tournament(&state, path.id, |t| knockout::submit_result(t, node, body.into_inner()))
}

#[post("/api/tournaments/{id}/nodes/{node}/reset")]
async fn api_reset_match(state: AppState, path: Path<NodePath>) -> HttpResponse {
    let node = match parse_node(&path.node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    with_tournament(&state, path.id, |t| knockout::reset_match(t, node))
}

/// Give a bye; the body names the winner when both players are seated.
#[post("/api/tournaments/{id}/nodes/{node}/bye")]
async fn api_give_bye(state: AppState, path: Path<NodePath>, body: Option<Json<GiveByeBody>>) -> HttpResponse {
    let node = match parse_node(&path.node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    let winner = body.and_then(|b| b.winner);
    with_tournament(&state, path.id, |t| knockout::give_bye(t, node, winner))
}

#[delete("/api/tournaments/{id}/nodes/{node}/bye")]
async fn api_undo_bye(state: AppState, path: Path<NodePath>) -> HttpResponse {
    let node = match parse_node(&path.node) {
        Ok(node) => node,
        Err(response) => return response,
    };
    with_tournament(&state, path.id, |t| knockout::undo_bye(t, node))
}

/// Throw away every phase after the groups and go back to the group phase.
#[post("/api/tournaments/{id}/reset/group-phase")]
async fn api_reset_to_group_phase(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, reset_to_group_phase)
}

/// Clear the results of the current phase, keeping its structure.
#[post("/api/tournaments/{id}/reset/results")]
async fn api_reset_results(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_tournament(&state, path.id, reset_current_phase_results)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));

    // Background task: every 30 minutes, remove tournaments inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_add_player)
            .service(api_remove_player)
            .service(api_import_roster)
            .service(api_create_groups)
            .service(api_start_tournament)
            .service(api_group_result)
            .service(api_advance)
            .service(api_bracket)
            .service(api_start_match)
            .service(api_submit_result)
            .service(api_reset_match)
            .service(api_give_bye)
            .service(api_undo_bye)
            .service(api_reset_to_group_phase)
            .service(api_reset_results)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
