use actix_session::config::CookieContentSecurity;
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use crate::client::{ApiClient, SessionContext};
use crate::display::render_html_page;
use crate::error::FetchError;
use crate::parser::{RejectedSession, TimetableEnvelope};
use crate::quiz::{score_quiz, Quiz, QuizAnalysis, QuizRequest, WrongQuestion};
use crate::timetable::{Day, Grid, SlotConfig, Timetable, Unplaced};

const IDENTITY_KEY: &str = "identity";

pub struct AppState {
    pub client: ApiClient,
    pub slots: SlotConfig,
    /// Last grid built by any request
    pub last_grid: Mutex<Option<Grid>>,
}

impl AppState {
    pub fn new(client: ApiClient, slots: SlotConfig) -> Self {
        AppState {
            client,
            slots,
            last_grid: Mutex::new(None),
        }
    }

    fn grid(&self) -> MutexGuard<'_, Option<Grid>> {
        self.last_grid.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    student_id: String,
    token: String,
}

#[derive(Serialize)]
pub struct SlotView {
    key: String,
    label: String,
}

#[derive(Serialize)]
pub struct CellView {
    slot: String,
    label: String,
    span: usize,
    course_id: Option<String>,
    title: Option<String>,
    room_number: Option<String>,
}

#[derive(Serialize)]
pub struct RowView {
    day: Day,
    cells: Vec<CellView>,
}

#[derive(Serialize)]
pub struct TimetableResponse {
    source: Option<String>,
    slots: Vec<SlotView>,
    rows: Vec<RowView>,
    unplaced: Vec<Unplaced>,
    rejected: Vec<RejectedSession>,
}

impl From<&Timetable> for TimetableResponse {
    fn from(timetable: &Timetable) -> Self {
        let grid = &timetable.grid;
        let rows = grid
            .rows()
            .into_iter()
            .map(|row| RowView {
                day: row.day,
                cells: row
                    .cells
                    .iter()
                    .map(|cell| CellView {
                        slot: grid.slots().get(cell.slot_index).map(|s| s.key()).unwrap_or_default(),
                        label: grid.slots().span_label(cell.slot_index, cell.span),
                        span: cell.span,
                        course_id: cell.session.map(|s| s.course_id.clone()),
                        title: cell.session.map(|s| s.title.clone()),
                        room_number: cell.session.map(|s| s.room.clone()),
                    })
                    .collect(),
            })
            .collect();

        TimetableResponse {
            source: timetable.source.clone(),
            slots: slot_views(grid.slots()),
            rows,
            unplaced: grid.unplaced().to_vec(),
            rejected: timetable.rejected.clone(),
        }
    }
}

fn slot_views(slots: &SlotConfig) -> Vec<SlotView> {
    slots
        .iter()
        .map(|slot| SlotView {
            key: slot.key(),
            label: slot.label.clone(),
        })
        .collect()
}

/// Quiz plus answers keyed by question id
#[derive(Deserialize)]
pub struct QuizAttempt {
    quiz: Quiz,
    answers: HashMap<u32, usize>,
}

#[derive(Serialize)]
pub struct QuizResultResponse {
    score: usize,
    total: usize,
    wrong_questions: Vec<WrongQuestion>,
    analysis: Option<QuizAnalysis>,
}

fn identity(session: &Session) -> Option<SessionContext> {
    session.get::<SessionContext>(IDENTITY_KEY).ok().flatten()
}

fn no_identity() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({"success": false, "error": "No student ID found."}))
}

// Stores the caller's identity in the session cookie
async fn start_session(req: web::Json<LoginRequest>, session: Session) -> Result<HttpResponse> {
    let ctx = SessionContext::new(req.student_id.trim(), req.token.trim());
    if ctx.student_id.is_empty() || ctx.token.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Student ID and token are required"
        })));
    }

    session.renew();
    session.insert(IDENTITY_KEY, &ctx)?;
    info!(student_id = %ctx.student_id, "session started");
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn end_session(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(serde_json::json!({"success": true}))
}

async fn get_slots(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(slot_views(&state.slots))
}

/// Builds, stores and serialises a timetable
fn commit(state: &AppState, envelope: &TimetableEnvelope) -> HttpResponse {
    let timetable = Timetable::from_envelope(envelope, &state.slots);
    let body = TimetableResponse::from(&timetable);
    info!(
        placed = timetable.grid.placed_count(),
        unplaced = timetable.grid.unplaced().len(),
        rejected = timetable.rejected.len(),
        "timetable built"
    );
    *state.grid() = Some(timetable.grid);
    HttpResponse::Ok().json(body)
}

// Fetches the caller's timetable upstream and lays it out
async fn get_timetable(session: Session, state: web::Data<AppState>) -> HttpResponse {
    let Some(ctx) = identity(&session) else {
        return no_identity();
    };

    match state.client.fetch_timetable(&ctx).await {
        Ok(envelope) => commit(&state, &envelope),
        Err(FetchError::MissingIdentity) => no_identity(),
        Err(e) => {
            warn!(error = %e, student_id = %ctx.student_id, "timetable fetch failed");
            HttpResponse::BadGateway().json(serde_json::json!({
                "success": false,
                "error": "Could not load timetable"
            }))
        }
    }
}

// Lays out a timetable posted by the caller
async fn post_timetable(envelope: web::Json<TimetableEnvelope>, state: web::Data<AppState>) -> HttpResponse {
    commit(&state, &envelope)
}

// HTML page of the last grid built
async fn timetable_page(state: web::Data<AppState>) -> HttpResponse {
    match state.grid().as_ref() {
        Some(grid) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(render_html_page(grid).into_string()),
        None => HttpResponse::NotFound().json(serde_json::json!({"error": "Timetable not available"})),
    }
}

async fn generate_quiz(
    req: web::Json<QuizRequest>,
    session: Session,
    state: web::Data<AppState>,
) -> HttpResponse {
    let Some(ctx) = identity(&session) else {
        return no_identity();
    };

    match state.client.generate_quiz(&ctx, &req).await {
        Ok(quiz) => HttpResponse::Ok().json(quiz),
        Err(e) => {
            warn!(error = %e, course = %req.course_id, "quiz generation failed");
            HttpResponse::BadGateway().json(serde_json::json!({
                "success": false,
                "error": "Failed to generate quiz"
            }))
        }
    }
}

// Scores locally, then asks for an analysis only if something was wrong
async fn submit_quiz(
    attempt: web::Json<QuizAttempt>,
    session: Session,
    state: web::Data<AppState>,
) -> HttpResponse {
    let result = score_quiz(&attempt.quiz, &attempt.answers);

    let mut analysis = None;
    if let (Some(submission), Some(ctx)) = (result.submission(&attempt.quiz.course_id), identity(&session)) {
        match state.client.analyze_quiz(&ctx, &submission).await {
            Ok(found) => analysis = Some(found),
            Err(e) => warn!(error = %e, course = %submission.course_id, "quiz analysis failed"),
        }
    }

    HttpResponse::Ok().json(QuizResultResponse {
        score: result.score,
        total: result.total,
        wrong_questions: result.wrong_questions,
        analysis,
    })
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/timetable", web::get().to(timetable_page))
        .service(
            web::resource("/api/session")
                .route(web::post().to(start_session))
                .route(web::delete().to(end_session)),
        )
        .route("/api/slots", web::get().to(get_slots))
        .service(
            web::resource("/api/timetable")
                .route(web::get().to(get_timetable))
                .route(web::post().to(post_timetable)),
        )
        .route("/api/quiz/generate", web::post().to(generate_quiz))
        .route("/api/quiz/submit", web::post().to(submit_quiz));
}

/// Private cookie session holding the [`SessionContext`]
pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_secure(false)
        .build()
}

pub async fn start_server(port: u16, client: ApiClient, slots: SlotConfig) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(client, slots));
    let key = Key::generate();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(session_middleware(key.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
