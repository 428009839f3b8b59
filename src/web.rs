use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::display::format_schedule;
use crate::error::RotaError;
use crate::form::{can_make_schedule, validate_params, ParamsUpdate};
use crate::generation::start_generation;
use crate::pool::{PoolFile, PoolMember};
use crate::schedule::{violations, PersonId, Schedule, ScheduleParams, Violations};
use crate::store::{Page, PersonHighlight, Store};

pub struct AppState {
    pub store: Arc<Store>,
    pub pool: Mutex<PoolFile>,
    pub poll_interval: Duration,
}

impl AppState {
    pub fn new(pool: PoolFile, poll_interval: Duration) -> Self {
        let store = Store::new(pool.params().clone());
        Self {
            store: Arc::new(store),
            pool: Mutex::new(pool),
            poll_interval,
        }
    }

    fn pool(&self) -> MutexGuard<'_, PoolFile> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Deserialize)]
pub struct NameRequest {
    name: String,
}

#[derive(Deserialize)]
pub struct SquadRequest {
    ids: Vec<PersonId>,
}

#[derive(Deserialize)]
pub struct PageRequest {
    page: Page,
}

#[derive(Deserialize)]
pub struct HighlightRequest {
    person_id: Option<PersonId>,
}

#[derive(Deserialize)]
pub struct SwapRequest {
    slot: usize,
    person_a: PersonId,
    person_b: PersonId,
}

#[derive(Deserialize)]
pub struct RetryRequest {
    slot: usize,
}

#[derive(Serialize)]
pub struct SquadResponse {
    ids: Vec<PersonId>,
    params: ScheduleParams,
    /// Why a schedule cannot be generated yet, if it can't
    blocked_reason: Option<String>,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    page: Page,
    generating: bool,
    seqnum: Option<u64>,
    highlight: PersonHighlight,
    schedule: Schedule,
    violations: Violations,
}

fn error_response(e: &RotaError) -> HttpResponse {
    let body = serde_json::json!({"success": false, "error": e.to_string()});
    match e {
        RotaError::NoSchedule => HttpResponse::NotFound().json(body),
        e if e.is_precondition() => HttpResponse::BadRequest().json(body),
        _ => {
            log::error!("request failed: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": message}))
}

fn squad_response(state: &AppState) -> SquadResponse {
    let ids = state.store.squad();
    let params = state.store.params();
    let blocked_reason = can_make_schedule(ids.len(), &params).err();
    SquadResponse {
        ids,
        params,
        blocked_reason,
    }
}

fn schedule_response(state: &AppState, schedule: Schedule) -> HttpResponse {
    let violations = match violations(&schedule) {
        Ok(v) => v,
        Err(e) => return error_response(&e),
    };
    HttpResponse::Ok().json(ScheduleResponse {
        page: state.store.page(),
        generating: state.store.is_generating(),
        seqnum: state.store.generation_seqnum(),
        highlight: state.store.highlight(),
        schedule,
        violations,
    })
}

fn edited_response(state: &AppState, edited: crate::error::Result<Schedule>) -> HttpResponse {
    match edited {
        Ok(schedule) => schedule_response(state, schedule),
        Err(e) => error_response(&e),
    }
}

// Pool endpoints

async fn list_pool(state: web::Data<AppState>) -> Result<HttpResponse> {
    let members: Vec<PoolMember> = state.pool().members().to_vec();
    Ok(HttpResponse::Ok().json(members))
}

async fn add_member(req: web::Json<NameRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut pool = state.pool();
    let result = pool.add_member(&req.name).and_then(|id| {
        pool.save()?;
        Ok(id)
    });
    match result {
        Ok(id) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "id": id}))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn rename_member(
    id: web::Path<PersonId>,
    req: web::Json<NameRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let mut pool = state.pool();
    match pool.edit_member_name(*id, &req.name).and_then(|_| pool.save()) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn delete_member(id: web::Path<PersonId>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut pool = state.pool();
    if !pool.delete_member(*id) {
        return Ok(error_response(&RotaError::PersonNotFound(*id)));
    }
    state.store.ensure_not_in_squad(*id);
    match pool.save() {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({"success": true}))),
        Err(e) => Ok(error_response(&e)),
    }
}

// Params endpoints

async fn get_params(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.params()))
}

async fn update_params(req: web::Json<ParamsUpdate>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let params = req.applied_to(&state.store.params());
    if let Err(message) = validate_params(&params) {
        return Ok(bad_request(message));
    }
    state.store.set_params(params.clone());

    let mut pool = state.pool();
    pool.set_params(params.clone());
    match pool.save() {
        Ok(()) => Ok(HttpResponse::Ok().json(params)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Saves the court count the store fitted to the squad
fn persist_fitted_courts(state: &AppState) -> HttpResponse {
    let n_courts = state.store.params().n_courts;
    let mut pool = state.pool();
    pool.set_n_courts(n_courts);
    match pool.save() {
        Ok(()) => HttpResponse::Ok().json(squad_response(state)),
        Err(e) => error_response(&e),
    }
}

// Squad endpoints

async fn get_squad(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(squad_response(&state)))
}

async fn set_squad(req: web::Json<SquadRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    {
        let pool = state.pool();
        if let Some(&unknown) = req.ids.iter().find(|&&id| pool.member(id).is_none()) {
            return Ok(error_response(&RotaError::PersonNotFound(unknown)));
        }
    }
    state.store.set_squad_to(req.ids.iter().copied());
    Ok(persist_fitted_courts(&state))
}

async fn toggle_in_squad(id: web::Path<PersonId>, state: web::Data<AppState>) -> Result<HttpResponse> {
    if state.pool().member(*id).is_none() {
        return Ok(error_response(&RotaError::PersonNotFound(*id)));
    }
    state.store.toggle_in_squad(*id);
    Ok(persist_fitted_courts(&state))
}

async fn clear_squad(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.store.clear_squad();
    Ok(persist_fitted_courts(&state))
}

// Navigation

async fn set_page(req: web::Json<PageRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    state.store.set_page(req.page);
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "page": req.page})))
}

async fn set_highlight(req: web::Json<HighlightRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    match req.person_id {
        Some(id) => state.store.set_highlight(id),
        None => state.store.clear_highlight(),
    }
    Ok(HttpResponse::Ok().json(state.store.highlight()))
}

// Schedule endpoints

async fn generate(state: web::Data<AppState>) -> Result<HttpResponse> {
    let squad_size = state.store.squad().len();
    if let Err(message) = can_make_schedule(squad_size, &state.store.params()) {
        return Ok(bad_request(message));
    }
    match start_generation(state.store.clone(), state.poll_interval) {
        Ok((handle, _schedules)) => {
            tokio::spawn(async move {
                match handle.await {
                    Ok(Ok(outcome)) => log::debug!("background run ended: {:?}", outcome),
                    Ok(Err(e)) => log::error!("background run failed: {}", e),
                    Err(e) => log::error!("background run panicked: {}", e),
                }
            });
            match state.store.schedule() {
                Some(schedule) => Ok(schedule_response(&state, schedule)),
                None => Ok(error_response(&RotaError::NoSchedule)),
            }
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn cancel(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.store.cancel_generation();
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.store.schedule() {
        Some(schedule) => Ok(schedule_response(&state, schedule)),
        None => Ok(error_response(&RotaError::NoSchedule)),
    }
}

async fn print_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let Some(schedule) = state.store.schedule() else {
        return Ok(error_response(&RotaError::NoSchedule));
    };
    let title = state.store.params().display_title;
    let pool = state.pool();
    let text = format_schedule(&schedule, &title, |id| pool.display_name(id));
    Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(text))
}

async fn swap_pairs(req: web::Json<SwapRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let edited = state.store.swap_pairs_in_slot(req.slot, req.person_a, req.person_b);
    Ok(edited_response(&state, edited))
}

async fn swap_persons(req: web::Json<SwapRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let edited = state.store.swap_persons_in_slot(req.slot, req.person_a, req.person_b);
    Ok(edited_response(&state, edited))
}

async fn retry(req: web::Json<RetryRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let edited = state.store.retry_slot(req.slot);
    Ok(edited_response(&state, edited))
}

/// Registers every API route; shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/pool", web::get().to(list_pool))
        .route("/api/pool", web::post().to(add_member))
        .route("/api/pool/{id}", web::put().to(rename_member))
        .route("/api/pool/{id}", web::delete().to(delete_member))
        .route("/api/params", web::get().to(get_params))
        .route("/api/params", web::put().to(update_params))
        .route("/api/squad", web::get().to(get_squad))
        .route("/api/squad", web::put().to(set_squad))
        .route("/api/squad", web::delete().to(clear_squad))
        .route("/api/squad/{id}/toggle", web::post().to(toggle_in_squad))
        .route("/api/page", web::post().to(set_page))
        .route("/api/highlight", web::post().to(set_highlight))
        .route("/api/schedule", web::get().to(get_schedule))
        .route("/api/schedule/print", web::get().to(print_schedule))
        .route("/api/schedule/generate", web::post().to(generate))
        .route("/api/schedule/cancel", web::post().to(cancel))
        .route("/api/schedule/swap-pairs", web::post().to(swap_pairs))
        .route("/api/schedule/swap-persons", web::post().to(swap_persons))
        .route("/api/schedule/retry", web::post().to(retry));
}

pub async fn start_server(port: u16, pool: PoolFile, poll_interval: Duration) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(pool, poll_interval));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
