use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, Redirect};
use axum::{Form, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::ReservationStatus;
use crate::services::admin_view;
use crate::state::AppState;
use crate::store::queries;

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Accepts a bearer header or the `password` parameter. Returns the credential
/// that matched so links on the rendered page can carry it.
fn check_auth(
    headers: &HeaderMap,
    password: Option<&str>,
    expected: &str,
) -> Result<String, AppError> {
    let supplied = bearer(headers).or(password).unwrap_or("");
    if expected.is_empty() || !constant_time_eq(supplied.as_bytes(), expected.as_bytes()) {
        tracing::warn!("admin authentication failed");
        return Err(AppError::Unauthorized);
    }
    Ok(supplied.to_string())
}

fn back_to_admin(credential: &str) -> Redirect {
    let query = serde_urlencoded::to_string([("password", credential)]).unwrap_or_default();
    Redirect::to(&format!("/admin?{query}"))
}

fn require_match(count: usize, action: &str) -> Result<(), AppError> {
    if count == 0 {
        return Err(AppError::NotFound(format!("{action}: no matching reservation")));
    }
    Ok(())
}

// GET /admin
#[derive(Deserialize)]
pub struct AuthQuery {
    pub password: Option<String>,
}

pub async fn admin_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AuthQuery>,
) -> Result<Html<String>, AppError> {
    let credential = check_auth(&headers, query.password.as_deref(), &state.config.admin_password)?;

    let reservations = state.store.snapshot()?;
    let triggers = &state.config.triggers;
    let groups = admin_view::group_reservations(&reservations, triggers, Local::now().date_naive());

    Ok(Html(admin_view::render_admin_page(&groups, triggers, &credential)))
}

// GET /admin/delete
#[derive(Deserialize)]
pub struct SlotQuery {
    pub password: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub time: String,
}

pub async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SlotQuery>,
) -> Result<Redirect, AppError> {
    let credential = check_auth(&headers, query.password.as_deref(), &state.config.admin_password)?;

    let removed = queries::delete_reservation(
        &state.store,
        &state.config.triggers,
        &query.user_id,
        &query.time,
    )?;
    require_match(removed, "delete")?;

    tracing::info!(user_id = %query.user_id, time = %query.time, removed, "reservation deleted");
    Ok(back_to_admin(&credential))
}

// POST /admin/edit_name
#[derive(Deserialize)]
pub struct EditNameForm {
    pub password: Option<String>,
    #[serde(default)]
    pub old_name: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub new_name: String,
}

pub async fn edit_name(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<EditNameForm>,
) -> Result<Redirect, AppError> {
    let credential = check_auth(&headers, form.password.as_deref(), &state.config.admin_password)?;

    let new_name = form.new_name.trim();
    if new_name.is_empty() {
        return Err(AppError::BadRequest("new_name must not be empty".to_string()));
    }

    let renamed = queries::rename_reservations(
        &state.store,
        &state.config.triggers,
        &form.old_name,
        &form.time,
        new_name,
    )?;
    require_match(renamed, "edit name")?;
    if renamed > 1 {
        tracing::warn!(time = %form.time, renamed, "rename matched more than one reservation");
    }

    Ok(back_to_admin(&credential))
}

// POST /admin/update_phone
#[derive(Deserialize)]
pub struct UpdatePhoneForm {
    pub password: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub phone: String,
}

pub async fn update_phone(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<UpdatePhoneForm>,
) -> Result<Redirect, AppError> {
    let credential = check_auth(&headers, form.password.as_deref(), &state.config.admin_password)?;

    let updated = queries::update_phone(
        &state.store,
        &state.config.triggers,
        &form.user_id,
        &form.time,
        &form.phone,
    )?;
    require_match(updated, "update phone")?;

    Ok(back_to_admin(&credential))
}

// GET /admin/mark
#[derive(Deserialize)]
pub struct MarkQuery {
    pub password: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub status: String,
}

pub async fn mark_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<MarkQuery>,
) -> Result<Redirect, AppError> {
    let credential = check_auth(&headers, query.password.as_deref(), &state.config.admin_password)?;

    let status = ReservationStatus::parse(&query.status)
        .ok_or_else(|| AppError::BadRequest(format!("unknown status: {}", query.status)))?;

    let updated = queries::update_status(
        &state.store,
        &state.config.triggers,
        &query.user_id,
        &query.time,
        &status,
    )?;
    require_match(updated, "mark status")?;

    tracing::info!(user_id = %query.user_id, time = %query.time, status = status.as_str(), "status changed");
    Ok(back_to_admin(&credential))
}

// GET /api/admin/reservations
#[derive(Serialize)]
pub struct ReservationResponse {
    user_id: String,
    display_name: String,
    time: String,
    phone: String,
    status: String,
}

pub async fn list_reservations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    check_auth(&headers, None, &state.config.admin_password)?;

    let triggers = &state.config.triggers;
    let response = state
        .store
        .snapshot()?
        .into_iter()
        .map(|r| ReservationResponse {
            time: triggers.normalize(&r.time),
            phone: r.phone().to_string(),
            status: r.status().as_str().to_string(),
            user_id: r.user_id,
            display_name: r.display_name,
        })
        .collect();

    Ok(Json(response))
}
