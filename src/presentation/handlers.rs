// HTTP request handlers
use crate::application::climate_history_service::ClimateQuery;
use crate::application::energy_history_service::EnergyQuery;
use crate::application::error::DashboardError;
use crate::domain::chart::ChartView;
use crate::domain::climate::ClimateSensor;
use crate::domain::energy::{Category, CategorySelection, SelectionMode, Subtype};
use crate::domain::layout::Viewport;
use crate::domain::period::Period;
use crate::domain::settings::{EnergyContract, MindergasnlSettings};
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyParams {
    /// `YYYY-MM-DD`, defaults to today.
    pub datum: Option<String>,
    pub soort: Option<String>,
    /// Comma separated, e.g. `stroom,gas`.
    pub energiesoorten: Option<String>,
    /// Category clicked in the legend; toggled in `energiesoorten`.
    pub wissel: Option<String>,
    pub viewport_height: Option<u32>,
    pub top_offset: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerDrawParams {
    pub datum: Option<String>,
    pub viewport_height: Option<u32>,
    pub top_offset: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateParams {
    pub sensor: Option<String>,
    /// Comma separated `YYYY-MM-DD` dates, defaults to today.
    pub datums: Option<String>,
    pub viewport_height: Option<u32>,
    pub top_offset: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response<Body> {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn chart_response(view: ChartView, compress: bool) -> Response<Body> {
    // A failed view still carries the empty chart.
    let status = if view.error.is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    respond(status, &view, compress).await
}

fn error_status(error: &DashboardError) -> StatusCode {
    match error {
        DashboardError::Backend { .. } => StatusCode::BAD_GATEWAY,
        DashboardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DashboardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    }
}

async fn error_response(error: DashboardError, compress: bool) -> Response<Body> {
    let body = ErrorBody {
        message: error.to_string(),
    };
    respond(error_status(&error), &body, compress).await
}

async fn result_response<T: Serialize>(result: Result<T, DashboardError>, compress: bool) -> Response<Body> {
    match result {
        Ok(data) => respond(StatusCode::OK, &data, compress).await,
        Err(error) => error_response(error, compress).await,
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, DashboardError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DashboardError::InvalidRequest(format!("ongeldige datum: {}", value)))
}

fn date_or_today(value: Option<&str>) -> Result<NaiveDate, DashboardError> {
    value
        .map(parse_date)
        .unwrap_or_else(|| Ok(Local::now().date_naive()))
}

fn viewport(height: Option<u32>, top_offset: Option<u32>) -> Option<Viewport> {
    height.map(|height| Viewport::new(height, top_offset.unwrap_or(0)))
}

fn energy_query(params: &EnergyParams) -> Result<EnergyQuery, DashboardError> {
    let subtype = match params.soort.as_deref() {
        Some(soort) => soort.parse::<Subtype>().map_err(DashboardError::InvalidRequest)?,
        None => Subtype::Verbruik,
    };

    let mut selection = match params.energiesoorten.as_deref() {
        Some(list) => {
            let categories = list
                .split(',')
                .filter(|code| !code.trim().is_empty())
                .map(|code| code.parse::<Category>().map_err(DashboardError::InvalidRequest))
                .collect::<Result<Vec<_>, _>>()?;
            let mode = match subtype {
                Subtype::Kosten => SelectionMode::Multiple,
                Subtype::Verbruik => SelectionMode::Single,
            };
            CategorySelection::new(mode, categories)
        }
        None => CategorySelection::for_subtype(subtype),
    };
    if let Some(code) = params.wissel.as_deref() {
        let category = code.parse::<Category>().map_err(DashboardError::InvalidRequest)?;
        if !selection.toggle(category) {
            tracing::debug!("Selection already shows only {}", category.code());
        }
    }

    Ok(EnergyQuery {
        date: date_or_today(params.datum.as_deref())?,
        subtype,
        selection,
        viewport: viewport(params.viewport_height, params.top_offset),
    })
}

fn climate_query(params: &ClimateParams) -> Result<ClimateQuery, DashboardError> {
    let sensor = match params.sensor.as_deref() {
        Some(sensor) => sensor.parse::<ClimateSensor>().map_err(DashboardError::InvalidRequest)?,
        None => ClimateSensor::Temperatuur,
    };
    let dates = match params.datums.as_deref() {
        Some(list) => list
            .split(',')
            .filter(|date| !date.trim().is_empty())
            .map(parse_date)
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![Local::now().date_naive()],
    };

    Ok(ClimateQuery {
        sensor,
        dates,
        viewport: viewport(params.viewport_height, params.top_offset),
    })
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

async fn energy_chart(state: &AppState, period: Period, params: &EnergyParams, compress: bool) -> Response<Body> {
    match energy_query(params) {
        Ok(query) => chart_response(state.energy_history_service.chart(period, &query).await, compress).await,
        Err(error) => error_response(error, compress).await,
    }
}

pub async fn energy_per_hour(
    Query(params): Query<EnergyParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    energy_chart(&state, Period::Hour, &params, accepts_brotli(&headers)).await
}

pub async fn energy_per_day(
    Query(params): Query<EnergyParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    energy_chart(&state, Period::Day, &params, accepts_brotli(&headers)).await
}

pub async fn energy_per_month(
    Query(params): Query<EnergyParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    energy_chart(&state, Period::Month, &params, accepts_brotli(&headers)).await
}

pub async fn power_draw(
    Query(params): Query<PowerDrawParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    match date_or_today(params.datum.as_deref()) {
        Ok(date) => {
            let view = state
                .power_draw_service
                .chart(date, viewport(params.viewport_height, params.top_offset))
                .await;
            chart_response(view, compress).await
        }
        Err(error) => error_response(error, compress).await,
    }
}

pub async fn climate(
    Query(params): Query<ClimateParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    match climate_query(&params) {
        Ok(query) => chart_response(state.climate_history_service.chart(&query).await, compress).await,
        Err(error) => error_response(error, compress).await,
    }
}

/// Current live dashboard state
pub async fn live_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    respond(
        StatusCode::OK,
        &state.live_dashboard_service.snapshot(),
        accepts_brotli(&headers),
    )
    .await
}

/// Stream live dashboard updates (current state first)
pub async fn stream_live_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(state.live_dashboard_service.subscribe(), accepts_brotli(&headers))
}

pub async fn get_mindergasnl(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    result_response(state.settings_service.mindergasnl().await, accepts_brotli(&headers)).await
}

pub async fn put_mindergasnl(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(settings): Json<MindergasnlSettings>,
) -> impl IntoResponse {
    result_response(
        state.settings_service.save_mindergasnl(settings).await,
        accepts_brotli(&headers),
    )
    .await
}

pub async fn list_energy_contracts(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    result_response(state.settings_service.energy_contracts().await, accepts_brotli(&headers)).await
}

pub async fn save_energy_contract(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(contract): Json<EnergyContract>,
) -> impl IntoResponse {
    result_response(
        state.settings_service.save_energy_contract(contract).await,
        accepts_brotli(&headers),
    )
    .await
}

pub async fn delete_energy_contract(
    Path(id): Path<i64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.settings_service.delete_energy_contract(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error, accepts_brotli(&headers)).await,
    }
}
