//! Dashboard statistics
//!
//! Every figure is computed over the caller's scope: administrators see the
//! whole system, agents see their own records.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Datelike, Duration, Utc};
use crm_rbac::{Capability, Role};
use crm_records::client::UNASSIGNED_REGION;
use crm_records::{Appointment, AppointmentStatus, Call, Client, Collection, Identity, Record};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::ApiResult;
use crate::extract::CurrentIdentity;
use crate::state::AppState;

const VIEW: &[Capability] = &[Capability::ViewStatistics, Capability::ViewDashboard];

/// Window for the growth figures.
const GROWTH_WINDOW_DAYS: i64 = 30;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(summary))
        .route("/regions", get(regions))
        .route("/metrics", get(metrics))
        .route("/monthly-performance", get(monthly_performance))
        .route("/call-target", get(call_target))
}

/// Headline totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    total_clients: usize,
    total_calls: usize,
    total_agents: usize,
    successful_calls: usize,
    /// Percentage of answered calls, two decimals.
    success_rate: f64,
    upcoming_appointments: usize,
}

/// Client count for one region.
#[derive(Debug, Serialize, PartialEq)]
pub struct RegionCount {
    region: String,
    count: usize,
}

/// Growth over the last thirty days.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    total_clients: usize,
    total_calls: usize,
    client_growth: f64,
    call_growth: f64,
}

/// Per-month call volume and success rate for the current year.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPerformance {
    year: i32,
    calls_per_month: [usize; 12],
    success_rate_per_month: [u32; 12],
}

/// Progress towards the monthly call goal.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallTarget {
    target_calls: u32,
    /// Calls dated in the current month.
    completed_calls: usize,
    today_calls: usize,
    /// `completed_calls` as a percentage of the goal, two decimals. May
    /// exceed 100.
    progress: f64,
    /// Change in call volume against the previous month, in percent.
    growth: f64,
}

async fn summary(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Summary>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    let store = &state.store;

    let calls = store.calls.find(&|c: &Call| scope.permits(c)).await;
    let successful_calls = calls.iter().filter(|c| c.result.is_success()).count();
    let now = Utc::now();

    Ok(Json(Summary {
        total_clients: store.clients.count(&|c: &Client| scope.permits(c)).await,
        total_calls: calls.len(),
        total_agents: store
            .users
            .count(&|u: &Identity| u.role == Role::Agent && u.is_active)
            .await,
        successful_calls,
        success_rate: percentage(successful_calls, calls.len()),
        upcoming_appointments: store
            .appointments
            .count(&|a: &Appointment| {
                scope.permits(a)
                    && a.status == AppointmentStatus::Scheduled
                    && a.start_time > now
            })
            .await,
    }))
}

async fn regions(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Vec<RegionCount>>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    let clients = state.store.clients.find(&|c: &Client| scope.permits(c)).await;
    Ok(Json(count_regions(&clients)))
}

async fn metrics(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<Metrics>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    let since = Utc::now() - Duration::days(GROWTH_WINDOW_DAYS);

    let clients = state.store.clients.find(&|c: &Client| scope.permits(c)).await;
    let calls = state.store.calls.find(&|c: &Call| scope.permits(c)).await;

    Ok(Json(Metrics {
        total_clients: clients.len(),
        total_calls: calls.len(),
        client_growth: growth(&clients, since),
        call_growth: growth(&calls, since),
    }))
}

async fn monthly_performance(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<MonthlyPerformance>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    let calls = state.store.calls.find(&|c: &Call| scope.permits(c)).await;
    Ok(Json(monthly(&calls, Utc::now().year())))
}

async fn call_target(
    State(state): State<AppState>,
    CurrentIdentity(me): CurrentIdentity,
) -> ApiResult<Json<CallTarget>> {
    state.gate.require_any(&me, VIEW)?;
    let scope = state.gate.scope(&me);
    let calls = state.store.calls.find(&|c: &Call| scope.permits(c)).await;
    Ok(Json(target_progress(&calls, state.call_target, Utc::now())))
}

/// `part / whole` as a percentage rounded to two decimals; zero when empty.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = part as f64 / whole as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Share of `records` created at or after `since`.
fn growth<T: Record>(records: &[T], since: DateTime<Utc>) -> f64 {
    let recent = records.iter().filter(|r| r.created_at() >= since).count();
    percentage(recent, records.len())
}

/// Clients per region, sorted by region name. Clients without a region are
/// counted under [`UNASSIGNED_REGION`].
fn count_regions(clients: &[Client]) -> Vec<RegionCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for client in clients {
        let region = client.region.as_deref().unwrap_or(UNASSIGNED_REGION);
        *counts.entry(region).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(region, count)| RegionCount {
            region: region.to_string(),
            count,
        })
        .collect()
}

fn monthly(calls: &[Call], year: i32) -> MonthlyPerformance {
    let mut totals = [0usize; 12];
    let mut answered = [0usize; 12];
    for call in calls.iter().filter(|c| c.date.year() == year) {
        let month = call.date.month0() as usize;
        totals[month] += 1;
        if call.result.is_success() {
            answered[month] += 1;
        }
    }

    let mut rates = [0u32; 12];
    for (rate, (ok, total)) in rates.iter_mut().zip(answered.iter().zip(totals.iter())) {
        if *total > 0 {
            *rate = (*ok as f64 / *total as f64 * 100.0).round() as u32;
        }
    }

    MonthlyPerformance {
        year,
        calls_per_month: totals,
        success_rate_per_month: rates,
    }
}

fn target_progress(calls: &[Call], target: u32, now: DateTime<Utc>) -> CallTarget {
    let this_month = (now.year(), now.month());
    let last_month = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    let today = now.date_naive();

    let mut completed = 0;
    let mut previous = 0;
    let mut today_calls = 0;
    for call in calls {
        let month = (call.date.year(), call.date.month());
        if month == this_month {
            completed += 1;
        } else if month == last_month {
            previous += 1;
        }
        if call.date.date_naive() == today {
            today_calls += 1;
        }
    }

    let growth = if previous == 0 {
        0.0
    } else {
        let raw = (completed as f64 - previous as f64) / previous as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    };

    CallTarget {
        target_calls: target,
        completed_calls: completed,
        today_calls,
        progress: percentage(completed, target as usize),
        growth,
    }
}
