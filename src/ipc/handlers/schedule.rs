use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_conn, ensure_playlist_owned, require_user, required_date, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{self, Assignment, ScheduleItem};
use rusqlite::{params, Connection};
use serde_json::json;

fn load_items(
    conn: &Connection,
    req: &Request,
    playlist_id: &str,
) -> Result<Vec<ScheduleItem>, serde_json::Value> {
    let mut stmt = conn
        .prepare(
            "SELECT id, duration_seconds FROM videos
             WHERE playlist_id = ?
             ORDER BY sort_order, id",
        )
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    let items = stmt
        .query_map([playlist_id], |r| {
            Ok(ScheduleItem {
                id: r.get::<_, String>(0)?,
                duration_seconds: r.get::<_, i64>(1)?,
            })
        })
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    Ok(items)
}

/// Apply the full assignment list in one transaction. Every video in the
/// playlist gets a fresh date each run; there is no partial application.
fn apply_assignments(
    conn: &Connection,
    req: &Request,
    assignments: &[Assignment],
) -> Result<(), serde_json::Value> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| err(&req.id, "db_write_failed", e.to_string(), None))?;
    for a in assignments {
        tx.execute(
            "UPDATE videos SET scheduled_date = ? WHERE id = ?",
            params![a.date.format("%Y-%m-%d").to_string(), a.item_id],
        )
        .map_err(|e| err(&req.id, "db_write_failed", e.to_string(), None))?;
    }
    tx.commit()
        .map_err(|e| err(&req.id, "db_write_failed", e.to_string(), None))?;
    Ok(())
}

fn assignments_json(assignments: &[Assignment]) -> Vec<serde_json::Value> {
    assignments
        .iter()
        .map(|a| {
            json!({
                "videoId": a.item_id,
                "date": a.date.format("%Y-%m-%d").to_string(),
            })
        })
        .collect()
}

fn handle_by_daily_budget(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match require_user(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let playlist_id = match required_str(req, "playlistId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = ensure_playlist_owned(conn, req, &playlist_id, &user_id) {
        return e;
    }
    let hours_per_day = match req.params.get("hoursPerDay").and_then(|v| v.as_f64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing hoursPerDay", None),
    };
    let start_date = match required_date(req, "startDate") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let items = match load_items(conn, req, &playlist_id) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if items.is_empty() {
        return err(&req.id, "no_videos", "playlist has no videos to schedule", None);
    }

    let daily_budget_seconds = (hours_per_day * 3600.0) as i64;
    let assignments = match schedule::by_daily_budget(&items, daily_budget_seconds, start_date) {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, None),
    };
    if let Err(e) = apply_assignments(conn, req, &assignments) {
        return e;
    }

    ok(
        &req.id,
        json!({
            "scheduled": assignments.len(),
            "dailyBudgetSeconds": daily_budget_seconds,
            "assignments": assignments_json(&assignments),
        }),
    )
}

fn handle_by_target_date(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match require_user(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let playlist_id = match required_str(req, "playlistId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = ensure_playlist_owned(conn, req, &playlist_id, &user_id) {
        return e;
    }
    let start_date = match required_date(req, "startDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let end_date = match required_date(req, "endDate") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let items = match load_items(conn, req, &playlist_id) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if items.is_empty() {
        return err(&req.id, "no_videos", "playlist has no videos to schedule", None);
    }

    let assignments = match schedule::by_target_date(&items, start_date, end_date) {
        Ok(v) => v,
        Err(e) => return err(&req.id, &e.code, e.message, None),
    };
    if let Err(e) = apply_assignments(conn, req, &assignments) {
        return e;
    }

    // The derived budget can spill past endDate; report the actual last day
    // so the frontend can surface it.
    let last_date = assignments
        .iter()
        .map(|a| a.date)
        .max()
        .map(|d| d.format("%Y-%m-%d").to_string());

    ok(
        &req.id,
        json!({
            "scheduled": assignments.len(),
            "lastScheduledDate": last_date,
            "assignments": assignments_json(&assignments),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.byDailyBudget" => Some(handle_by_daily_budget(state, req)),
        "schedule.byTargetDate" => Some(handle_by_target_date(state, req)),
        _ => None,
    }
}
