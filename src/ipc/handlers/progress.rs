use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_conn, ensure_playlist_owned, load_snapshots, require_user, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{self, VideoSnapshot};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde_json::json;

fn scoped_snapshots(
    conn: &Connection,
    req: &Request,
) -> Result<Vec<VideoSnapshot>, serde_json::Value> {
    let user_id = require_user(conn, req)?;
    let playlist_id = required_str(req, "playlistId")?;
    ensure_playlist_owned(conn, req, &playlist_id, &user_id)?;
    load_snapshots(conn, req, &playlist_id)
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let snapshots = match scoped_snapshots(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let summary = schedule::completion_summary(&snapshots);
    ok(&req.id, json!(summary))
}

fn handle_watch_time(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let snapshots = match scoped_snapshots(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let summary = schedule::watch_time_summary(&snapshots);
    ok(&req.id, json!(summary))
}

fn handle_streak(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    // Explicit today keeps the result reproducible; absent, use the local day.
    let today = match req.params.get("today").and_then(|v| v.as_str()) {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("today must be an ISO date (YYYY-MM-DD), got {:?}", raw),
                    None,
                )
            }
        },
        None => Local::now().date_naive(),
    };
    let snapshots = match scoped_snapshots(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let streak = schedule::watch_streak(&snapshots, today);
    ok(&req.id, json!(streak))
}

fn handle_calendar_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let snapshots = match scoped_snapshots(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let days = schedule::calendar_view(&snapshots);
    if days.is_empty() {
        return err(&req.id, "not_scheduled", "no scheduled videos found", None);
    }

    let days_json: Vec<_> = days
        .iter()
        .map(|day| {
            json!({
                "date": day.date.format("%Y-%m-%d").to_string(),
                "videos": day
                    .videos
                    .iter()
                    .map(|v| {
                        json!({
                            "id": v.id,
                            "title": v.title,
                            "durationSeconds": v.duration_seconds,
                            "status": v.status.as_str(),
                        })
                    })
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    ok(&req.id, json!({ "days": days_json }))
}

fn handle_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match require_user(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut stmt = match conn.prepare(
        "SELECT id, title, source_url, thumbnail
         FROM playlists WHERE user_id = ? ORDER BY created_at, id",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let metas = match stmt.query_map([&user_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, Option<String>>(3)?,
        ))
    }) {
        Ok(rows) => match rows.collect::<Result<Vec<_>, _>>() {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let mut entries = Vec::with_capacity(metas.len());
    for (playlist_id, title, source_url, thumbnail) in metas {
        let snapshots = match load_snapshots(conn, req, &playlist_id) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let completion = schedule::completion_summary(&snapshots);
        let scheduled: Vec<_> = snapshots.iter().filter_map(|v| v.scheduled_date).collect();
        entries.push(json!({
            "playlistId": playlist_id,
            "title": title,
            "sourceUrl": source_url,
            "thumbnail": thumbnail,
            "totalVideos": completion.total,
            "completed": completion.completed,
            "percentComplete": completion.percentage,
            "scheduledStart": scheduled.iter().min().map(|d| d.format("%Y-%m-%d").to_string()),
            "scheduledEnd": scheduled.iter().max().map(|d| d.format("%Y-%m-%d").to_string()),
        }));
    }

    ok(&req.id, json!({ "playlists": entries }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "progress.summary" => Some(handle_summary(state, req)),
        "progress.watchTime" => Some(handle_watch_time(state, req)),
        "progress.streak" => Some(handle_streak(state, req)),
        "progress.calendarView" => Some(handle_calendar_view(state, req)),
        "user.dashboard" => Some(handle_dashboard(state, req)),
        _ => None,
    }
}
