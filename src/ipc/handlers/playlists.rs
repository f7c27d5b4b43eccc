use crate::catalog;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    db_conn, ensure_playlist_owned, load_snapshots, require_user, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::schedule;
use rusqlite::params;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

fn now_ts() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match require_user(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let source_url = match required_str(req, "sourceUrl") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(source_playlist_id) = catalog::extract_playlist_id(&source_url) else {
        return err(&req.id, "bad_params", "sourceUrl has no playlist id", None);
    };
    let Some(raw_payload) = req.params.get("payload") else {
        return err(&req.id, "bad_params", "missing payload", None);
    };

    let imported = match catalog::decode_payload(raw_payload) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_payload", format!("{:#}", e), None),
    };

    let playlist_id = Uuid::new_v4().to_string();
    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_write_failed", e.to_string(), None),
    };
    if let Err(e) = tx.execute(
        "INSERT INTO playlists(id, user_id, title, source_url, source_playlist_id,
                               thumbnail, total_videos, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            playlist_id,
            user_id,
            imported.title,
            source_url,
            source_playlist_id,
            imported.thumbnail,
            imported.videos.len() as i64,
            now_ts()
        ],
    ) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    for (i, v) in imported.videos.iter().enumerate() {
        if let Err(e) = tx.execute(
            "INSERT INTO videos(id, playlist_id, sort_order, title, duration_seconds,
                                status, source_url, thumbnail)
             VALUES (?, ?, ?, ?, ?, 'Not Started', ?, ?)",
            params![
                Uuid::new_v4().to_string(),
                playlist_id,
                i as i64,
                v.title,
                v.duration_seconds,
                v.source_url,
                v.thumbnail
            ],
        ) {
            return err(&req.id, "db_write_failed", e.to_string(), None);
        }
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }

    ok(
        &req.id,
        json!({
            "playlistId": playlist_id,
            "title": imported.title,
            "thumbnail": imported.thumbnail,
            "totalVideos": imported.videos.len(),
        }),
    )
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match require_user(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut stmt = match conn.prepare(
        "SELECT id, title, source_url, thumbnail, total_videos
         FROM playlists WHERE user_id = ? ORDER BY created_at, id",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let playlists = match stmt.query_map([&user_id], |r| {
        Ok(json!({
            "id": r.get::<_, String>(0)?,
            "title": r.get::<_, String>(1)?,
            "sourceUrl": r.get::<_, String>(2)?,
            "thumbnail": r.get::<_, Option<String>>(3)?,
            "totalVideos": r.get::<_, i64>(4)?,
        }))
    }) {
        Ok(rows) => match rows.collect::<Result<Vec<_>, _>>() {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(&req.id, json!({ "playlists": playlists }))
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let meta = match conn.query_row(
        "SELECT title, source_url, thumbnail, total_videos FROM playlists WHERE id = ?",
        [&playlist_id],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
                r.get::<_, i64>(3)?,
            ))
        },
    ) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let snapshots = match load_snapshots(conn, req, &playlist_id) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let completion = schedule::completion_summary(&snapshots);
    let scheduled: Vec<_> = snapshots.iter().filter_map(|v| v.scheduled_date).collect();
    let start = scheduled.iter().min().map(|d| d.format("%Y-%m-%d").to_string());
    let end = scheduled.iter().max().map(|d| d.format("%Y-%m-%d").to_string());

    ok(
        &req.id,
        json!({
            "id": playlist_id,
            "title": meta.0,
            "sourceUrl": meta.1,
            "thumbnail": meta.2,
            "totalVideos": meta.3,
            "completion": completion,
            "scheduledStart": start,
            "scheduledEnd": end,
        }),
    )
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_write_failed", e.to_string(), None),
    };
    if let Err(e) = tx.execute("DELETE FROM videos WHERE playlist_id = ?", [&playlist_id]) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    if let Err(e) = tx.execute("DELETE FROM playlists WHERE id = ?", [&playlist_id]) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }

    ok(&req.id, json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "playlists.import" => Some(handle_import(state, req)),
        "playlists.list" => Some(handle_list(state, req)),
        "playlists.open" => Some(handle_open(state, req)),
        "playlists.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
