use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, ensure_playlist_owned, require_user, required_str};
use crate::ipc::types::{AppState, Request};
use crate::schedule::VideoStatus;
use rusqlite::{params, OptionalExtension};
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    let mut stmt = match conn.prepare(
        "SELECT id, sort_order, title, duration_seconds, scheduled_date, status, notes,
                source_url, thumbnail
         FROM videos
         WHERE playlist_id = ?
         ORDER BY sort_order, id",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let videos = match stmt.query_map([&playlist_id], |r| {
        Ok(json!({
            "id": r.get::<_, String>(0)?,
            "sortOrder": r.get::<_, i64>(1)?,
            "title": r.get::<_, String>(2)?,
            "durationSeconds": r.get::<_, i64>(3)?,
            "scheduledDate": r.get::<_, Option<String>>(4)?,
            "status": r.get::<_, String>(5)?,
            "notes": r.get::<_, Option<String>>(6)?,
            "sourceUrl": r.get::<_, String>(7)?,
            "thumbnail": r.get::<_, Option<String>>(8)?,
        }))
    }) {
        Ok(rows) => match rows.collect::<Result<Vec<_>, _>>() {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        },
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(&req.id, json!({ "videos": videos }))
}

fn handle_update_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match require_user(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let video_id = match required_str(req, "videoId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let status_raw = match required_str(req, "status") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(status) = VideoStatus::parse(&status_raw) else {
        return err(
            &req.id,
            "bad_params",
            format!(
                "status must be one of: Not Started, In Progress, Completed, Rewatch; got {:?}",
                status_raw
            ),
            None,
        );
    };
    // Absent notes keep the stored value; an explicit null clears it.
    let notes: Option<Option<String>> = match req.params.get("notes") {
        None => None,
        Some(v) if v.is_null() => Some(None),
        Some(v) => match v.as_str() {
            Some(s) => Some(Some(s.to_string())),
            None => return err(&req.id, "bad_params", "notes must be string or null", None),
        },
    };

    // Ownership is checked through the owning playlist.
    let owned = conn
        .query_row(
            "SELECT 1 FROM videos v
             JOIN playlists p ON p.id = v.playlist_id
             WHERE v.id = ? AND p.user_id = ? LIMIT 1",
            params![video_id, user_id],
            |_r| Ok(()),
        )
        .optional();
    match owned {
        Ok(Some(())) => {}
        Ok(None) => return err(&req.id, "not_found", "video not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    let write = match notes {
        Some(notes) => conn.execute(
            "UPDATE videos SET status = ?, notes = ? WHERE id = ?",
            params![status.as_str(), notes, video_id],
        ),
        None => conn.execute(
            "UPDATE videos SET status = ? WHERE id = ?",
            params![status.as_str(), video_id],
        ),
    };
    if let Err(e) = write {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }

    ok(
        &req.id,
        json!({ "videoId": video_id, "status": status.as_str() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "videos.list" => Some(handle_list(state, req)),
        "videos.updateStatus" => Some(handle_update_status(state, req)),
        _ => None,
    }
}
