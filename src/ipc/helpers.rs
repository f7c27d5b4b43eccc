use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::schedule::{VideoSnapshot, VideoStatus};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_date(req: &Request, key: &str) -> Result<NaiveDate, serde_json::Value> {
    let raw = required_str(req, key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        err(
            &req.id,
            "bad_params",
            format!("{} must be an ISO date (YYYY-MM-DD), got {:?}", key, raw),
            None,
        )
    })
}

/// Resolve a session token to the owning user id. Every playlist-scoped
/// method goes through this.
pub fn require_user(conn: &Connection, req: &Request) -> Result<String, serde_json::Value> {
    let token = required_str(req, "sessionToken")?;
    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token = ?",
            [&token],
            |r| r.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    user_id.ok_or_else(|| err(&req.id, "invalid_session", "session token not recognized", None))
}

/// Confirm the playlist exists and belongs to the user.
pub fn ensure_playlist_owned(
    conn: &Connection,
    req: &Request,
    playlist_id: &str,
    user_id: &str,
) -> Result<(), serde_json::Value> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM playlists WHERE id = ? AND user_id = ? LIMIT 1",
            params![playlist_id, user_id],
            |_r| Ok(()),
        )
        .optional()
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    if exists.is_some() {
        Ok(())
    } else {
        Err(err(&req.id, "not_found", "playlist not found", None))
    }
}

/// Load one playlist's videos as analyzer snapshots, in stable sort order.
pub fn load_snapshots(
    conn: &Connection,
    req: &Request,
    playlist_id: &str,
) -> Result<Vec<VideoSnapshot>, serde_json::Value> {
    let mut stmt = conn
        .prepare(
            "SELECT id, title, duration_seconds, status, scheduled_date
             FROM videos
             WHERE playlist_id = ?
             ORDER BY sort_order, id",
        )
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    let rows = stmt
        .query_map([playlist_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, Option<String>>(4)?,
            ))
        })
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;

    let mut out = Vec::with_capacity(rows.len());
    for (id, title, duration_seconds, status_raw, date_raw) in rows {
        let status = VideoStatus::parse(&status_raw).unwrap_or(VideoStatus::NotStarted);
        let scheduled_date =
            date_raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
        out.push(VideoSnapshot {
            id,
            title,
            duration_seconds,
            status,
            scheduled_date,
        });
    }
    Ok(out)
}
