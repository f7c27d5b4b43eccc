use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "studyplanner.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_salt TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions(
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS playlists(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            source_url TEXT NOT NULL,
            source_playlist_id TEXT NOT NULL,
            thumbnail TEXT,
            total_videos INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_playlists_user ON playlists(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS videos(
            id TEXT PRIMARY KEY,
            playlist_id TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            title TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL,
            scheduled_date TEXT,
            status TEXT NOT NULL DEFAULT 'Not Started',
            source_url TEXT NOT NULL,
            thumbnail TEXT,
            FOREIGN KEY(playlist_id) REFERENCES playlists(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_videos_playlist ON videos(playlist_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_videos_playlist_sort ON videos(playlist_id, sort_order)",
        [],
    )?;

    // The base videos schema predates per-video notes. Add the column if
    // missing so old and new workspaces end up with the same shape.
    ensure_videos_notes(&conn)?;

    Ok(conn)
}

fn ensure_videos_notes(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "videos", "notes")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE videos ADD COLUMN notes TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
