mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn import_decodes_payload_and_persists_videos_in_order() {
    let workspace = temp_dir("studyplanner-import");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.register",
        json!({ "email": "a@b.c", "password": "pw" }),
    );
    let login = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "email": "a@b.c", "password": "pw" }),
    );
    let token = login
        .get("sessionToken")
        .and_then(|v| v.as_str())
        .expect("sessionToken")
        .to_string();

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "playlists.import",
        json!({
            "sessionToken": token,
            "sourceUrl": "https://www.youtube.com/playlist?list=PLrust4beginners",
            "payload": {
                "playlist": { "title": "Rust for Beginners", "thumbnail": "https://img/x.jpg" },
                "videos": [
                    { "videoId": "aaa", "title": "Intro", "duration": "PT4M13S" },
                    { "videoId": "bbb", "title": "Ownership", "duration": "PT1H2M" },
                    { "videoId": "ccc", "title": "Borrowing", "duration": "PT59S" }
                ]
            }
        }),
    );
    assert_eq!(imported.get("totalVideos").and_then(|v| v.as_u64()), Some(3));
    let playlist_id = imported
        .get("playlistId")
        .and_then(|v| v.as_str())
        .expect("playlistId")
        .to_string();

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "videos.list",
        json!({ "sessionToken": token, "playlistId": playlist_id }),
    );
    let videos = listed
        .get("videos")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(videos.len(), 3);
    assert_eq!(videos[0].get("title").and_then(|v| v.as_str()), Some("Intro"));
    assert_eq!(
        videos[0].get("durationSeconds").and_then(|v| v.as_i64()),
        Some(253)
    );
    assert_eq!(
        videos[1].get("durationSeconds").and_then(|v| v.as_i64()),
        Some(3720)
    );
    assert_eq!(
        videos[0].get("status").and_then(|v| v.as_str()),
        Some("Not Started")
    );
    assert_eq!(videos[0].get("scheduledDate"), Some(&serde_json::Value::Null));
    assert_eq!(
        videos[2].get("sourceUrl").and_then(|v| v.as_str()),
        Some("https://www.youtube.com/watch?v=ccc")
    );

    // Bad payloads are rejected before anything is written.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "playlists.import",
        json!({
            "sessionToken": token,
            "sourceUrl": "https://www.youtube.com/playlist?list=PLbroken",
            "payload": {
                "playlist": { "title": "Broken" },
                "videos": [ { "videoId": "x", "title": "Bad", "duration": "4 minutes" } ]
            }
        }),
    );
    assert_eq!(code, "bad_payload");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "playlists.import",
        json!({
            "sessionToken": token,
            "sourceUrl": "https://example.com/not-a-playlist",
            "payload": {
                "playlist": { "title": "No Id" },
                "videos": [ { "videoId": "x", "title": "Ok", "duration": "PT1M" } ]
            }
        }),
    );
    assert_eq!(code, "bad_params");

    let lists = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "playlists.list",
        json!({ "sessionToken": token }),
    );
    assert_eq!(
        lists
            .get("playlists")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(1)
    );
}

#[test]
fn sessions_gate_every_playlist_scoped_method() {
    let workspace = temp_dir("studyplanner-sessions");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "playlists.list",
        json!({ "sessionToken": "bogus" }),
    );
    assert_eq!(code, "invalid_session");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.register",
        json!({ "email": "dup@b.c", "password": "pw" }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "auth.register",
        json!({ "email": "dup@b.c", "password": "other" }),
    );
    assert_eq!(code, "email_taken");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "auth.login",
        json!({ "email": "dup@b.c", "password": "wrong" }),
    );
    assert_eq!(code, "invalid_credentials");

    // Logged-out tokens stop working.
    let login = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "auth.login",
        json!({ "email": "dup@b.c", "password": "pw" }),
    );
    let token = login
        .get("sessionToken")
        .and_then(|v| v.as_str())
        .expect("sessionToken")
        .to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "auth.logout",
        json!({ "sessionToken": token }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "playlists.list",
        json!({ "sessionToken": token }),
    );
    assert_eq!(code, "invalid_session");
}

#[test]
fn users_cannot_see_each_others_playlists() {
    let workspace = temp_dir("studyplanner-ownership");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let (_token_a, playlist_id) = test_support::seed_playlist(
        &mut stdin,
        &mut reader,
        &workspace,
        &["PT10M"],
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.register",
        json!({ "email": "other@b.c", "password": "pw" }),
    );
    let login = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "email": "other@b.c", "password": "pw" }),
    );
    let token_b = login
        .get("sessionToken")
        .and_then(|v| v.as_str())
        .expect("sessionToken")
        .to_string();

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "videos.list",
        json!({ "sessionToken": token_b, "playlistId": playlist_id }),
    );
    assert_eq!(code, "not_found");
}
