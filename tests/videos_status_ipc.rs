mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, seed_playlist, spawn_sidecar, temp_dir};

#[test]
fn update_status_validates_and_persists_notes() {
    let workspace = temp_dir("studyplanner-video-status");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let (token, playlist_id) =
        seed_playlist(&mut stdin, &mut reader, &workspace, &["PT10M", "PT20M"]);

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "videos.list",
        json!({ "sessionToken": token, "playlistId": playlist_id }),
    );
    let video_id = listed.get("videos").and_then(|v| v.as_array()).unwrap()[0]
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "videos.updateStatus",
        json!({
            "sessionToken": token,
            "videoId": video_id,
            "status": "In Progress",
            "notes": "stopped at 04:20"
        }),
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "videos.list",
        json!({ "sessionToken": token, "playlistId": playlist_id }),
    );
    let v0 = &listed.get("videos").and_then(|v| v.as_array()).unwrap()[0];
    assert_eq!(v0.get("status").and_then(|v| v.as_str()), Some("In Progress"));
    assert_eq!(
        v0.get("notes").and_then(|v| v.as_str()),
        Some("stopped at 04:20")
    );

    // Status change without notes keeps the existing note.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "videos.updateStatus",
        json!({ "sessionToken": token, "videoId": v0.get("id").unwrap(), "status": "Rewatch" }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "videos.list",
        json!({ "sessionToken": token, "playlistId": playlist_id }),
    );
    let v0 = &listed.get("videos").and_then(|v| v.as_array()).unwrap()[0];
    assert_eq!(v0.get("status").and_then(|v| v.as_str()), Some("Rewatch"));
    assert_eq!(
        v0.get("notes").and_then(|v| v.as_str()),
        Some("stopped at 04:20")
    );

    // An explicit null clears the note.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "videos.updateStatus",
        json!({
            "sessionToken": token,
            "videoId": v0.get("id").unwrap(),
            "status": "Completed",
            "notes": null
        }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "videos.list",
        json!({ "sessionToken": token, "playlistId": playlist_id }),
    );
    let v0 = &listed.get("videos").and_then(|v| v.as_array()).unwrap()[0];
    assert_eq!(v0.get("status").and_then(|v| v.as_str()), Some("Completed"));
    assert!(v0.get("notes").unwrap().is_null());

    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "videos.updateStatus",
        json!({ "sessionToken": token, "videoId": v0.get("id").unwrap(), "status": "Watched" }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "9",
        "videos.updateStatus",
        json!({ "sessionToken": token, "videoId": "missing", "status": "Completed" }),
    );
    assert_eq!(code, "not_found");
}
