use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

/// Catalog export payload as the desktop shell hands it over: playlist
/// metadata plus one entry per video with the catalog's ISO-8601 duration.
/// The daemon never talks to the catalog API itself; it only validates and
/// decodes what the shell fetched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPayload {
    pub playlist: CatalogPlaylist,
    pub videos: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPlaylist {
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// ISO-8601 duration string, e.g. "PT1H23M45S".
    pub duration: String,
}

#[derive(Debug, Clone)]
pub struct ImportedVideo {
    pub video_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration_seconds: i64,
    pub source_url: String,
}

#[derive(Debug, Clone)]
pub struct ImportedPlaylist {
    pub title: String,
    pub thumbnail: Option<String>,
    pub videos: Vec<ImportedVideo>,
}

/// Pull the playlist id out of a full watch/playlist URL, or pass a bare id
/// through unchanged.
pub fn extract_playlist_id(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Some(pos) = trimmed.find("list=") else {
        // Already a bare id as long as it looks like one.
        if trimmed.chars().all(is_id_char) {
            return Some(trimmed.to_string());
        }
        return None;
    };
    let rest = &trimmed[pos + "list=".len()..];
    let id: String = rest.chars().take_while(|c| is_id_char(*c)).collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse the ISO-8601 duration subset the catalog emits: `P[nD][T[nH][nM][nS]]`.
/// Year/month designators are rejected rather than guessed at.
pub fn parse_iso8601_duration(raw: &str) -> anyhow::Result<i64> {
    let s = raw.trim();
    let rest = s
        .strip_prefix('P')
        .ok_or_else(|| anyhow!("duration must start with 'P': {:?}", raw))?;

    let mut total: i64 = 0;
    let mut in_time = false;
    let mut num = String::new();
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            'T' | 't' => {
                if !num.is_empty() {
                    bail!("dangling number before 'T' in duration {:?}", raw);
                }
                in_time = true;
            }
            '0'..='9' => num.push(c),
            _ => {
                let n: i64 = num
                    .parse()
                    .with_context(|| format!("bad number in duration {:?}", raw))?;
                num.clear();
                let unit: i64 = match (c.to_ascii_uppercase(), in_time) {
                    ('D', false) => 86_400,
                    ('H', true) => 3_600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => bail!("unsupported designator {:?} in duration {:?}", c, raw),
                };
                total += n * unit;
                saw_component = true;
            }
        }
    }
    if !num.is_empty() {
        bail!("trailing number without designator in duration {:?}", raw);
    }
    if !saw_component {
        bail!("duration has no components: {:?}", raw);
    }
    Ok(total)
}

/// Decode and validate a catalog payload into rows ready for insertion.
pub fn decode_payload(raw: &serde_json::Value) -> anyhow::Result<ImportedPlaylist> {
    let payload: CatalogPayload =
        serde_json::from_value(raw.clone()).context("payload does not match catalog export shape")?;

    if payload.playlist.title.trim().is_empty() {
        bail!("playlist title is empty");
    }
    if payload.videos.is_empty() {
        bail!("payload contains no videos");
    }

    let mut videos = Vec::with_capacity(payload.videos.len());
    for (i, entry) in payload.videos.iter().enumerate() {
        if entry.video_id.trim().is_empty() {
            bail!("video #{} has an empty id", i + 1);
        }
        let duration_seconds = parse_iso8601_duration(&entry.duration)
            .with_context(|| format!("video #{} ({})", i + 1, entry.video_id))?;
        videos.push(ImportedVideo {
            video_id: entry.video_id.clone(),
            title: entry.title.clone(),
            thumbnail: entry.thumbnail.clone(),
            duration_seconds,
            source_url: format!("https://www.youtube.com/watch?v={}", entry.video_id),
        });
    }

    Ok(ImportedPlaylist {
        title: payload.playlist.title.clone(),
        thumbnail: payload.playlist.thumbnail.clone(),
        videos,
    })
}
