//! YouTube video ID extraction from the URL shapes people paste.

/// Pull the 11-character video ID out of a watch, short, embed, `/v/` or
/// shorts URL. Returns `None` for anything else.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if !lower.contains("youtube.com")
        && !lower.contains("youtu.be")
        && !lower.contains("youtube-nocookie.com")
    {
        return None;
    }

    ["?v=", "&v=", "youtu.be/", "/embed/", "/v/", "/shorts/", "/live/"]
        .iter()
        .find_map(|marker| after(url, marker))
        .and_then(valid_id)
}

/// Accept an explicit `video_id` field if it looks like one.
pub fn normalize_video_id(id: &str) -> Option<String> {
    valid_id(id.trim())
}

fn after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let start = url.find(marker)? + marker.len();
    let rest = &url[start..];
    let end = rest.find(['&', '#', '?', '/']).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn valid_id(id: &str) -> Option<String> {
    let ok = id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    ok.then(|| id.to_string())
}
