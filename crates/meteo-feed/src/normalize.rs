use reqwest::Url;

const PASTEBIN_HOSTS: &[&str] = &["pastebin.com", "www.pastebin.com"];

/// Rewrite "human paste" URLs to their raw-content form.
///
/// `https://pastebin.com/PMQueqDV` becomes `https://pastebin.com/raw/PMQueqDV`.
/// URLs already under `/raw/`, URLs on other hosts and unparseable input are
/// returned unchanged, so applying this twice is the same as applying it once.
pub fn normalize_source_url(url: &str) -> String {
    let trimmed = url.trim();
    let Ok(parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    let is_pastebin = parsed
        .host_str()
        .is_some_and(|host| PASTEBIN_HOSTS.iter().any(|h| host.eq_ignore_ascii_case(h)));
    if !is_pastebin {
        return trimmed.to_string();
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [] => trimmed.to_string(),
        [first, ..] if first.eq_ignore_ascii_case("raw") => trimmed.to_string(),
        [.., id] => format!("https://pastebin.com/raw/{id}"),
    }
}
