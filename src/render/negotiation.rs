use crate::error::EngineFault;

/// Weight given to `Accept` entries without a `q` parameter.
///
/// Above any legal `q` so unweighted entries keep their position ahead of
/// weighted ones.
const UNWEIGHTED: f32 = 2.0;

/// Client preference list from an `Accept` header, most preferred first.
///
/// Media type parameters other than `q` are dropped. Entries of equal weight
/// keep their header order.
#[must_use]
pub fn parse_accept(header: Option<&str>) -> Vec<String> {
    let Some(header) = header else {
        return Vec::new();
    };
    let mut entries: Vec<(f32, String)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let media = parts.next()?.trim().to_ascii_lowercase();
            if media.is_empty() {
                return None;
            }
            let weight = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(UNWEIGHTED);
            Some((weight, media))
        })
        .collect();
    entries.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    entries.into_iter().map(|(_, media)| media).collect()
}

/// Pick the output media type.
///
/// `text/html` wins whenever both sides list it. Otherwise the first client
/// entry the service also declares is used; `*/*` (or an empty preference
/// list) selects the service's first type and `type/*` the first declared
/// type of that family.
pub fn negotiate_output(preferences: &[String], allowed: &[String]) -> Result<String, EngineFault> {
    let html = "text/html";
    if preferences.iter().any(|p| p == html) && allowed.iter().any(|a| a == html) {
        return Ok(html.to_string());
    }
    if preferences.is_empty() {
        return allowed.first().cloned().ok_or(EngineFault::NotAcceptable);
    }
    for pref in preferences {
        if allowed.iter().any(|a| a == pref) {
            return Ok(pref.clone());
        }
        if pref == "*/*" {
            if let Some(first) = allowed.first() {
                return Ok(first.clone());
            }
        } else if let Some(family) = pref.strip_suffix("/*") {
            if let Some(found) = allowed
                .iter()
                .find(|a| a.split('/').next() == Some(family))
            {
                return Ok(found.clone());
            }
        }
    }
    Err(EngineFault::NotAcceptable)
}

/// Split `service.shortcut` into its two halves.
#[must_use]
pub fn split_shortcut(segment: &str) -> (&str, Option<&str>) {
    match segment.split_once('.') {
        Some((name, shortcut)) => (name, Some(shortcut)),
        None => (segment, None),
    }
}

/// Media type behind a shortcut token.
#[must_use]
pub fn shortcut_media_type(token: &str) -> Option<&'static str> {
    match token {
        "csv" => Some("text/csv"),
        "xml" => Some("application/xml"),
        "json" => Some("application/json"),
        "ext_json" => Some("application/ext+json"),
        _ => None,
    }
}
