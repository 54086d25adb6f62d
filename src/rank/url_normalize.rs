//! URL canonicalisation for deduplication keys.
//!
//! Two URLs that differ only in case, trailing slash, default port,
//! fragment, parameter order or tracking parameters produce the same key.

use url::Url;

/// Query parameters dropped outright. Any `utm_*` key is dropped too.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "yclid", "mc_cid", "mc_eid", "_ga", "_gl", "ref",
    "ref_src", "si", "feature", "igshid",
];

fn is_tracking(key: &str) -> bool {
    let key = key.to_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Canonical form of `raw` for comparison.
///
/// Scheme, host and path are lowercased, the default port and fragment
/// removed, tracking parameters stripped, remaining parameters sorted and
/// a trailing slash on a non-root path removed. Unparseable input comes
/// back trimmed and lowercased.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw.trim()) else {
        return raw.trim().to_lowercase();
    };

    parsed.set_fragment(None);
    if matches!(
        (parsed.scheme(), parsed.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = parsed.set_port(None);
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_tracking(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();
    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let mut path = parsed.path().to_lowercase();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    parsed.set_path(&path);

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_and_tracking_param_collapse() {
        assert_eq!(
            normalize_url("https://bip.gdansk.pl/Uchwaly/"),
            normalize_url("https://BIP.gdansk.pl/uchwaly?utm_source=newsletter")
        );
    }

    #[test]
    fn keeps_meaningful_params_sorted() {
        assert_eq!(
            normalize_url("https://example.pl/szukaj?z=1&a=2&fbclid=x"),
            "https://example.pl/szukaj?a=2&z=1"
        );
    }

    #[test]
    fn strips_fragment_and_default_port() {
        assert_eq!(
            normalize_url("https://example.pl:443/a#sekcja"),
            "https://example.pl/a"
        );
        assert_eq!(
            normalize_url("http://example.pl:8080/a"),
            "http://example.pl:8080/a"
        );
    }

    #[test]
    fn root_path_is_kept() {
        assert_eq!(normalize_url("https://Example.pl"), "https://example.pl/");
        assert_eq!(normalize_url("https://example.pl/"), "https://example.pl/");
    }

    #[test]
    fn unknown_utm_variants_are_tracking() {
        assert_eq!(
            normalize_url("https://example.pl/a?UTM_Whatever=1"),
            "https://example.pl/a"
        );
    }

    #[test]
    fn unparseable_input_is_lowercased() {
        assert_eq!(normalize_url("  Not A URL "), "not a url");
    }
}
