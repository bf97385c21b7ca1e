// Query string filter module
// GET /records?field=value narrows the listing to matching records

use percent_encoding::percent_decode_str;

/// Parse a raw query string into `(field, value)` pairs.
///
/// Pairs without `=` are ignored. `+` decodes to a space and percent
/// sequences decode lossily, so a malformed escape never fails a request.
pub fn parse_filter(raw: Option<&str>) -> Vec<(String, String)> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (field, value) = pair.split_once('=')?;
            Some((decode(field), decode(value)))
        })
        .collect()
}

fn decode(component: &str) -> String {
    let unplussed = component.replace('+', " ");
    percent_decode_str(&unplussed)
        .decode_utf8_lossy()
        .into_owned()
}
