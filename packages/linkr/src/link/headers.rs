//! Request headers that are stored alongside a link.

use std::borrow::Cow;

use axum::http::HeaderMap;
use clients::linkr::v1::FORWARD_HEADER_PREFIX;
use tracing::warn;

const DELIMITERS: [char; 3] = ['=', ',', ';'];

/// Collect the forwarded headers of a request into their stored form.
///
/// A header named `Linkr-Forward-<name>` (any case) is stored as
/// `<name>=<value>`; repeated headers join their values with `,` and entries
/// are separated by `;`. Names keep the lowercase form the HTTP layer gives
/// them. Returns `None` when the request carries no forwarded headers.
///
/// Names or values containing a delimiter are stored as-is and logged, since
/// the stored form can't represent them unambiguously.
pub fn encode_forwarded(headers: &HeaderMap) -> Option<String> {
    let prefix = FORWARD_HEADER_PREFIX.to_ascii_lowercase();
    let entries = headers
        .keys()
        .filter_map(|name| {
            let suffix = name.as_str().strip_prefix(prefix.as_str())?;
            if suffix.is_empty() {
                return None;
            }

            let values = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<Cow<'_, str>>>();
            if suffix.contains(DELIMITERS) || values.iter().any(|v| v.contains(DELIMITERS)) {
                warn!(header = %name, "links.headers.unescaped_delimiter");
            }

            Some(format!("{suffix}={}", values.join(",")))
        })
        .collect::<Vec<_>>();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join(";"))
    }
}
