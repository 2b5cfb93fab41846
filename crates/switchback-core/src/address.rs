#![forbid(unsafe_code)]

//! URL addressing for registry lookups.
//!
//! An address has the shape `{scheme}://{host}{/path}?{query}`. Host and
//! path concatenate into the registry key (`route://a/b` keys as `"a/b"`)
//! and query items fold into a [`Payload`] last-wins.
//!
//! Strings the URL parser rejects get one retry after percent-encoding the
//! characters a conforming URL cannot carry raw; a second failure is
//! [`IntentError::InvalidUrl`]. A missing host is invalid: there is no key
//! to look up.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use url::Url;

use crate::error::IntentError;
use crate::payload::{Payload, Value};

/// Characters escaped on the retry pass. Structural characters
/// (`:/?#&=`) stay raw so the address keeps its shape.
const RETRY_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// A parsed intent address.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlParts {
    pub scheme: String,
    /// Host and path concatenated and percent-decoded: `route://a/b/c`
    /// keys as `"a/b/c"`.
    pub key: String,
    /// Query items in order, duplicates collapsed last-wins; `None` when
    /// the address carries no query at all.
    pub params: Option<Payload>,
}

/// Parse an intent address, retrying once with percent-encoding.
pub fn parse(raw: &str) -> Result<UrlParts, IntentError> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => {
            let escaped = utf8_percent_encode(raw, RETRY_ESCAPE).to_string();
            Url::parse(&escaped).map_err(|_| IntentError::InvalidUrl {
                url: raw.to_string(),
            })?
        }
    };

    let Some(host) = url.host_str() else {
        return Err(IntentError::InvalidUrl {
            url: raw.to_string(),
        });
    };

    let mut key = String::from(host);
    let path = url.path();
    if !path.is_empty() && path != "/" {
        key.push_str(path);
    }
    let key = percent_decode_str(&key).decode_utf8_lossy().into_owned();

    let params = url.query().map(|_| {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), Value::from(v.into_owned())))
            .collect::<Payload>()
    });

    Ok(UrlParts {
        scheme: url.scheme().to_string(),
        key,
        params,
    })
}
