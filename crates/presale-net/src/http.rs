//! Response handling shared by the HTTP providers.

use crate::error::NetError;

/// Longest error body kept in [`NetError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Pass through a successful response, turn anything else into
/// [`NetError::Status`].
pub(crate) async fn checked(provider: &'static str, resp: reqwest::Response) -> Result<reqwest::Response, NetError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(NetError::Status {
        provider,
        status: status.as_u16(),
        body: truncate(body.trim()),
    })
}

/// Decode a hex body into bytes.
pub(crate) fn decode_hex_body(body: &str) -> Result<Vec<u8>, NetError> {
    hex::decode(body.trim()).map_err(|e| NetError::Decode(format!("expected hex body: {e}")))
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
