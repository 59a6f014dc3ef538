use reqwest::Url;

use crate::error::CoreError;

/// Validate an Esplora base URL and strip any trailing slash so request
/// paths can be appended verbatim.
pub(super) fn parse_base_url(base_url: &str) -> Result<String, CoreError> {
    let parsed = Url::parse(base_url).map_err(|e| {
        CoreError::InvalidConfig(format!(
            "invalid explorer url `{base_url}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(base_url.trim_end_matches('/').to_owned()),
        other => Err(CoreError::InvalidConfig(format!(
            "unsupported explorer url scheme `{other}`; expected http or https"
        ))),
    }
}
