use std::io::Read;

use url::Url;

use crate::error::ExtractError;

/// Fetches the source document in one blocking request. Any transport
/// failure, non-success status, or empty body is fatal for the run; there
/// is no retry.
pub fn fetch_document(raw_url: &str) -> Result<Vec<u8>, ExtractError> {
    let parsed = Url::parse(raw_url)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid document URL: {error}")))?;

    let response = ureq::get(parsed.as_str())
        .call()
        .map_err(|error| match error {
            ureq::Error::Status(status, _) => ExtractError::FetchStatus(status),
            other => ExtractError::Fetch(other.to_string()),
        })?;

    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Err(ExtractError::Fetch("fetched document is empty".to_string()));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::fetch_document;
    use crate::error::ExtractError;

    #[test]
    fn rejects_unparseable_urls() {
        let error = fetch_document("not a url").expect_err("fetch should fail");
        assert!(matches!(error, ExtractError::InvalidOption(_)));
    }
}
