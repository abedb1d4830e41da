// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Shared helpers for HTTP providers

use crate::error::{ApiError, PilotError};

/// Extract the numeric form of a Retry-After header, in seconds
pub fn extract_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Map a transport failure to the error taxonomy
pub fn send_error(e: reqwest::Error) -> PilotError {
    if e.is_timeout() {
        PilotError::Api(ApiError::Timeout)
    } else if e.is_connect() {
        PilotError::Api(ApiError::Network(e.to_string()))
    } else {
        PilotError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_extract_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(extract_retry_after(&headers), Some(30));
    }

    #[test]
    fn test_extract_retry_after_http_date_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(extract_retry_after(&headers), None);
        assert_eq!(extract_retry_after(&HeaderMap::new()), None);
    }
}
