use logwarden_contracts::ErrorClass;
use logwarden_model::ErrorKind;

/// Maps an HTTP response from the push endpoint to a coarse error class
/// (spec §4.3/§9: "a single pure function `classify(status, body) ->
/// ErrorClass`"). Kept free of any I/O so it can be exercised directly in
/// tests without spinning up a server.
pub fn classify(status: u16, _body: &str) -> ErrorClass {
    match status {
        200..=299 => ErrorClass::Success,
        400 | 401 | 403 | 422 => ErrorClass::Permanent,
        429 => ErrorClass::RateLimited,
        500..=599 => ErrorClass::Server,
        _ => ErrorClass::Temporary,
    }
}

/// Best-effort refinement of a permanent rejection's precise [`ErrorKind`]
/// from the response body, so timestamp rejections can feed the timestamp
/// learner instead of just counting as a generic permanent failure.
pub fn kind_hint(status: u16, body: &str) -> Option<ErrorKind> {
    if status != 400 {
        return None;
    }
    let lower = body.to_ascii_lowercase();
    if lower.contains("too old") || lower.contains("out of order") {
        Some(ErrorKind::TimestampTooOld)
    } else if lower.contains("too new") || lower.contains("future") {
        Some(ErrorKind::TimestampTooNew)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert_eq!(classify(200, ""), ErrorClass::Success);
        assert_eq!(classify(204, ""), ErrorClass::Success);
    }

    #[test]
    fn client_errors_are_permanent() {
        assert_eq!(classify(400, "bad request"), ErrorClass::Permanent);
        assert_eq!(classify(401, ""), ErrorClass::Permanent);
    }

    #[test]
    fn rate_limit_maps_to_rate_limited() {
        assert_eq!(classify(429, ""), ErrorClass::RateLimited);
    }

    #[test]
    fn server_errors_are_retryable() {
        assert_eq!(classify(500, ""), ErrorClass::Server);
        assert_eq!(classify(503, ""), ErrorClass::Server);
    }

    #[test]
    fn timestamp_hint_detected_from_body() {
        assert_eq!(kind_hint(400, "entry too old than oldest allowed"), Some(ErrorKind::TimestampTooOld));
        assert_eq!(kind_hint(400, "timestamp is in the future"), Some(ErrorKind::TimestampTooNew));
        assert_eq!(kind_hint(400, "missing tenant id"), None);
    }
}
