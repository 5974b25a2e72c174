// Error status mapping as seen by the response layer

use dims::error::{DimsError, ErrorKind};
use dims::signing::SigningError;

#[test]
fn test_status_codes() {
    let cases = [
        (DimsError::bad_request("x"), 400, ErrorKind::BadRequest),
        (DimsError::status(403, "x"), 403, ErrorKind::Unauthorized),
        (DimsError::status(502, "x"), 502, ErrorKind::Upstream),
        (DimsError::operation("resize", "a", "x"), 400, ErrorKind::BadRequest),
        (DimsError::unauthorized("x"), 401, ErrorKind::Unauthorized),
        (DimsError::timeout("x"), 504, ErrorKind::Timeout),
        (DimsError::internal("x"), 500, ErrorKind::Internal),
    ];
    for (err, status, kind) in cases {
        assert_eq!(err.status_code(), status, "{}", err);
        assert_eq!(err.kind(), kind, "{}", err);
    }
}

#[test]
fn test_signing_errors_are_bad_requests() {
    let err: DimsError = SigningError::DecryptFailed.into();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "failed to decrypt payload");
}

#[test]
fn test_error_kind_display() {
    assert_eq!(ErrorKind::BadRequest.to_string(), "bad_request");
    assert_eq!(ErrorKind::Upstream.to_string(), "upstream");
}
