use super::*;

#[test]
fn display_prefixes_are_stable() {
    let r = PixelRect::new(0, 0, 1, 1).unwrap();
    assert!(
        ZoomError::out_of_bounds(r, r)
            .to_string()
            .contains("out of bounds:")
    );
    assert!(
        ZoomError::invalid_dimension("x")
            .to_string()
            .contains("invalid dimension:")
    );
    assert!(ZoomError::config("x").to_string().contains("config error:"));
    assert!(ZoomError::encode("x").to_string().contains("encode error:"));
    assert!(
        ZoomError::DetectionEmpty
            .to_string()
            .contains("detection empty:")
    );
}

#[test]
fn render_failure_names_the_failing_index() {
    let err = ZoomError::RenderFailure {
        index: 3,
        failed: 2,
        source: Box::new(ZoomError::invalid_dimension("bad")),
    };
    let msg = err.to_string();
    assert!(msg.contains("frame #3"));
    assert!(msg.contains("2 task(s)"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn caller_errors_are_classified() {
    let r = PixelRect::new(0, 0, 1, 1).unwrap();
    assert!(ZoomError::out_of_bounds(r, r).is_caller_error());
    assert!(ZoomError::invalid_dimension("x").is_caller_error());
    assert!(!ZoomError::DetectionEmpty.is_caller_error());
    assert!(!ZoomError::Cancelled.is_caller_error());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ZoomError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
