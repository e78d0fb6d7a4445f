use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RoomError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        RoomError::asset_load("x")
            .to_string()
            .contains("asset load error:")
    );
    assert!(
        RoomError::binding_mismatch("x")
            .to_string()
            .contains("binding mismatch:")
    );
    assert!(
        RoomError::capture_unavailable("x")
            .to_string()
            .contains("capture unavailable:")
    );
    assert!(
        RoomError::composition("x")
            .to_string()
            .contains("composition error:")
    );
    assert!(RoomError::busy("x").to_string().contains("pipeline busy:"));
}

#[test]
fn retryable_classification() {
    assert!(RoomError::asset_load("gone").is_retryable());
    assert!(RoomError::composition("oom").is_retryable());
    assert!(RoomError::busy("composing").is_retryable());
    assert!(!RoomError::validation("bad").is_retryable());
    assert!(!RoomError::binding_mismatch("Spine").is_retryable());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RoomError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
