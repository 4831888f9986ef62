use super::*;

#[test]
fn test_parse_strips_leading_separator() {
    let with = Path::parse("/a/b/c").unwrap();
    let without = Path::parse("a/b/c").unwrap();

    assert_eq!(with, without);
    assert_eq!(with.segments(), &["a", "b", "c"]);
    assert_eq!(with.depth(), 3);
}

#[test]
fn test_display_is_canonical() {
    let path = Path::parse("users/42").unwrap();
    assert_eq!(path.to_string(), "/users/42");
    assert_eq!(format!("{path:?}"), "Path(/users/42)");
}

#[test]
fn test_rejects_malformed_paths() {
    for raw in ["", "/", "a/", "/a/b/", "a//b", "//a", "a/./b", "a/../b", "..", "a/*", "a/b*c"] {
        let err = Path::parse(raw).unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidPath { .. }),
            "{raw:?} should be rejected"
        );
    }
}

#[test]
fn test_segments_are_case_sensitive() {
    assert_ne!(Path::parse("a/B").unwrap(), Path::parse("a/b").unwrap());
}

#[test]
fn test_check_limits() {
    let path = Path::parse("a/bb/ccc").unwrap();

    assert!(path.check_limits(3, 3).is_ok());
    assert!(matches!(
        path.check_limits(2, 3),
        Err(StoreError::InvalidPath { .. })
    ));
    assert!(matches!(
        path.check_limits(3, 2),
        Err(StoreError::InvalidPath { .. })
    ));
}

#[test]
fn test_serde_uses_string_form() {
    let path = Path::parse("/orders/1").unwrap();
    let json = serde_json::to_string(&path).unwrap();
    assert_eq!(json, "\"/orders/1\"");

    let back: Path = serde_json::from_str(&json).unwrap();
    assert_eq!(back, path);

    assert!(serde_json::from_str::<Path>("\"a//b\"").is_err());
}
