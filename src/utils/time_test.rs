use super::time::now_millis;

#[test]
fn test_now_millis_is_after_2020() {
    // 2020-01-01T00:00:00Z
    assert!(now_millis() > 1_577_836_800_000);
}

#[test]
fn test_now_millis_does_not_go_backwards() {
    let first = now_millis();
    let second = now_millis();
    assert!(second >= first);
}
