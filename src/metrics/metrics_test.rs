use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("pathkv".to_string()), None).unwrap();
    register_custom_metrics(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    STORE_OPERATIONS.with_label_values(&["write"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"pathkv_store_operations"),
        "Missing pathkv_store_operations"
    );
    assert!(
        metric_names.contains(&"pathkv_updates_published"),
        "Missing pathkv_updates_published"
    );
}

#[test]
fn test_counter_increment() {
    let before = UPDATES_DROPPED.get();

    UPDATES_DROPPED.inc();
    UPDATES_DROPPED.inc();

    // other tests may drop updates concurrently
    assert!(UPDATES_DROPPED.get() >= before + 2);
}

#[test]
fn test_encode_metrics_renders_text_format() {
    let registry = create_test_registry();
    PUBLISH_FANOUT.observe(3.0);

    let text = encode_metrics(&registry);
    assert!(text.contains("pathkv_publish_fanout_bucket"));
}
