//! Catalog-wide guarantees
//!
//! These walk every configured resource rather than a hand-picked few, so a
//! new catalog entry is covered without touching the tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use backoffice::codec::FormValue;
use backoffice::screens::permanent_filter;
use backoffice::{
    default_registry, parse_composite_id, AdminConfig, AdminError, FormMode, FormOrchestrator,
    LockedFieldSet,
};

#[test]
fn test_registry_builds() {
    let registry = default_registry().unwrap();
    assert!(registry.len() >= 20);
    for group in registry.groups() {
        for resource in &group.resources {
            assert!(registry.contains(resource), "{} missing", resource);
        }
    }
}

#[test]
fn test_permanent_filter_for_every_org_scoped_resource() {
    let registry = default_registry().unwrap();
    for schema in registry.iter() {
        let filter = permanent_filter(schema, Some("7"));
        match &schema.org_key {
            Some(key) => {
                let filter = filter.unwrap_or_else(|| panic!("{} has no filter", schema.name));
                assert_eq!(&filter.field, key);
                assert_eq!(filter.value, json!("7"));
            }
            None => assert!(filter.is_none(), "{} is not org scoped", schema.name),
        }
        // No active organization, no scoping
        assert!(permanent_filter(schema, None).is_none());
    }
}

#[tokio::test]
async fn test_empty_required_field_never_reaches_backend() {
    let registry = default_registry().unwrap();
    let calls = AtomicUsize::new(0);

    for schema in registry.iter() {
        for field in schema.fields.iter().filter(|f| f.required) {
            let mut form = FormOrchestrator::new(
                schema.fields.clone(),
                FormMode::Create,
                None,
                LockedFieldSet::new(),
            );
            form.set_value(&field.key, FormValue::null());

            let result = form
                .submit(|payload| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(payload) }
                })
                .await;

            assert!(
                matches!(result, Err(AdminError::Validation { .. })),
                "{}.{} accepted an empty value",
                schema.name,
                field.key
            );
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_composite_ids() {
    let key = parse_composite_id("orgA:userB").unwrap();
    assert_eq!(key.org_id, "orgA");
    assert_eq!(key.user_id, "userB");

    for bad in ["malformed", ":userB", "orgA:", "a:b:c", ""] {
        assert!(
            matches!(
                parse_composite_id(bad),
                Err(AdminError::InvalidCompositeId { .. })
            ),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backoffice.toml");

    let mut config = AdminConfig::default();
    config.relations.option_limit = 50;
    config.import.natural_key = "phone".into();
    config.save(&path).unwrap();

    let loaded = AdminConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}
