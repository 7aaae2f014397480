use std::rc::Rc;

use remodel::{Model, ModelError, RollbackOptions, SaveError};
use serde_json::json;

mod common;
use common::{Call, MemoryStorage};

#[tokio::test]
async fn create_routes_new_models() {
    let storage = Rc::new(MemoryStorage::new());
    let mut model = Model::builder("id", json!({"id": null, "name": "Ada"}))
        .with_storage(storage.clone())
        .build()
        .unwrap();

    model.update(|data| data["name"] = json!("Grace"));
    assert!(model.is_new());
    assert!(model.dirty());

    model.save().await.unwrap();

    assert_eq!(
        storage.calls(),
        vec![Call::Create(json!({"id": null, "name": "Grace"}))]
    );
    assert!(!model.is_new());
    assert!(!model.dirty());
    assert!(!model.saving());
}

#[tokio::test]
async fn scalar_create_response_fills_id_field() {
    let storage = Rc::new(MemoryStorage::new());
    storage.respond_to_create(json!(42));
    let mut model = Model::builder("id", json!({"id": null, "name": "Ada"}))
        .with_storage(storage.clone())
        .build()
        .unwrap();

    model.save().await.unwrap();
    assert_eq!(model.id_value(), json!(42));

    model.update(|data| data["name"] = json!("Grace"));
    model.save().await.unwrap();

    assert_eq!(
        storage.calls()[1],
        Call::Update(json!(42), json!({"id": 42, "name": "Grace"}))
    );
    assert!(!model.dirty());
}

#[tokio::test]
async fn object_update_response_replaces_record() {
    let storage = Rc::new(MemoryStorage::new());
    // Server strips the nickname on save
    storage.respond_to_update(json!({"id": 7, "name": "Ada", "nickname": null}));
    let mut model = Model::builder("id", json!({"id": 7, "name": "Ada", "nickname": "admin"}))
        .with_storage(storage.clone())
        .with_rollback(RollbackOptions::default())
        .build()
        .unwrap();
    // Persisted record: leave the new-model path
    model.save().await.unwrap();

    model.update(|data| data["name"] = json!("Ada L."));
    model.save().await.unwrap();

    assert_eq!(model.data(), json!({"id": 7, "name": "Ada", "nickname": null}));
    assert!(!model.dirty());

    // Snapshot was refreshed to the server's record
    model.update(|data| data["name"] = json!("x"));
    model.rollback();
    assert_eq!(model.data(), json!({"id": 7, "name": "Ada", "nickname": null}));
}

#[tokio::test]
async fn null_response_leaves_record_untouched() {
    let storage = Rc::new(MemoryStorage::new());
    storage.respond_to_create(json!(null));
    let mut model = Model::builder("id", json!({"id": null, "name": "Ada"}))
        .with_storage(storage)
        .build()
        .unwrap();

    model.save().await.unwrap();
    assert_eq!(model.data(), json!({"id": null, "name": "Ada"}));
}

#[tokio::test]
async fn destroy_routes_deleted_models() {
    let storage = Rc::new(MemoryStorage::new());
    let mut model = Model::builder("id", json!({"id": 3, "name": "Ada"}))
        .with_storage(storage.clone())
        .build()
        .unwrap();
    model.save().await.unwrap();

    model.delete();
    model.save().await.unwrap();

    assert_eq!(
        storage.calls()[1],
        Call::Destroy(json!(3), json!({"id": 3, "name": "Ada"}))
    );
    assert!(model.destroyed());
    assert!(model.deleted());
    assert!(!model.destroying());
}

#[tokio::test]
async fn failed_destroy_reverts_deletion_mark() {
    let storage = Rc::new(MemoryStorage::new());
    let mut model = Model::builder("id", json!({"id": 3}))
        .with_storage(storage.clone())
        .build()
        .unwrap();
    model.save().await.unwrap();

    model.delete();
    storage.fail_next();
    let err = model.save().await.unwrap_err();

    assert!(matches!(err, SaveError::Persistence(_)));
    assert_eq!(err.to_string(), "storage offline");
    assert!(!model.deleted());
    assert!(!model.destroyed());
    assert!(!model.destroying());
}

#[tokio::test]
async fn failed_create_keeps_model_new_and_dirty() {
    let storage = Rc::new(MemoryStorage::new());
    let mut model = Model::builder("id", json!({"id": null, "name": ""}))
        .with_storage(storage.clone())
        .build()
        .unwrap();

    model.update(|data| data["name"] = json!("Ada"));
    storage.fail_next();
    assert!(model.save().await.is_err());

    assert!(model.is_new());
    assert!(model.dirty());
    assert!(!model.creating());
    assert!(storage.calls().is_empty());
}

#[tokio::test]
async fn save_without_capability_is_a_config_error() {
    let mut model = Model::builder("id", json!({})).build().unwrap();
    let err = model.save().await.unwrap_err();
    assert!(matches!(
        err,
        SaveError::Config(ModelError::SaveNotEnabled)
    ));
}
