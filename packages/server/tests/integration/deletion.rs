use chrono::Utc;
use common::storage::{BlobId, BlobStore};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use server::entity::{annotation, asset};
use server::services::{self, AssetError};

use crate::common::{TestApp, routes, seed_asset};

mod over_http {
    use super::*;

    #[tokio::test]
    async fn deleting_a_ready_asset_removes_everything() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload("cube.stl", b"solid".to_vec()).await;
        let asset_id = uploaded.id();
        let file_id = uploaded.body["originalFileId"].as_str().unwrap().to_string();
        app.create_annotation(&asset_id, "one").await;
        app.create_annotation(&asset_id, "two").await;

        let res = app.delete(&routes::asset(&asset_id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Asset deleted successfully");
        assert_eq!(app.get(&routes::asset(&asset_id)).await.status, 404);
        assert_eq!(app.get(&routes::file(&file_id)).await.status, 404);
        assert!(app.store.is_empty());
        assert_eq!(annotation::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_a_converted_asset_removes_both_blobs() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload("bracket.step", b"ISO-10303-21;".to_vec()).await;
        let asset_id = uploaded.id();
        let settled = app.wait_until_settled(&asset_id).await;
        assert_eq!(settled["status"], "ready");
        assert_eq!(app.store.len(), 2);

        let res = app.delete(&routes::asset(&asset_id)).await;

        assert_eq!(res.status, 200);
        assert!(app.store.is_empty());
        let renderable = settled["renderableFileId"].as_str().unwrap();
        assert_eq!(app.get(&routes::file(renderable)).await.status, 404);
    }

    #[tokio::test]
    async fn deleting_unknown_asset_is_not_found_and_changes_nothing() {
        let app = TestApp::spawn().await;
        let kept = app.upload("cube.stl", b"solid".to_vec()).await.id();
        app.create_annotation(&kept, "keep me").await;

        let res = app
            .delete(&routes::asset("01936f0e-1234-7abc-8000-000000000001"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(app.store.len(), 1);
        assert_eq!(asset::Entity::find().count(&app.db).await.unwrap(), 1);
        assert_eq!(annotation::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn annotations_of_other_assets_survive() {
        let app = TestApp::spawn().await;
        let doomed = app.upload("a.stl", b"a".to_vec()).await.id();
        let kept = app.upload("b.stl", b"b".to_vec()).await.id();
        app.create_annotation(&doomed, "gone").await;
        app.create_annotation(&kept, "stays").await;

        app.delete(&routes::asset(&doomed)).await;

        let res = app.get(&routes::annotations_for(&kept)).await;
        assert_eq!(res.body.as_array().unwrap().len(), 1);
        assert_eq!(annotation::Entity::find().count(&app.db).await.unwrap(), 1);
    }
}

mod workflow {
    use super::*;

    #[tokio::test]
    async fn missing_blobs_do_not_block_deletion() {
        let app = TestApp::spawn().await;
        let model = seed_asset(&app.db, &*app.store, "cube.stl", b"solid", Utc::now()).await;
        app.store
            .delete(&BlobId::from_uuid(model.original_blob_id))
            .await
            .unwrap();

        let report = services::delete_asset(&app.db, &*app.store, model.id)
            .await
            .unwrap();

        assert_eq!(report.asset_id, model.id);
        assert_eq!(report.blobs_deleted, 0);
        assert_eq!(report.blobs_missing, 1);
        assert_eq!(asset::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn report_counts_annotations() {
        let app = TestApp::spawn().await;
        let asset_id = app.upload("cube.stl", b"solid".to_vec()).await.id();
        app.create_annotation(&asset_id, "one").await;
        app.create_annotation(&asset_id, "two").await;

        let report = services::delete_asset(
            &app.db,
            &*app.store,
            Uuid::parse_str(&asset_id).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(report.blobs_deleted, 1);
        assert_eq!(report.blobs_missing, 0);
        assert_eq!(report.annotations_deleted, 2);
    }

    #[tokio::test]
    async fn unknown_asset_is_reported_as_not_found() {
        let app = TestApp::spawn().await;

        let result = services::delete_asset(&app.db, &*app.store, Uuid::now_v7()).await;

        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }
}
