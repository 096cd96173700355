use std::sync::Arc;

use crate::common::{FailingEngine, TestApp, TestOptions, routes};

const STL: &[u8] = b"solid cube\nendsolid cube\n";

mod native_formats {
    use super::*;

    #[tokio::test]
    async fn natively_renderable_uploads_are_ready_immediately() {
        let app = TestApp::spawn().await;

        for (name, format) in [("cube.stl", "stl"), ("scan.ply", "ply"), ("print.3mf", "3mf")] {
            let res = app.upload(name, STL.to_vec()).await;

            assert_eq!(res.status, 201, "{name}: {}", res.text);
            assert_eq!(res.body["format"], format);
            assert_eq!(res.body["status"], "ready");
            assert_eq!(res.body["renderableFileId"], res.body["originalFileId"]);
            assert_eq!(res.body["title"], name);
            assert_eq!(res.body["originalFilename"], name);
            assert_eq!(res.body["fileSize"].as_i64().unwrap(), STL.len() as i64);
            assert!(res.body["uploadDate"].as_str().is_some());
        }
        assert_eq!(app.store.len(), 3);
    }

    #[tokio::test]
    async fn extension_matching_is_case_insensitive() {
        let app = TestApp::spawn().await;

        let res = app.upload("CUBE.STL", STL.to_vec()).await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["format"], "stl");
        assert_eq!(res.body["originalFilename"], "CUBE.STL");
    }

    #[tokio::test]
    async fn identical_uploads_get_distinct_blobs() {
        let app = TestApp::spawn().await;

        let first = app.upload("a.stl", STL.to_vec()).await;
        let second = app.upload("b.stl", STL.to_vec()).await;

        assert_ne!(first.body["originalFileId"], second.body["originalFileId"]);
        assert_ne!(first.id(), second.id());
        assert_eq!(app.store.len(), 2);
    }

    #[tokio::test]
    async fn uploaded_bytes_are_served_back_unchanged() {
        let app = TestApp::spawn().await;
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

        let res = app.upload("big.ply", data.clone()).await;
        assert_eq!(res.status, 201);

        let file_id = res.body["originalFileId"].as_str().unwrap();
        let (status, _, bytes) = app.get_bytes(&routes::file(file_id)).await;
        assert_eq!(status, 200);
        assert_eq!(bytes, data);
    }
}

mod converted_formats {
    use super::*;

    #[tokio::test]
    async fn step_upload_starts_processing_then_becomes_ready() {
        let app = TestApp::spawn().await;

        let res = app.upload("bracket.step", b"ISO-10303-21;".to_vec()).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["format"], "step");
        assert_eq!(res.body["status"], "processing");
        assert!(res.body["renderableFileId"].is_null());

        let settled = app.wait_until_settled(&res.id()).await;
        assert_eq!(settled["status"], "ready");
        let renderable = settled["renderableFileId"].as_str().unwrap();
        assert_ne!(renderable, settled["originalFileId"].as_str().unwrap());

        let (status, headers, bytes) = app.get_bytes(&routes::file(renderable)).await;
        assert_eq!(status, 200);
        assert_eq!(&bytes[..4], b"glTF");
        assert!(
            headers["content-disposition"]
                .to_str()
                .unwrap()
                .contains(&format!("converted_{}.glb", res.id()))
        );
    }

    #[tokio::test]
    async fn stp_is_an_alias_for_step() {
        let app = TestApp::spawn().await;

        let res = app.upload("housing.STP", b"ISO-10303-21;".to_vec()).await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["format"], "step");
        assert_eq!(res.body["status"], "processing");
    }

    #[tokio::test]
    async fn engine_failure_is_visible_only_through_status() {
        let app = TestApp::spawn_with(TestOptions {
            engine: Arc::new(FailingEngine),
            ..Default::default()
        })
        .await;

        let res = app.upload("bracket.step", b"ISO-10303-21;".to_vec()).await;
        assert_eq!(res.status, 201);

        let settled = app.wait_until_settled(&res.id()).await;
        assert_eq!(settled["status"], "failed");
        assert!(settled["renderableFileId"].is_null());
        // Only the original remains.
        assert_eq!(app.store.len(), 1);
    }
}

mod rejected_uploads {
    use super::*;

    #[tokio::test]
    async fn unsupported_extension_writes_nothing() {
        let app = TestApp::spawn().await;

        let res = app.upload("teapot.obj", b"v 0 0 0".to_vec()).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "UNSUPPORTED_FORMAT");
        assert!(app.store.is_empty());
        let list = app.get(routes::ASSETS).await;
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn missing_extension_is_unsupported() {
        let app = TestApp::spawn().await;

        let res = app.upload("README", b"hello".to_vec()).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("title", "no file here");
        let res = app.send_form(form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn hidden_filename_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload(".stl", STL.to_vec()).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.store.is_empty());
    }

    #[tokio::test]
    async fn oversize_file_is_rejected_without_leftovers() {
        let app = TestApp::spawn_with(TestOptions {
            max_blob_size: 16,
            ..Default::default()
        })
        .await;

        let res = app.upload("big.stl", vec![0u8; 17]).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.store.is_empty());
        let list = app.get(routes::ASSETS).await;
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }
}
