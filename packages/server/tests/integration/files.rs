use crate::common::{TestApp, routes};

#[tokio::test]
async fn file_download_sets_metadata_headers() {
    let app = TestApp::spawn().await;
    let uploaded = app.upload("cube.stl", b"solid cube".to_vec()).await;
    let file_id = uploaded.body["originalFileId"].as_str().unwrap();

    let (status, headers, bytes) = app.get_bytes(&routes::file(file_id)).await;

    assert_eq!(status, 200);
    assert_eq!(bytes, b"solid cube");
    assert_eq!(headers["content-length"], "10");
    assert!(headers.contains_key("etag"));
    assert!(
        headers["content-disposition"]
            .to_str()
            .unwrap()
            .starts_with("inline; filename=\"cube.stl\"")
    );
}

#[tokio::test]
async fn matching_etag_returns_not_modified() {
    let app = TestApp::spawn().await;
    let uploaded = app.upload("scan.ply", b"ply\nformat ascii 1.0\n".to_vec()).await;
    let path = routes::file(uploaded.body["originalFileId"].as_str().unwrap());

    let first = app.get(&path).await;
    let etag = first.headers["etag"].to_str().unwrap().to_string();

    let second = app.get_with_header(&path, "If-None-Match", &etag).await;
    assert_eq!(second.status, 304);
    assert!(second.text.is_empty());

    let stale = app
        .get_with_header(&path, "If-None-Match", "\"0000\"")
        .await;
    assert_eq!(stale.status, 200);
}

#[tokio::test]
async fn unknown_file_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app
        .get(&routes::file("01936f0e12347abc8000000000000001"))
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_file_id_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::file("..%2F..%2Fetc%2Fpasswd")).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}
