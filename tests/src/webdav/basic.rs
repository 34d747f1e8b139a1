/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav::DavConfig;
use hyper::StatusCode;

use super::WebDavTest;

#[tokio::test]
async fn options_advertises_dav_support() {
    let test = WebDavTest::new();
    let response = test
        .request("OPTIONS", "/", "")
        .await
        .with_status(StatusCode::OK)
        .with_header("dav", "1, 2")
        .with_header("ms-author-via", "DAV");
    let allow = response.header("allow").unwrap();
    for method in ["PROPFIND", "LOCK", "MKCOL", "COPY", "MOVE"] {
        assert!(allow.contains(method), "{allow}");
    }
}

#[tokio::test]
async fn unknown_methods_are_not_implemented() {
    let test = WebDavTest::new();
    test.request("REPORT", "/", "")
        .await
        .with_status(StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn put_get_head_roundtrip() {
    let test = WebDavTest::new();
    test.put("/hello.txt", "hello world")
        .await
        .with_status(StatusCode::CREATED);

    let response = test
        .request("GET", "/hello.txt", "")
        .await
        .with_status(StatusCode::OK);
    assert_eq!(response.body, "hello world");
    assert!(response.header("etag").is_some());
    assert!(response.header("last-modified").unwrap().ends_with("GMT"));

    let response = test
        .request("HEAD", "/hello.txt", "")
        .await
        .with_status(StatusCode::OK)
        .with_header("content-length", "11");
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn put_overwrite_reports_no_content() {
    let test = WebDavTest::new();
    test.put("/a.txt", "one").await.with_status(StatusCode::CREATED);
    test.put("/a.txt", "two")
        .await
        .with_status(StatusCode::NO_CONTENT);
    let response = test.request("GET", "/a.txt", "").await;
    assert_eq!(response.body, "two");
}

#[tokio::test]
async fn put_without_parent_is_a_conflict() {
    let test = WebDavTest::new();
    test.put("/missing/a.txt", "x")
        .await
        .with_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn mkcol_semantics() {
    let test = WebDavTest::new();
    test.mkcol("/dir").await.with_status(StatusCode::CREATED);
    test.mkcol("/dir")
        .await
        .with_status(StatusCode::METHOD_NOT_ALLOWED);
    test.mkcol("/missing/dir")
        .await
        .with_status(StatusCode::CONFLICT);
    test.request("MKCOL", "/dir2", "<D:mkcol xmlns:D=\"DAV:\"/>")
        .await
        .with_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn collections_do_not_serve_content() {
    let test = WebDavTest::new();
    test.mkcol("/dir").await.with_status(StatusCode::CREATED);
    test.request("GET", "/dir/", "")
        .await
        .with_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_file_and_missing() {
    let test = WebDavTest::new();
    test.put("/a.txt", "x").await.with_status(StatusCode::CREATED);
    test.request("DELETE", "/a.txt", "")
        .await
        .with_status(StatusCode::NO_CONTENT);
    test.request("GET", "/a.txt", "")
        .await
        .with_status(StatusCode::NOT_FOUND);
    test.request("DELETE", "/a.txt", "")
        .await
        .with_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_collection_requires_infinity_depth() {
    let test = WebDavTest::new();
    test.mkcol("/dir").await.with_status(StatusCode::CREATED);
    test.request_with_headers("DELETE", "/dir/", [("depth", "1")], "")
        .await
        .with_status(StatusCode::FORBIDDEN);
    test.request_with_headers("DELETE", "/dir/", [("depth", "infinity")], "")
        .await
        .with_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn delete_collection_with_failing_child_yields_multistatus() {
    let test = WebDavTest::new();
    test.mkcol("/dir").await.with_status(StatusCode::CREATED);
    test.put("/dir/keep.txt", "k").await.with_status(StatusCode::CREATED);
    test.put("/dir/gone.txt", "g").await.with_status(StatusCode::CREATED);
    test.backend.fail_delete("dir/keep.txt");

    let response = test
        .request("DELETE", "/dir/", "")
        .await
        .with_status(StatusCode::MULTI_STATUS);
    let hrefs = response.hrefs();
    assert!(hrefs.contains(&"/dir/keep.txt"), "{hrefs:?}");
    assert!(hrefs.contains(&"/dir/"), "{hrefs:?}");
    assert_eq!(
        response.values("D:multistatus.D:response.D:status"),
        vec!["HTTP/1.1 403 Forbidden", "HTTP/1.1 403 Forbidden"]
    );

    // The sibling was deleted, the protected child survived
    test.request("GET", "/dir/gone.txt", "")
        .await
        .with_status(StatusCode::NOT_FOUND);
    test.request("GET", "/dir/keep.txt", "")
        .await
        .with_status(StatusCode::OK);
}

#[tokio::test]
async fn bad_depth_header_is_rejected() {
    let test = WebDavTest::new();
    test.request_with_headers("PROPFIND", "/", [("depth", "2")], "")
        .await
        .with_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn read_only_access_rejects_mutations() {
    let test = WebDavTest::with_config(DavConfig {
        read_only: true,
        ..DavConfig::default()
    });
    test.put("/a.txt", "x").await.with_status(StatusCode::FORBIDDEN);
    test.mkcol("/dir").await.with_status(StatusCode::FORBIDDEN);
    test.request("OPTIONS", "/", "").await.with_status(StatusCode::OK);
    test.propfind("/", "0", "").await.with_status(StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn range_requests() {
    let test = WebDavTest::new();
    test.put("/r.bin", "0123456789").await.with_status(StatusCode::CREATED);

    let response = test
        .request_with_headers("GET", "/r.bin", [("range", "bytes=2-4")], "")
        .await
        .with_status(StatusCode::PARTIAL_CONTENT)
        .with_header("content-range", "bytes 2-4/10");
    assert_eq!(response.body, "234");

    let response = test
        .request_with_headers("GET", "/r.bin", [("range", "bytes=-3")], "")
        .await
        .with_status(StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.body, "789");

    let response = test
        .request_with_headers("GET", "/r.bin", [("range", "bytes=6-")], "")
        .await
        .with_status(StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.body, "6789");

    test.request_with_headers("GET", "/r.bin", [("range", "bytes=10-")], "")
        .await
        .with_status(StatusCode::RANGE_NOT_SATISFIABLE)
        .with_header("content-range", "bytes */10");
}
