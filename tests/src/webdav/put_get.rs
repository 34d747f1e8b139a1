/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use hyper::StatusCode;
use tbox::CHUNK_SIZE;

use super::WebDavTest;

#[tokio::test]
async fn large_put_slices_into_chunks() {
    let test = WebDavTest::new();
    let size = 2 * CHUNK_SIZE as usize + 4096;
    let data = vec![42u8; size];

    test.request_with_owned_headers("PUT", "/big.bin", Vec::new(), data)
        .await
        .with_status(StatusCode::CREATED);

    test.request("HEAD", "/big.bin", "")
        .await
        .with_status(StatusCode::OK)
        .with_header("content-length", &size.to_string());
}

#[tokio::test]
async fn interrupted_put_resumes_with_renewed_credentials() {
    let test = WebDavTest::new();
    let size = 3 * CHUNK_SIZE as usize;
    let data = vec![7u8; size];

    // Part 3 keeps failing, so the first PUT gives up after its
    // retries and parks the session
    test.backend.fail_part_times(3, 3);
    test.request_with_owned_headers("PUT", "/big.bin", Vec::new(), data.clone())
        .await
        .with_status(StatusCode::SERVICE_UNAVAILABLE);
    test.request("GET", "/big.bin", "")
        .await
        .with_status(StatusCode::NOT_FOUND);

    // The repeated PUT resumes the session: credentials are renewed,
    // only the missing part is uploaded, and the upload confirms
    test.request_with_owned_headers("PUT", "/big.bin", Vec::new(), data)
        .await
        .with_status(StatusCode::NO_CONTENT);
    assert!(test.backend.renewal_count() >= 1);

    test.request("HEAD", "/big.bin", "")
        .await
        .with_status(StatusCode::OK)
        .with_header("content-length", &size.to_string());
}

#[tokio::test]
async fn transient_chunk_failures_retry_in_place() {
    let test = WebDavTest::new();
    test.backend.fail_part_times(1, 2);
    test.put("/retry.txt", "payload")
        .await
        .with_status(StatusCode::CREATED);
    let response = test.request("GET", "/retry.txt", "").await;
    assert_eq!(response.body, "payload");
}

#[tokio::test]
async fn put_without_content_length_buffers_the_body() {
    let test = WebDavTest::new();
    // No Content-Length header: the body arrives chunked
    test.request_with_owned_headers("PUT", "/chunked.txt", Vec::new(), Vec::new())
        .await
        .with_status(StatusCode::CREATED);
    test.request("HEAD", "/chunked.txt", "")
        .await
        .with_status(StatusCode::OK)
        .with_header("content-length", "0");
}

#[tokio::test]
async fn put_into_nested_directories() {
    let test = WebDavTest::new();
    test.mkcol("/a").await.with_status(StatusCode::CREATED);
    test.mkcol("/a/b").await.with_status(StatusCode::CREATED);
    test.put("/a/b/f.txt", "deep").await.with_status(StatusCode::CREATED);
    let response = test.request("GET", "/a/b/f.txt", "").await;
    assert_eq!(response.body, "deep");
}

#[tokio::test]
async fn put_to_collection_is_rejected() {
    let test = WebDavTest::new();
    test.mkcol("/dir").await.with_status(StatusCode::CREATED);
    test.put("/dir", "x")
        .await
        .with_status(StatusCode::METHOD_NOT_ALLOWED);
    test.put("/dir/", "x")
        .await
        .with_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn etag_changes_on_overwrite() {
    let test = WebDavTest::new();
    let first = test.put("/e.txt", "one").await.with_status(StatusCode::CREATED);
    let first_etag = first.header("etag").unwrap().to_string();
    let second = test.put("/e.txt", "two").await.with_status(StatusCode::NO_CONTENT);
    assert_ne!(second.header("etag").unwrap(), first_etag);
}

#[tokio::test]
async fn if_match_preconditions_guard_put() {
    let test = WebDavTest::new();
    test.put("/p.txt", "v1").await.with_status(StatusCode::CREATED);
    let etag = test
        .request("GET", "/p.txt", "")
        .await
        .header("etag")
        .unwrap()
        .to_string();

    test.request_with_owned_headers(
        "PUT",
        "/p.txt",
        vec![("if-match", "\"mismatched\"".to_string())],
        b"v2".to_vec(),
    )
    .await
    .with_status(StatusCode::PRECONDITION_FAILED);

    test.request_with_owned_headers(
        "PUT",
        "/p.txt",
        vec![("if-match", etag)],
        b"v2".to_vec(),
    )
    .await
    .with_status(StatusCode::NO_CONTENT);
}
