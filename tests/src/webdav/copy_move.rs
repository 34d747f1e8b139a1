/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use hyper::StatusCode;

use super::{DavResponse, WebDavTest};

impl WebDavTest {
    async fn copy_move(
        &self,
        method: &str,
        from: &str,
        to: &str,
        overwrite: Option<&str>,
    ) -> DavResponse {
        let mut headers = vec![("destination", format!("http://localhost:8080{to}"))];
        if let Some(overwrite) = overwrite {
            headers.push(("overwrite", overwrite.to_string()));
        }
        self.request_with_owned_headers(method, from, headers, Vec::new())
            .await
    }
}

#[tokio::test]
async fn move_overwrite_denied_changes_nothing() {
    let test = WebDavTest::new();
    test.put("/a", "source").await.with_status(StatusCode::CREATED);
    test.put("/b", "destination").await.with_status(StatusCode::CREATED);

    test.copy_move("MOVE", "/a", "/b", Some("F"))
        .await
        .with_status(StatusCode::PRECONDITION_FAILED);

    let response = test.request("GET", "/a", "").await.with_status(StatusCode::OK);
    assert_eq!(response.body, "source");
    let response = test.request("GET", "/b", "").await.with_status(StatusCode::OK);
    assert_eq!(response.body, "destination");
}

#[tokio::test]
async fn move_renames_server_side() {
    let test = WebDavTest::new();
    test.put("/a.txt", "payload").await.with_status(StatusCode::CREATED);

    test.copy_move("MOVE", "/a.txt", "/b.txt", None)
        .await
        .with_status(StatusCode::CREATED);

    test.request("GET", "/a.txt", "")
        .await
        .with_status(StatusCode::NOT_FOUND);
    let response = test.request("GET", "/b.txt", "").await.with_status(StatusCode::OK);
    assert_eq!(response.body, "payload");
}

#[tokio::test]
async fn move_replacing_destination_reports_no_content() {
    let test = WebDavTest::new();
    test.put("/a", "new").await.with_status(StatusCode::CREATED);
    test.put("/b", "old").await.with_status(StatusCode::CREATED);

    test.copy_move("MOVE", "/a", "/b", Some("T"))
        .await
        .with_status(StatusCode::NO_CONTENT);
    let response = test.request("GET", "/b", "").await.with_status(StatusCode::OK);
    assert_eq!(response.body, "new");
}

#[tokio::test]
async fn copy_keeps_the_source() {
    let test = WebDavTest::new();
    test.put("/a.txt", "payload").await.with_status(StatusCode::CREATED);

    test.copy_move("COPY", "/a.txt", "/copy.txt", None)
        .await
        .with_status(StatusCode::CREATED);

    for path in ["/a.txt", "/copy.txt"] {
        let response = test.request("GET", path, "").await.with_status(StatusCode::OK);
        assert_eq!(response.body, "payload");
    }
}

#[tokio::test]
async fn copy_collection_recurses() {
    let test = WebDavTest::new();
    test.mkcol("/src").await.with_status(StatusCode::CREATED);
    test.mkcol("/src/sub").await.with_status(StatusCode::CREATED);
    test.put("/src/f.txt", "f").await.with_status(StatusCode::CREATED);
    test.put("/src/sub/g.txt", "g").await.with_status(StatusCode::CREATED);

    test.copy_move("COPY", "/src/", "/dst/", None)
        .await
        .with_status(StatusCode::CREATED);

    for path in ["/dst/f.txt", "/dst/sub/g.txt", "/src/f.txt"] {
        test.request("GET", path, "").await.with_status(StatusCode::OK);
    }
}

#[tokio::test]
async fn copy_depth_zero_creates_the_collection_only() {
    let test = WebDavTest::new();
    test.mkcol("/src").await.with_status(StatusCode::CREATED);
    test.put("/src/f.txt", "f").await.with_status(StatusCode::CREATED);

    test.request_with_owned_headers(
        "COPY",
        "/src/",
        vec![
            ("destination", "http://localhost:8080/dst/".to_string()),
            ("depth", "0".to_string()),
        ],
        Vec::new(),
    )
    .await
    .with_status(StatusCode::CREATED);

    test.propfind("/dst/", "0", "")
        .await
        .with_status(StatusCode::MULTI_STATUS);
    test.request("GET", "/dst/f.txt", "")
        .await
        .with_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn move_collection_takes_the_subtree() {
    let test = WebDavTest::new();
    test.mkcol("/src").await.with_status(StatusCode::CREATED);
    test.put("/src/f.txt", "f").await.with_status(StatusCode::CREATED);

    test.copy_move("MOVE", "/src/", "/dst/", None)
        .await
        .with_status(StatusCode::CREATED);

    test.request("GET", "/dst/f.txt", "").await.with_status(StatusCode::OK);
    test.propfind("/src/", "0", "")
        .await
        .with_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn move_with_finite_depth_is_rejected() {
    let test = WebDavTest::new();
    test.put("/a", "x").await.with_status(StatusCode::CREATED);
    test.request_with_owned_headers(
        "MOVE",
        "/a",
        vec![
            ("destination", "http://localhost:8080/b".to_string()),
            ("depth", "0".to_string()),
        ],
        Vec::new(),
    )
    .await
    .with_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn copy_into_own_subtree_is_forbidden() {
    let test = WebDavTest::new();
    test.mkcol("/src").await.with_status(StatusCode::CREATED);
    test.copy_move("COPY", "/src/", "/src/inner/", None)
        .await
        .with_status(StatusCode::FORBIDDEN);
    test.copy_move("COPY", "/src/", "/src/", None)
        .await
        .with_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn destination_must_share_the_authority() {
    let test = WebDavTest::new();
    test.put("/a", "x").await.with_status(StatusCode::CREATED);
    test.request_with_owned_headers(
        "COPY",
        "/a",
        vec![("destination", "http://elsewhere/b".to_string())],
        Vec::new(),
    )
    .await
    .with_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_destination_header() {
    let test = WebDavTest::new();
    test.put("/a", "x").await.with_status(StatusCode::CREATED);
    test.request("COPY", "/a", "")
        .await
        .with_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn moving_a_locked_source_requires_its_token() {
    let test = WebDavTest::new();
    test.put("/locked.txt", "x").await.with_status(StatusCode::CREATED);
    let token = test
        .request_with_owned_headers(
            "LOCK",
            "/locked.txt",
            vec![("timeout", "Second-60".to_string())],
            r#"<D:lockinfo xmlns:D="DAV:">
                 <D:lockscope><D:exclusive/></D:lockscope>
                 <D:locktype><D:write/></D:locktype>
               </D:lockinfo>"#
                .as_bytes()
                .to_vec(),
        )
        .await
        .with_status(StatusCode::OK)
        .lock_token();

    test.copy_move("MOVE", "/locked.txt", "/moved.txt", None)
        .await
        .with_status(StatusCode::LOCKED);

    test.request_with_owned_headers(
        "MOVE",
        "/locked.txt",
        vec![
            ("destination", "http://localhost:8080/moved.txt".to_string()),
            ("if", format!("(<{token}>)")),
        ],
        Vec::new(),
    )
    .await
    .with_status(StatusCode::CREATED);
    test.request("GET", "/moved.txt", "").await.with_status(StatusCode::OK);
}
