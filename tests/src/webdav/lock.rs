/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Duration;

use hyper::StatusCode;

use super::{DavResponse, WebDavTest};

const LOCK_REQUEST: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
     <D:lockinfo xmlns:D='DAV:'>
       <D:lockscope><D:$SCOPE/></D:lockscope>
       <D:locktype><D:write/></D:locktype>
       <D:owner>
         <D:href>$OWNER</D:href>
       </D:owner>
     </D:lockinfo>"#;

impl WebDavTest {
    async fn lock_create(
        &self,
        path: &str,
        owner: &str,
        is_exclusive: bool,
        depth: &'static str,
        timeout: &'static str,
    ) -> DavResponse {
        let body = LOCK_REQUEST
            .replace("$SCOPE", if is_exclusive { "exclusive" } else { "shared" })
            .replace("$OWNER", owner);
        self.request_with_owned_headers(
            "LOCK",
            path,
            vec![("depth", depth.to_string()), ("timeout", timeout.to_string())],
            body.into_bytes(),
        )
        .await
    }

    async fn lock_refresh(&self, path: &str, token: &str, timeout: &'static str) -> DavResponse {
        self.request_with_owned_headers(
            "LOCK",
            path,
            vec![
                ("if", format!("(<{token}>)")),
                ("timeout", timeout.to_string()),
            ],
            Vec::new(),
        )
        .await
    }

    async fn unlock(&self, path: &str, token: &str) -> DavResponse {
        self.request_with_owned_headers(
            "UNLOCK",
            path,
            vec![("lock-token", format!("<{token}>"))],
            Vec::new(),
        )
        .await
    }
}

#[tokio::test]
async fn lock_then_put_with_token() {
    let test = WebDavTest::new();

    let response = test
        .lock_create("/a.txt", "u", true, "0", "Second-60")
        .await
        .with_status(StatusCode::OK)
        .with_value("D:prop.D:lockdiscovery.D:activelock.D:owner.D:href", "u")
        .with_value("D:prop.D:lockdiscovery.D:activelock.D:timeout", "Second-60");
    let token = response.lock_token();
    assert!(token.starts_with("opaquelocktoken:"), "{token}");
    assert_eq!(
        response.header("lock-token").unwrap(),
        format!("<{token}>")
    );

    // Without the token the resource stays untouchable
    test.put("/a.txt", "contents")
        .await
        .with_status(StatusCode::LOCKED);

    // With the token the PUT creates the resource
    let condition = format!("(<{token}>)");
    test.request_with_owned_headers(
        "PUT",
        "/a.txt",
        vec![("if", condition)],
        b"contents".to_vec(),
    )
    .await
    .with_status(StatusCode::CREATED);
}

#[tokio::test]
async fn locked_error_body_names_the_lock_root() {
    let test = WebDavTest::new();
    test.put("/b.txt", "x").await.with_status(StatusCode::CREATED);
    test.lock_create("/b.txt", "u", true, "0", "Second-60")
        .await
        .with_status(StatusCode::OK);

    test.put("/b.txt", "y")
        .await
        .with_status(StatusCode::LOCKED)
        .with_value("D:error.D:lock-token-submitted.D:href", "/b.txt");
}

#[tokio::test]
async fn exclusive_locks_conflict() {
    let test = WebDavTest::new();
    test.put("/c.txt", "x").await.with_status(StatusCode::CREATED);
    test.lock_create("/c.txt", "one", true, "0", "Second-60")
        .await
        .with_status(StatusCode::OK);
    test.lock_create("/c.txt", "two", true, "0", "Second-60")
        .await
        .with_status(StatusCode::LOCKED)
        .with_value("D:error.D:no-conflicting-lock.D:href", "/c.txt");
}

#[tokio::test]
async fn shared_locks_coexist_until_exclusive() {
    let test = WebDavTest::new();
    test.put("/s.txt", "x").await.with_status(StatusCode::CREATED);
    test.lock_create("/s.txt", "one", false, "0", "Second-60")
        .await
        .with_status(StatusCode::OK);
    test.lock_create("/s.txt", "two", false, "0", "Second-60")
        .await
        .with_status(StatusCode::OK);
    test.lock_create("/s.txt", "three", true, "0", "Second-60")
        .await
        .with_status(StatusCode::LOCKED);
}

#[tokio::test]
async fn infinity_lock_covers_the_subtree() {
    let test = WebDavTest::new();
    test.mkcol("/tree").await.with_status(StatusCode::CREATED);
    let token = test
        .lock_create("/tree", "owner", true, "infinity", "Second-120")
        .await
        .with_status(StatusCode::OK)
        .with_value("D:prop.D:lockdiscovery.D:activelock.D:depth", "infinity")
        .lock_token();

    // No lock below an exclusive infinity lock
    test.lock_create("/tree/file.txt", "other", true, "0", "Second-60")
        .await
        .with_status(StatusCode::LOCKED)
        .with_value("D:error.D:no-conflicting-lock.D:href", "/tree");

    // Mutations below need the ancestor's token
    test.put("/tree/file.txt", "x")
        .await
        .with_status(StatusCode::LOCKED);
    let condition = format!("(<{token}>)");
    test.request_with_owned_headers(
        "PUT",
        "/tree/file.txt",
        vec![("if", condition.clone())],
        b"x".to_vec(),
    )
    .await
    .with_status(StatusCode::CREATED);

    // The lock shows up in lockdiscovery of descendants
    let response = test
        .propfind(
            "/tree/file.txt",
            "0",
            r#"<D:propfind xmlns:D="DAV:"><D:prop><D:lockdiscovery/></D:prop></D:propfind>"#,
        )
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(
        response.value(
            "D:multistatus.D:response.D:propstat.D:prop.D:lockdiscovery.D:activelock.D:lockroot.D:href"
        ),
        "/tree"
    );
}

#[tokio::test]
async fn refresh_resets_the_timer() {
    let test = WebDavTest::new();
    test.put("/r.txt", "x").await.with_status(StatusCode::CREATED);
    let token = test
        .lock_create("/r.txt", "u", true, "0", "Second-60")
        .await
        .with_status(StatusCode::OK)
        .lock_token();

    let response = test
        .lock_refresh("/r.txt", &token, "Second-120")
        .await
        .with_status(StatusCode::OK)
        .with_value("D:prop.D:lockdiscovery.D:activelock.D:timeout", "Second-120");
    // Refresh does not mint a token
    assert!(response.header("lock-token").is_none());

    test.lock_refresh("/r.txt", "opaquelocktoken:bogus", "Second-60")
        .await
        .with_status(StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn unlock_semantics() {
    let test = WebDavTest::new();
    test.put("/u.txt", "x").await.with_status(StatusCode::CREATED);
    let token = test
        .lock_create("/u.txt", "u", true, "0", "Second-60")
        .await
        .with_status(StatusCode::OK)
        .lock_token();

    test.unlock("/u.txt", "opaquelocktoken:bogus")
        .await
        .with_status(StatusCode::CONFLICT)
        .with_value("D:error.D:lock-token-matches-request-uri", "");

    test.unlock("/u.txt", &token)
        .await
        .with_status(StatusCode::NO_CONTENT);

    // The resource is writable again
    test.put("/u.txt", "y").await.with_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn lock_expires_by_timeout() {
    let test = WebDavTest::new();
    test.put("/e.txt", "x").await.with_status(StatusCode::CREATED);
    let token = test
        .lock_create("/e.txt", "u", true, "0", "Second-1")
        .await
        .with_status(StatusCode::OK)
        .lock_token();

    tokio::time::sleep(Duration::from_secs(2)).await;

    // The expired lock is gone; its token no longer unlocks anything
    test.unlock("/e.txt", &token)
        .await
        .with_status(StatusCode::CONFLICT);

    // And the resource can be locked afresh
    test.lock_create("/e.txt", "v", true, "0", "Second-60")
        .await
        .with_status(StatusCode::OK);
}

#[tokio::test]
async fn lock_timeouts_are_capped() {
    let test = WebDavTest::new();
    test.put("/t.txt", "x").await.with_status(StatusCode::CREATED);
    test.lock_create("/t.txt", "u", true, "0", "Second-99999")
        .await
        .with_status(StatusCode::OK)
        .with_value("D:prop.D:lockdiscovery.D:activelock.D:timeout", "Second-600");
}

#[tokio::test]
async fn lock_depth_one_is_invalid() {
    let test = WebDavTest::new();
    test.put("/d.txt", "x").await.with_status(StatusCode::CREATED);
    test.lock_create("/d.txt", "u", true, "1", "Second-60")
        .await
        .with_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unlock_without_token_header() {
    let test = WebDavTest::new();
    test.request("UNLOCK", "/x.txt", "")
        .await
        .with_status(StatusCode::BAD_REQUEST);
}
