/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use hyper::StatusCode;
use store::InfiniteDepthMode;

use super::WebDavTest;

const PROPFIND_NAME_LENGTH: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
    <D:propfind xmlns:D="DAV:">
      <D:prop><D:displayname/><D:getcontentlength/></D:prop>
    </D:propfind>"#;

#[tokio::test]
async fn propfind_depth_zero_on_collection() {
    let test = WebDavTest::new();
    test.mkcol("/docs").await.with_status(StatusCode::CREATED);

    let response = test
        .propfind("/docs/", "0", PROPFIND_NAME_LENGTH)
        .await
        .with_status(StatusCode::MULTI_STATUS);

    // Exactly one response, addressed by the collection href
    assert_eq!(response.hrefs(), vec!["/docs/"]);
    assert_eq!(
        response.value("D:multistatus.D:response.D:propstat.D:prop.D:displayname"),
        "docs"
    );
    // Collections have no content length; the property lands in a 404
    // propstat
    assert_eq!(
        response.property_status("D:getcontentlength").unwrap(),
        "HTTP/1.1 404 Not Found"
    );
    assert_eq!(
        response.property_status("D:displayname").unwrap(),
        "HTTP/1.1 200 OK"
    );
}

#[tokio::test]
async fn propfind_depth_one_lists_parent_before_children() {
    let test = WebDavTest::new();
    test.mkcol("/docs").await.with_status(StatusCode::CREATED);
    test.mkcol("/docs/sub").await.with_status(StatusCode::CREATED);
    test.put("/docs/a.txt", "a").await.with_status(StatusCode::CREATED);

    let response = test
        .propfind("/docs/", "1", "")
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(response.hrefs(), vec!["/docs/", "/docs/a.txt", "/docs/sub/"]);
}

#[tokio::test]
async fn propfind_infinity_walks_the_tree() {
    let test = WebDavTest::new();
    test.mkcol("/a").await.with_status(StatusCode::CREATED);
    test.mkcol("/a/b").await.with_status(StatusCode::CREATED);
    test.put("/a/b/c.txt", "c").await.with_status(StatusCode::CREATED);

    let response = test
        .propfind("/", "infinity", "")
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(response.hrefs(), vec!["/", "/a/", "/a/b/", "/a/b/c.txt"]);
}

#[tokio::test]
async fn propfind_infinity_can_be_rejected() {
    let test = super::WebDavTest::with_config(dav::DavConfig {
        infinite_depth_mode: InfiniteDepthMode::Rejected,
        ..dav::DavConfig::default()
    });
    test.mkcol("/docs").await.with_status(StatusCode::CREATED);
    test.propfind("/docs/", "infinity", "")
        .await
        .with_status(StatusCode::FORBIDDEN)
        .with_value("D:error.D:propfind-finite-depth", "");
    // Finite depths remain available
    test.propfind("/docs/", "1", "")
        .await
        .with_status(StatusCode::MULTI_STATUS);
}

#[tokio::test]
async fn propfind_missing_resource() {
    let test = WebDavTest::new();
    test.propfind("/nope", "0", "")
        .await
        .with_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn allprop_skips_expensive_properties() {
    let test = WebDavTest::new();
    test.put("/f.txt", "body").await.with_status(StatusCode::CREATED);

    let response = test
        .propfind("/f.txt", "0", "")
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(
        response.value("D:multistatus.D:response.D:propstat.D:prop.D:getcontentlength"),
        "4"
    );
    assert_eq!(
        response.value("D:multistatus.D:response.D:propstat.D:prop.D:iscollection"),
        "0"
    );
    assert!(response
        .values("D:multistatus.D:response.D:propstat.D:prop.Z:Win32FileAttributes")
        .is_empty());

    // Expensive properties are still served when asked for by name
    let response = test
        .propfind(
            "/f.txt",
            "0",
            r#"<D:propfind xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:">
                 <D:allprop/>
                 <D:include><Z:Win32FileAttributes/></D:include>
               </D:propfind>"#,
        )
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(
        response.value("D:multistatus.D:response.D:propstat.D:prop.Z:Win32FileAttributes"),
        "00000020"
    );
}

#[tokio::test]
async fn propname_returns_names_only() {
    let test = WebDavTest::new();
    test.put("/f.txt", "body").await.with_status(StatusCode::CREATED);

    let response = test
        .propfind(
            "/f.txt",
            "0",
            r#"<D:propfind xmlns:D="DAV:"><D:propname/></D:propfind>"#,
        )
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(
        response.value("D:multistatus.D:response.D:propstat.D:prop.D:getlastmodified"),
        ""
    );
}

#[tokio::test]
async fn resourcetype_distinguishes_collections() {
    let test = WebDavTest::new();
    test.mkcol("/dir").await.with_status(StatusCode::CREATED);
    test.put("/f.txt", "x").await.with_status(StatusCode::CREATED);

    let response = test.propfind("/dir/", "0", "").await;
    assert_eq!(
        response.values("D:multistatus.D:response.D:propstat.D:prop.D:resourcetype.D:collection")
            .len(),
        1
    );
    assert_eq!(
        response.value("D:multistatus.D:response.D:propstat.D:prop.D:getcontenttype"),
        "httpd/unix-directory"
    );

    let response = test.propfind("/f.txt", "0", "").await;
    assert!(response
        .values("D:multistatus.D:response.D:propstat.D:prop.D:resourcetype.D:collection")
        .is_empty());
}

#[tokio::test]
async fn proppatch_win32_attributes_roundtrip() {
    let test = WebDavTest::new();
    test.put("/f.txt", "x").await.with_status(StatusCode::CREATED);

    let response = test
        .request(
            "PROPPATCH",
            "/f.txt",
            r#"<?xml version="1.0" encoding="utf-8" ?>
               <D:propertyupdate xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:">
                 <D:set>
                   <D:prop><Z:Win32FileAttributes>00000022</Z:Win32FileAttributes></D:prop>
                 </D:set>
               </D:propertyupdate>"#,
        )
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(
        response.property_status("Z:Win32FileAttributes").unwrap(),
        "HTTP/1.1 200 OK"
    );

    let response = test
        .propfind(
            "/f.txt",
            "0",
            r#"<D:propfind xmlns:D="DAV:" xmlns:Z="urn:schemas-microsoft-com:">
                 <D:prop><Z:Win32FileAttributes/></D:prop>
               </D:propfind>"#,
        )
        .await;
    assert_eq!(
        response.value("D:multistatus.D:response.D:propstat.D:prop.Z:Win32FileAttributes"),
        "00000022"
    );
}

#[tokio::test]
async fn proppatch_rejects_protected_and_unknown_properties() {
    let test = WebDavTest::new();
    test.put("/f.txt", "x").await.with_status(StatusCode::CREATED);

    let response = test
        .request(
            "PROPPATCH",
            "/f.txt",
            r#"<?xml version="1.0" encoding="utf-8" ?>
               <D:propertyupdate xmlns:D="DAV:" xmlns:X="urn:example:">
                 <D:set>
                   <D:prop><D:getetag>"forged"</D:getetag></D:prop>
                 </D:set>
                 <D:set>
                   <D:prop><X:custom>v</X:custom></D:prop>
                 </D:set>
               </D:propertyupdate>"#,
        )
        .await
        .with_status(StatusCode::MULTI_STATUS);
    assert_eq!(
        response.property_status("D:getetag").unwrap(),
        "HTTP/1.1 403 Forbidden"
    );
}

#[tokio::test]
async fn proppatch_missing_resource() {
    let test = WebDavTest::new();
    test.request(
        "PROPPATCH",
        "/nope",
        r#"<D:propertyupdate xmlns:D="DAV:"><D:set><D:prop><D:displayname>x</D:displayname></D:prop></D:set></D:propertyupdate>"#,
    )
    .await
    .with_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_propfind_body() {
    let test = WebDavTest::new();
    test.request_with_headers(
        "PROPFIND",
        "/",
        [("depth", "0"), ("content-type", "text/xml")],
        r#"<D:lockinfo xmlns:D="DAV:"/>"#,
    )
    .await
    .with_status(StatusCode::BAD_REQUEST);
}
