/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::{
    schema::response::{MultiStatus, Response},
    Depth, RequestHeaders,
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http_proto::HttpResponse;
use hyper::StatusCode;
use store::DavPath;

use crate::{
    common::uri::DavUriResource, file::item_href, store_error_status, DavError, DavServer,
};

pub(crate) trait DeleteRequestHandler: Sync + Send {
    fn handle_delete_request(
        &self,
        headers: &RequestHeaders<'_>,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl DeleteRequestHandler for DavServer {
    async fn handle_delete_request(
        &self,
        headers: &RequestHeaders<'_>,
    ) -> crate::Result<HttpResponse> {
        let path = self.validate_uri(headers.uri)?;
        if path.is_root() {
            return Err(DavError::Code(StatusCode::FORBIDDEN));
        }
        let item = self.map_resource(&path).await?;

        if item.is_collection() && !matches!(headers.depth, Depth::Infinity | Depth::None) {
            return Err(DavError::Code(StatusCode::FORBIDDEN));
        }
        self.validate_headers(headers, &path, Some(&item), item.is_collection())?;

        if !item.is_collection() {
            self.store.delete(&path).await?;
            self.locks.remove_resource(path.as_key());
            self.properties.forget(path.as_key());
            return Ok(HttpResponse::new(StatusCode::NO_CONTENT));
        }

        // Per-child failures do not stop the sweep; they accumulate
        // into a multi-status while siblings keep getting deleted
        let mut failures = Vec::new();
        let deleted = self.delete_tree(&path, &mut failures).await?;
        if deleted && failures.is_empty() {
            self.locks.remove_resource(path.as_key());
            self.properties.forget(path.as_key());
            return Ok(HttpResponse::new(StatusCode::NO_CONTENT));
        }

        let parent_status = failures
            .first()
            .map(|(_, status)| *status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let parent_href = item_href(&item);
        let mut response = MultiStatus::new(Vec::with_capacity(failures.len() + 1));
        for (href, status) in &failures {
            response.add_response(Response::new_status(href.as_str(), *status));
        }
        if !failures.iter().any(|(href, _)| *href == parent_href) {
            response.add_response(Response::new_status(parent_href, parent_status));
        }

        Ok(HttpResponse::new(StatusCode::MULTI_STATUS).with_xml_body(response.to_string()))
    }
}

impl DavServer {
    /// Depth-first removal; a collection is only deleted once all of
    /// its children are gone. Returns whether `path` itself was
    /// deleted.
    pub(crate) fn delete_tree<'x>(
        &'x self,
        path: &'x DavPath,
        failures: &'x mut Vec<(String, StatusCode)>,
    ) -> BoxFuture<'x, crate::Result<bool>> {
        async move {
            let children = self.store.get_children(path).await?;
            let mut all_deleted = true;
            for child in children {
                let child_path = DavPath::from_key(child.full_path());
                if child.is_collection() {
                    all_deleted &= self.delete_tree(&child_path, failures).await?;
                } else {
                    match self.store.delete(&child_path).await {
                        Ok(()) => {
                            self.locks.remove_resource(child_path.as_key());
                            self.properties.forget(child_path.as_key());
                        }
                        Err(err) => {
                            failures.push((item_href(&child), store_error_status(&err)));
                            all_deleted = false;
                        }
                    }
                }
            }
            if !all_deleted {
                return Ok(false);
            }
            match self.store.delete(path).await {
                Ok(()) => {
                    self.locks.remove_resource(path.as_key());
                    self.properties.forget(path.as_key());
                    Ok(true)
                }
                Err(err) => {
                    failures.push((
                        store::path::encode_href(path.as_key(), true),
                        store_error_status(&err),
                    ));
                    Ok(false)
                }
            }
        }
        .boxed()
    }
}
