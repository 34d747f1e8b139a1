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
use store::{path::encode_href, DavPath, StoreItem};

use crate::{
    common::uri::DavUriResource, store_error_status, DavError, DavServer,
};

pub(crate) trait CopyMoveRequestHandler: Sync + Send {
    fn handle_copy_move_request(
        &self,
        headers: &RequestHeaders<'_>,
        is_move: bool,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl CopyMoveRequestHandler for DavServer {
    async fn handle_copy_move_request(
        &self,
        headers: &RequestHeaders<'_>,
        is_move: bool,
    ) -> crate::Result<HttpResponse> {
        let source = self.validate_uri(headers.uri)?;
        if source.is_root() {
            return Err(DavError::Code(StatusCode::FORBIDDEN));
        }
        let item = self.map_resource(&source).await?;

        let destination = self.validate_destination(headers)?;
        if destination.is_root()
            || destination.as_key() == source.as_key()
            || source.is_ancestor_of(&destination)
            || destination.is_ancestor_of(&source)
        {
            return Err(DavError::Code(StatusCode::FORBIDDEN));
        }

        // MOVE is whole-tree only; COPY accepts depth 0 and infinity
        match (is_move, headers.depth) {
            (true, Depth::Zero | Depth::One) | (false, Depth::One) => {
                return Err(DavError::Code(StatusCode::BAD_REQUEST));
            }
            _ => {}
        }
        let root_only = !is_move && headers.depth == Depth::Zero && item.is_collection();

        let dest_item = self.store.get_item(&destination).await?;
        if dest_item.is_some() && headers.overwrite_fail {
            return Err(DavError::Code(StatusCode::PRECONDITION_FAILED));
        }

        self.validate_headers(headers, &source, Some(&item), is_move)?;
        self.validate_lock_tokens(headers, &destination, true)?;
        self.map_parent(&destination).await?;

        // Overwrite removes the destination first
        let replaced = dest_item.is_some();
        if replaced {
            self.store.delete(&destination).await?;
            self.locks.remove_resource(destination.as_key());
            self.properties.forget(destination.as_key());
        }

        let mut failures = Vec::new();
        if is_move {
            if self.store.supports_fast_move() {
                self.store.rename(&source, &destination).await?;
            } else {
                self.copy_tree(&item, &destination, root_only, &mut failures)
                    .await?;
                if failures.is_empty() {
                    self.store.delete(&source).await?;
                }
            }
            // Lock identity is path-derived, so locks do not follow a
            // rename
            self.locks.remove_resource(source.as_key());
            self.properties.forget(source.as_key());
        } else {
            self.copy_tree(&item, &destination, root_only, &mut failures)
                .await?;
        }

        if !failures.is_empty() {
            let mut response = MultiStatus::new(Vec::with_capacity(failures.len()));
            for (href, status) in failures {
                response.add_response(Response::new_status(href.as_str(), status));
            }
            return Ok(
                HttpResponse::new(StatusCode::MULTI_STATUS).with_xml_body(response.to_string())
            );
        }

        Ok(HttpResponse::new(if replaced {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::CREATED
        }))
    }
}

impl DavServer {
    /// Best-effort tree copy: child failures are recorded and the
    /// remaining children still copy.
    fn copy_tree<'x>(
        &'x self,
        source: &'x StoreItem,
        destination: &'x DavPath,
        root_only: bool,
        failures: &'x mut Vec<(String, StatusCode)>,
    ) -> BoxFuture<'x, crate::Result<()>> {
        async move {
            if !source.is_collection() {
                let data = self
                    .store
                    .read(&DavPath::from_key(source.full_path()), None)
                    .await?;
                self.store.write(destination, data).await?;
                return Ok(());
            }

            self.store.create_collection(destination).await?;
            if root_only {
                return Ok(());
            }
            let source_path = DavPath::from_key(source.full_path());
            for child in self.store.get_children(&source_path).await? {
                let Ok(child_dest) = destination.child(child.name()) else {
                    failures.push((
                        encode_href(child.full_path(), child.is_collection()),
                        StatusCode::BAD_REQUEST,
                    ));
                    continue;
                };
                let result = self.copy_tree(&child, &child_dest, false, failures).await;
                if let Err(err) = result {
                    let status = match err {
                        DavError::Store(err) => store_error_status(&err),
                        _ => StatusCode::INTERNAL_SERVER_ERROR,
                    };
                    failures.push((
                        encode_href(child_dest.as_key(), child.is_collection()),
                        status,
                    ));
                }
            }
            Ok(())
        }
        .boxed()
    }
}
