/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::RequestHeaders;
use http_proto::HttpResponse;
use hyper::{Body, StatusCode};

use crate::{common::uri::DavUriResource, DavError, DavServer};

pub(crate) trait UpdateRequestHandler: Sync + Send {
    fn handle_update_request(
        &self,
        headers: &RequestHeaders<'_>,
        body: Body,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl UpdateRequestHandler for DavServer {
    async fn handle_update_request(
        &self,
        headers: &RequestHeaders<'_>,
        body: Body,
    ) -> crate::Result<HttpResponse> {
        let path = self.validate_uri(headers.uri)?;
        if path.is_root() || path.had_trailing_slash() {
            return Err(DavError::Code(StatusCode::METHOD_NOT_ALLOWED));
        }

        let existing = self.store.get_item(&path).await?;
        if existing.as_ref().is_some_and(|item| item.is_collection()) {
            return Err(DavError::Code(StatusCode::METHOD_NOT_ALLOWED));
        }
        self.map_parent(&path).await?;
        self.validate_headers(headers, &path, existing.as_ref(), false)?;

        let outcome = match headers.content_length {
            Some(size) => self.store.upload_from_stream(&path, size, body).await?,
            None => {
                // Chunked transfer encoding: the size is only known
                // once the body is drained
                let data = hyper::body::to_bytes(body)
                    .await
                    .map_err(|_| DavError::Store(store::StoreError::Cancelled))?;
                self.store.write(&path, data.to_vec()).await?
            }
        };

        let etag = self
            .store
            .get_item(&path)
            .await?
            .map(|item| item.etag().to_string());

        // A resumed upload completes a PUT the client already issued
        // once, so it reports an overwrite
        Ok(HttpResponse::new(if existing.is_some() || outcome.resumed {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::CREATED
        })
        .with_etag_opt(etag))
    }
}
