/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::RequestHeaders;
use http_proto::HttpResponse;
use hyper::StatusCode;

use crate::{common::uri::DavUriResource, DavError, DavServer};

pub(crate) trait MkColRequestHandler: Sync + Send {
    fn handle_mkcol_request(
        &self,
        headers: &RequestHeaders<'_>,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl MkColRequestHandler for DavServer {
    async fn handle_mkcol_request(
        &self,
        headers: &RequestHeaders<'_>,
    ) -> crate::Result<HttpResponse> {
        let path = self.validate_uri(headers.uri)?;
        if path.is_root() {
            return Err(DavError::Code(StatusCode::METHOD_NOT_ALLOWED));
        }
        if self.store.get_item(&path).await?.is_some() {
            return Err(DavError::Code(StatusCode::METHOD_NOT_ALLOWED));
        }
        self.map_parent(&path).await?;
        self.validate_headers(headers, &path, None, false)?;

        self.store.create_collection(&path).await?;

        Ok(HttpResponse::new(StatusCode::CREATED))
    }
}
