/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::{
    schema::{
        request::{DavPropertyValue, PropertyUpdate},
        response::{MultiStatus, Response},
    },
    RequestHeaders,
};
use http_proto::HttpResponse;
use hyper::StatusCode;
use store::StoreItem;

use crate::{common::uri::DavUriResource, file::item_href, DavServer, PropStatBuilder};

pub(crate) trait PropPatchRequestHandler: Sync + Send {
    fn handle_proppatch_request(
        &self,
        headers: &RequestHeaders<'_>,
        request: PropertyUpdate,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl PropPatchRequestHandler for DavServer {
    async fn handle_proppatch_request(
        &self,
        headers: &RequestHeaders<'_>,
        request: PropertyUpdate,
    ) -> crate::Result<HttpResponse> {
        let path = self.validate_uri(headers.uri)?;
        let item = self.map_resource(&path).await?;
        self.validate_headers(headers, &path, Some(&item), false)?;

        // Operations apply in document order; failures do not roll back
        // properties already applied.
        let mut builder = PropStatBuilder::default();
        if request.set_first {
            self.apply_set(&item, request.set, &mut builder);
            self.apply_remove(&item, request.remove, &mut builder);
        } else {
            self.apply_remove(&item, request.remove, &mut builder);
            self.apply_set(&item, request.set, &mut builder);
        }

        let response = MultiStatus::new(vec![Response::new_propstat(
            item_href(&item),
            builder.build(),
        )]);

        Ok(HttpResponse::new(StatusCode::MULTI_STATUS).with_xml_body(response.to_string()))
    }
}

impl DavServer {
    fn apply_set(
        &self,
        item: &StoreItem,
        set: Vec<DavPropertyValue>,
        builder: &mut PropStatBuilder,
    ) {
        for DavPropertyValue { property, value } in set {
            let status = self.properties.set(item, &property, &value);
            builder.insert_with_status(DavPropertyValue::empty(property), status);
        }
    }

    fn apply_remove(
        &self,
        item: &StoreItem,
        remove: Vec<dav_proto::schema::property::DavProperty>,
        builder: &mut PropStatBuilder,
    ) {
        for property in remove {
            let status = self.properties.remove(item, &property);
            builder.insert_with_status(DavPropertyValue::empty(property), status);
        }
    }
}
