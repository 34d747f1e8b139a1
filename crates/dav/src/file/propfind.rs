/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::collections::VecDeque;

use dav_proto::{
    schema::{
        property::DavProperty,
        request::{DavPropertyValue, PropFind},
        response::{BaseCondition, MultiStatus, PropStat, Response},
    },
    Depth, RequestHeaders,
};
use http_proto::HttpResponse;
use hyper::StatusCode;
use store::{InfiniteDepthMode, StoreItem};

use crate::{
    common::uri::DavUriResource, file::item_href, DavErrorCondition, DavServer, PropStatBuilder,
};

pub(crate) trait PropFindRequestHandler: Sync + Send {
    fn handle_propfind_request(
        &self,
        headers: &RequestHeaders<'_>,
        request: PropFind,
    ) -> impl std::future::Future<Output = crate::Result<HttpResponse>> + Send;
}

impl PropFindRequestHandler for DavServer {
    async fn handle_propfind_request(
        &self,
        headers: &RequestHeaders<'_>,
        request: PropFind,
    ) -> crate::Result<HttpResponse> {
        let path = self.validate_uri(headers.uri)?;
        let item = self.map_resource(&path).await?;

        let max_depth = match headers.depth {
            Depth::Zero => 0,
            Depth::One => 1,
            Depth::Infinity | Depth::None => {
                if item.is_collection() {
                    match self.store.infinite_depth_mode {
                        InfiniteDepthMode::Allowed => usize::MAX,
                        InfiniteDepthMode::Rejected => {
                            return Err(DavErrorCondition::new(
                                StatusCode::FORBIDDEN,
                                BaseCondition::PropFindFiniteDepth,
                            )
                            .into())
                        }
                        InfiniteDepthMode::Assume0 => 0,
                        InfiniteDepthMode::Assume1 => 1,
                    }
                } else {
                    0
                }
            }
        };

        // Parents are visited before children, siblings in listing order
        let mut response = MultiStatus::new(Vec::with_capacity(16));
        let mut queue = VecDeque::new();
        queue.push_back((item, 0usize));
        while let Some((entry, level)) = queue.pop_front() {
            if entry.is_collection() && level < max_depth {
                let path = store::DavPath::from_key(entry.full_path());
                for child in self.store.get_children(&path).await? {
                    queue.push_back((child, level + 1));
                }
            }
            response.add_response(self.build_propfind_response(&entry, &request));
        }

        Ok(HttpResponse::new(StatusCode::MULTI_STATUS).with_xml_body(response.to_string()))
    }
}

impl DavServer {
    fn build_propfind_response(&self, item: &StoreItem, request: &PropFind) -> Response {
        let href = item_href(item);
        let propstat = match request {
            PropFind::PropName => {
                let names = self
                    .properties
                    .prop_names(item.is_collection())
                    .into_iter()
                    .map(DavPropertyValue::empty)
                    .collect();
                vec![PropStat::new_list(names)]
            }
            PropFind::AllProp(include) => {
                let mut props = self.properties.all_props(item.is_collection());
                for extra in include {
                    if !props.contains(extra) {
                        props.push(extra.clone());
                    }
                }
                self.fill_properties(item, &props)
            }
            PropFind::Prop(props) => self.fill_properties(item, props),
        };
        Response::new_propstat(href, propstat)
    }

    fn fill_properties(&self, item: &StoreItem, props: &[DavProperty]) -> Vec<PropStat> {
        let mut builder = PropStatBuilder::default();
        for property in props {
            let (value, status) =
                self.properties
                    .get(item, &self.locks, self.config.read_only, property);
            builder.insert_with_status(
                DavPropertyValue {
                    property: property.clone(),
                    value,
                },
                status,
            );
        }
        builder.build()
    }
}
