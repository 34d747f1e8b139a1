/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod lock;
pub mod uri;

use dav_proto::{
    schema::response::{BaseCondition, Href, List},
    RequestHeaders, ResourceState,
};
use hyper::StatusCode;
use store::{path::encode_href, DavPath, StoreItem};

use crate::{common::lock::LockCheck, DavError, DavErrorCondition, DavServer};

impl DavServer {
    /// Asserts lock tokens and `If` preconditions before a mutation of
    /// `path`. Lock violations answer 423, failed conditions 412.
    pub(crate) fn validate_headers(
        &self,
        headers: &RequestHeaders<'_>,
        path: &DavPath,
        item: Option<&StoreItem>,
        include_descendants: bool,
    ) -> crate::Result<()> {
        self.validate_lock_tokens(headers, path, include_descendants)?;

        // Untagged `If` conditions are evaluated against the request
        // URI resource only
        if headers.has_if() {
            let etag = item.map(|item| item.etag()).unwrap_or_default();
            let state_token = self
                .locks
                .active_locks(path.as_key())
                .into_iter()
                .map(|lock| lock.token)
                .next()
                .unwrap_or_default();
            let states = [
                ResourceState {
                    resource: None,
                    etag,
                    state_token: state_token.as_str(),
                },
                ResourceState {
                    resource: Some(headers.uri),
                    etag,
                    state_token: state_token.as_str(),
                },
            ];
            if !headers.eval_if(&states) {
                return Err(DavError::Code(StatusCode::PRECONDITION_FAILED));
            }
        }

        Ok(())
    }

    /// Lock-token assertion alone, used for destination resources
    /// whose state the `If` conditions do not describe.
    pub(crate) fn validate_lock_tokens(
        &self,
        headers: &RequestHeaders<'_>,
        path: &DavPath,
        include_descendants: bool,
    ) -> crate::Result<()> {
        let tokens = headers.submitted_state_tokens().collect::<Vec<_>>();
        if let LockCheck::Locked { root } =
            self.locks
                .validate(path.as_key(), &tokens, include_descendants)
        {
            return Err(DavErrorCondition::new(
                StatusCode::LOCKED,
                BaseCondition::LockTokenSubmitted(List(vec![Href(encode_href(&root, false))])),
            )
            .into());
        }
        Ok(())
    }
}
