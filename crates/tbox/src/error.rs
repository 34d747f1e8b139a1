/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Display;

/// Service error code returned when a directory or file with the same
/// name already exists. Directory creation treats it as success.
pub const SAME_NAME_DIRECTORY_OR_FILE_EXISTS: &str = "SameNameDirectoryOrFileExists";

/// The discriminated result shape every Tbox call returns, folded into
/// an error type: `code` and `message` come from the service envelope,
/// `status` is the transport status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TboxError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Conflict,
    Forbidden,
    Expired,
    Transient,
    Permanent,
    Cancelled,
}

impl TboxError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        TboxError {
            kind,
            code: code.into(),
            message: message.into(),
            status: match kind {
                ErrorKind::NotFound => 404,
                ErrorKind::AlreadyExists | ErrorKind::Conflict => 409,
                ErrorKind::Forbidden => 403,
                ErrorKind::Expired => 401,
                ErrorKind::Transient => 503,
                ErrorKind::Permanent => 500,
                ErrorKind::Cancelled => 499,
            },
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn not_found(path: impl Display) -> Self {
        Self::new(
            ErrorKind::NotFound,
            "NotFound",
            format!("object {path} does not exist"),
        )
    }

    pub fn same_name_exists(path: impl Display) -> Self {
        Self::new(
            ErrorKind::AlreadyExists,
            SAME_NAME_DIRECTORY_OR_FILE_EXISTS,
            format!("an entry named {path} already exists"),
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, "Forbidden", message)
    }

    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, "CredentialExpired", message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, "ServiceUnavailable", message)
    }

    pub fn permanent(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permanent, code, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "Cancelled", "request cancelled")
    }

    /// Transient failures are retried; expired credentials are recovered
    /// through renewal rather than retry.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Transient)
    }

    pub fn is_same_name_exists(&self) -> bool {
        self.code == SAME_NAME_DIRECTORY_OR_FILE_EXISTS
    }
}

impl Display for TboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)
    }
}

impl std::error::Error for TboxError {}
