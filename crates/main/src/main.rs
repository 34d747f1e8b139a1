/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

mod auth;
mod config;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use dav::{request::DavRequestHandler, DavConfig, DavServer};
use hyper::{
    service::{make_service_fn, service_fn},
    Body, Response, Server, StatusCode,
};
use tbox::{memory::MemoryBackend, Backend};

use crate::auth::{AuthGate, StaticCredentials};
use crate::config::{AccessMode, Settings};

fn main() -> ExitCode {
    let settings = match Settings::parse() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    config::setup_tracing();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(serve(settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}

async fn serve(settings: Settings) -> Result<(), String> {
    let addr = SocketAddr::from_str(&format!("{}:{}", settings.host, settings.port))
        .map_err(|_| format!("invalid listen address {}:{}", settings.host, settings.port))?;

    // The production Tbox client is wired in by the deployment; the
    // in-process backend serves local and test setups.
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let server = Arc::new(DavServer::new(
        backend,
        DavConfig {
            read_only: settings.access == AccessMode::ReadOnly,
            ..DavConfig::default()
        },
    ));
    let token_provider: Option<Arc<dyn tbox::Credentials>> = match settings.token.clone() {
        Some(token) => Some(StaticCredentials::new(token)),
        None => None,
    };
    let gate = Arc::new(AuthGate::new(
        settings.auth,
        settings.username.clone(),
        settings.password.clone(),
        settings.cookie.clone(),
        token_provider,
    ));

    let make_service = make_service_fn(move |_conn| {
        let server = server.clone();
        let gate = gate.clone();
        async move {
            let handle = move |request| {
                let server = server.clone();
                let gate = gate.clone();
                async move {
                    Ok::<_, Infallible>(handle_request(server, gate, request).await)
                }
            };
            Ok::<_, Infallible>(service_fn(handle))
        }
    });

    tracing::info!(%addr, "tboxdav listening");
    Server::try_bind(&addr)
        .map_err(|err| format!("failed to bind {addr}: {err}"))?
        .serve(make_service)
        .await
        .map_err(|err| format!("server error: {err}"))
}

async fn handle_request(
    server: Arc<DavServer>,
    gate: Arc<AuthGate>,
    request: hyper::Request<Body>,
) -> Response<Body> {
    if !gate.authorize(request.headers()) {
        return Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header("WWW-Authenticate", "Basic realm=\"tboxdav\"")
            .body(Body::empty())
            .unwrap_or_default();
    }
    server.handle_request(request).await.build()
}
