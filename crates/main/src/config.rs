/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use clap::{Arg, ArgAction, Command};
use serde::Deserialize;

use crate::auth::AuthMode;

/// Smallest accepted `--cachesize`, in bytes.
pub const MIN_CACHE_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "lowercase")]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub cachesize: u64,
    pub auth: AuthMode,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cookie: Option<String>,
    pub token: Option<String>,
    pub access: AccessMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AccessMode {
    Full,
    ReadOnly,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cachesize: 64 * 1024 * 1024,
            auth: AuthMode::None,
            username: None,
            password: None,
            cookie: None,
            token: None,
            access: AccessMode::Full,
        }
    }
}

impl Settings {
    /// Parses the command line, merging an optional YAML configuration
    /// file underneath it.
    pub fn parse() -> Result<Self, String> {
        let matches = command()
            .try_get_matches()
            .map_err(|err| err.to_string())?;

        let mut settings = if let Some(path) = matches.get_one::<String>("config") {
            config::Config::builder()
                .add_source(config::File::with_name(path))
                .add_source(config::Environment::with_prefix("TBOXDAV"))
                .build()
                .and_then(|config| config.try_deserialize::<Settings>())
                .map_err(|err| format!("invalid configuration file {path}: {err}"))?
        } else {
            Settings::default()
        };

        if let Some(host) = matches.get_one::<String>("host") {
            settings.host = host.clone();
        }
        if let Some(port) = matches.get_one::<String>("port") {
            settings.port = port
                .parse()
                .map_err(|_| format!("invalid port {port}"))?;
        }
        if let Some(size) = matches.get_one::<String>("cachesize") {
            settings.cachesize = size
                .parse()
                .map_err(|_| format!("invalid cache size {size}"))?;
        }
        if let Some(auth) = matches.get_one::<String>("auth") {
            settings.auth = auth.parse()?;
        }
        for (arg, field) in [
            ("username", &mut settings.username),
            ("password", &mut settings.password),
            ("cookie", &mut settings.cookie),
            ("token", &mut settings.token),
        ] {
            if let Some(value) = matches.get_one::<String>(arg) {
                *field = Some(value.clone());
            }
        }
        if let Some(access) = matches.get_one::<String>("access") {
            settings.access = match access.as_str() {
                "Full" => AccessMode::Full,
                "ReadOnly" => AccessMode::ReadOnly,
                other => return Err(format!("invalid access mode {other}")),
            };
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), String> {
        if self.cachesize < MIN_CACHE_SIZE {
            return Err(format!(
                "cache size must be at least {MIN_CACHE_SIZE} bytes"
            ));
        }
        match self.auth {
            AuthMode::Custom if self.username.is_none() || self.password.is_none() => {
                Err("auth mode Custom requires --username and --password".to_string())
            }
            AuthMode::JaCookie if self.cookie.is_none() => {
                Err("auth mode JaCookie requires --cookie".to_string())
            }
            AuthMode::UserToken if self.token.is_none() => {
                Err("auth mode UserToken requires --token".to_string())
            }
            _ => Ok(()),
        }
    }
}

fn command() -> Command {
    Command::new("tboxdav")
        .about("WebDAV gateway for the Tbox object store")
        .arg(opt("host", "Address to listen on"))
        .arg(opt("port", "Port to listen on"))
        .arg(opt("cachesize", "Upload buffer budget in bytes"))
        .arg(opt(
            "auth",
            "Authentication mode (None, JaCookie, UserToken, Custom, Mixed)",
        ))
        .arg(opt("username", "Username for Custom or Mixed auth"))
        .arg(opt("password", "Password for Custom or Mixed auth"))
        .arg(opt("cookie", "Session cookie for JaCookie auth"))
        .arg(opt("token", "Access token for UserToken auth"))
        .arg(opt("access", "Access mode (Full, ReadOnly)"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .action(ArgAction::Set)
                .help("YAML configuration file"),
        )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name(name.to_uppercase())
        .action(ArgAction::Set)
        .help(help)
}

pub fn setup_tracing() {
    use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

    let fmt_subscriber = fmt::layer();
    let env_subscriber = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let collector = Registry::default()
        .with(fmt_subscriber)
        .with(env_subscriber);

    let _ = tracing::subscriber::set_global_default(collector);
}
