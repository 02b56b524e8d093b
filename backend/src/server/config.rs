//! Server configuration sourced from the environment.

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::Key;
use tracing::warn;

/// Runtime settings for the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
}

impl ServerConfig {
    /// Construct a configuration from explicit values.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, key: Key, cookie_secure: bool) -> Self {
        Self {
            bind_addr,
            key,
            cookie_secure,
        }
    }

    /// Read configuration from the environment.
    ///
    /// - `REGISTRAR_BIND_ADDR` — socket address, default `0.0.0.0:8080`.
    /// - `SESSION_KEY_FILE` — session key material, default
    ///   `/var/run/secrets/session_key`. Debug builds (or
    ///   `SESSION_ALLOW_EPHEMERAL=1`) fall back to a generated key.
    /// - `SESSION_COOKIE_SECURE` — `0` disables the cookie `Secure` flag.
    pub fn from_env() -> std::io::Result<Self> {
        let bind_addr = env::var("REGISTRAR_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_owned())
            .parse()
            .map_err(|e| std::io::Error::other(format!("invalid REGISTRAR_BIND_ADDR: {e}")))?;

        let key_path = env::var("SESSION_KEY_FILE")
            .unwrap_or_else(|_| "/var/run/secrets/session_key".to_owned());
        let key = match std::fs::read(&key_path) {
            Ok(bytes) => Key::derive_from(&bytes),
            Err(e) => {
                let allow_dev =
                    env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
                if cfg!(debug_assertions) || allow_dev {
                    warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                    Key::generate()
                } else {
                    return Err(std::io::Error::other(format!(
                        "failed to read session key at {key_path}: {e}"
                    )));
                }
            }
        };

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v != "0")
            .unwrap_or(true);

        Ok(Self::new(bind_addr, key, cookie_secure))
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
