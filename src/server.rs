// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Listener setup.

use std::io;
use tokio::net::TcpListener;

/// Bind `0.0.0.0:port`, moving up one port at a time while the address is in use.
///
/// Errors other than "address in use" are returned immediately.
pub async fn bind_with_retry(port: u16, attempts: u16) -> io::Result<TcpListener> {
    bind_host_with_retry("0.0.0.0", port, attempts).await
}

pub async fn bind_host_with_retry(
    host: &str,
    port: u16,
    attempts: u16,
) -> io::Result<TcpListener> {
    let mut candidate = port;
    let mut tried = 0;

    loop {
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                tried += 1;
                let next = candidate.checked_add(1).filter(|_| tried < attempts.max(1));
                let Some(next) = next else {
                    return Err(e);
                };
                tracing::warn!(port = candidate, next_port = next, "Port is busy, trying next");
                candidate = next;
            }
            Err(e) => return Err(e),
        }
    }
}
