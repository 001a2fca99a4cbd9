// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers middleware.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Content Security Policy for the browser client.
///
/// The client loads Font Awesome from the CDNs, weather icons from
/// OpenWeatherMap and avatars from the identity providers.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     script-src 'self' cdn.jsdelivr.net cdnjs.cloudflare.com; \
     style-src 'self' 'unsafe-inline' cdn.jsdelivr.net cdnjs.cloudflare.com fonts.googleapis.com; \
     img-src 'self' data: https: openweathermap.org *.openweathermap.org; \
     connect-src 'self'; \
     font-src 'self' cdnjs.cloudflare.com fonts.gstatic.com; \
     frame-src 'self' accounts.google.com github.com; \
     object-src 'none'; \
     media-src 'none'; \
     frame-ancestors 'none'";

/// Add security headers to all responses.
pub async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("camera=(), geolocation=(), microphone=(), payment=(), usb=()"),
    );

    response
}
