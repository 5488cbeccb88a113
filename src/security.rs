//! Response headers for pages, fragments, the JSON API and stored files.
//!
//! Pages get a content security policy that admits the blob host, pasted
//! https links and the YouTube / Vimeo players, plus microphone access for
//! the recorder. Anything under `/files/` is visitor-uploaded and is served
//! with a sandboxing policy instead.

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderName, HeaderValue};
use actix_web::Error;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::render::EMBED_ORIGINS;

/// Prefix of routes that serve uploaded bytes back.
pub const FILES_PREFIX: &str = "/files/";

/// Uploaded files never run script or load anything, even if a browser
/// renders one as a document.
pub const FILE_POLICY: &str = "default-src 'none'; img-src 'self'; media-src 'self'; sandbox";

const HSTS: &str = "max-age=63072000; includeSubDomains; preload";
const PERMISSIONS_POLICY: &str = "microphone=(self), camera=(), geolocation=(), payment=()";

/// Builds the page policy. `media_origins` are extra hosts photos and
/// recordings are fetched from, e.g. a plain-http MinIO in development.
pub fn content_security_policy(media_origins: &[String]) -> String {
    let extra: String = media_origins.iter().map(|o| format!(" {o}")).collect();
    format!(
        "default-src 'self'; script-src 'self'; style-src 'self'; connect-src 'self'; \
         img-src 'self' data: https:{extra}; media-src 'self' blob: https:{extra}; \
         frame-src {frames}; object-src 'none'; base-uri 'none'; frame-ancestors 'none'; form-action 'self'",
        frames = EMBED_ORIGINS.join(" "),
    )
}

/// `scheme://host[:port]` of a URL, if it has one.
pub fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let host = rest.split(['/', '?', '#']).next().filter(|h| !h.is_empty())?;
    Some(format!("{scheme}://{host}"))
}

#[derive(Debug)]
struct Policy {
    page_csp: HeaderValue,
    file_csp: HeaderValue,
    common: Vec<(HeaderName, HeaderValue)>,
    hsts: bool,
}

#[derive(Clone, Default)]
pub struct SecurityHeaders {
    media_origins: Vec<String>,
    enable_hsts: bool,
}

impl SecurityHeaders {
    /// HSTS is off unless `ENABLE_HSTS` is `1` or `true`.
    pub fn from_env() -> Self {
        let enable_hsts = std::env::var("ENABLE_HSTS").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
        Self { enable_hsts, ..Self::default() }
    }

    pub fn with_hsts(mut self, enable: bool) -> Self {
        self.enable_hsts = enable;
        self
    }

    /// Admits the origin of `public_base` for images and media. URLs
    /// without a scheme (same-origin paths) are ignored.
    pub fn with_media_base(mut self, public_base: &str) -> Self {
        if let Some(origin) = origin_of(public_base) {
            if !self.media_origins.contains(&origin) {
                self.media_origins.push(origin);
            }
        }
        self
    }

    fn policy(&self) -> Result<Policy, header::InvalidHeaderValue> {
        Ok(Policy {
            page_csp: HeaderValue::from_str(&content_security_policy(&self.media_origins))?,
            file_csp: HeaderValue::from_static(FILE_POLICY),
            common: vec![
                (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
                (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
                (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
                (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
                (HeaderName::from_static("permissions-policy"), HeaderValue::from_static(PERMISSIONS_POLICY)),
            ],
            hsts: self.enable_hsts,
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let policy = match self.policy() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, origins = ?self.media_origins, "invalid media origin in content security policy");
                return ready(Err(()));
            }
        };
        ready(Ok(SecurityHeadersMiddleware { service: Rc::new(service), policy: Arc::new(policy) }))
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: Rc<S>,
    policy: Arc<Policy>,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let policy = self.policy.clone();
        let uploaded = req.path().starts_with(FILES_PREFIX);
        Box::pin(async move {
            let mut res = svc.call(req).await?;
            let headers = res.response_mut().headers_mut();
            let csp = if uploaded { &policy.file_csp } else { &policy.page_csp };
            if !headers.contains_key(header::CONTENT_SECURITY_POLICY) {
                headers.insert(header::CONTENT_SECURITY_POLICY, csp.clone());
            }
            for (name, value) in &policy.common {
                if !headers.contains_key(name) {
                    headers.insert(name.clone(), value.clone());
                }
            }
            if policy.hsts && !headers.contains_key(header::STRICT_TRANSPORT_SECURITY) {
                headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_strips_path_and_query() {
        assert_eq!(origin_of("http://localhost:9000/memories"), Some("http://localhost:9000".into()));
        assert_eq!(origin_of("https://cdn.example.com?x=1"), Some("https://cdn.example.com".into()));
        assert_eq!(origin_of("/files"), None);
        assert_eq!(origin_of("https://"), None);
    }

    #[test]
    fn page_policy_lists_embeds_and_extra_origins() {
        let csp = content_security_policy(&["http://localhost:9000".to_string()]);
        assert!(csp.contains("frame-src https://www.youtube.com https://player.vimeo.com;"));
        assert!(csp.contains("img-src 'self' data: https: http://localhost:9000;"));
        assert!(csp.contains("media-src 'self' blob: https: http://localhost:9000;"));
    }

    #[test]
    fn media_base_is_deduplicated() {
        let sec = SecurityHeaders::default()
            .with_media_base("http://minio:9000/a")
            .with_media_base("http://minio:9000/b")
            .with_media_base("/files");
        assert_eq!(sec.media_origins, vec!["http://minio:9000".to_string()]);
    }
}
