//! Stylesheet and client binder, compiled into the binary.

use actix_web::{web, HttpResponse};
use rust_embed::RustEmbed;

use crate::error::ApiError;

#[derive(RustEmbed)]
#[folder = "static/"]
struct Assets;

/// Linked from every page's `<head>`.
pub const STYLESHEET: &str = "/static/style.css";
/// Loaded at the end of every page.
pub const SCRIPT: &str = "/static/main.js";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/static/{path:.*}", web::get().to(asset));
}

fn content_type(path: &str) -> mime::Mime {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("svg") => mime::IMAGE_SVG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

pub async fn asset(path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let path = path.into_inner();
    let file = Assets::get(&path).ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok()
        .content_type(content_type(&path))
        .insert_header(("Cache-Control", "public, max-age=3600"))
        .body(file.data.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_assets_are_embedded() {
        for url in [STYLESHEET, SCRIPT] {
            let path = url.trim_start_matches("/static/");
            assert!(Assets::get(path).is_some(), "{path} not embedded");
        }
        assert!(Assets::get("missing.js").is_none());
    }

    #[test]
    fn types_follow_extension() {
        assert_eq!(content_type("style.css"), mime::TEXT_CSS_UTF_8);
        assert_eq!(content_type("main.js"), mime::APPLICATION_JAVASCRIPT_UTF_8);
        assert_eq!(content_type("blob"), mime::APPLICATION_OCTET_STREAM);
    }
}
