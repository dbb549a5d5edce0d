//! Content types for uploaded objects.

/// Content type to upload `path` with, from its extension.
///
/// `None` means the upload carries no `Content-Type` header. JavaScript is
/// sent as `text/javascript`, the type Cloud Files has always served it as.
pub fn content_type_for(path: &str) -> Option<String> {
    let mime = mime_guess::from_path(path).first()?;
    if mime.essence_str() == "application/javascript" {
        return Some("text/javascript".to_string());
    }
    Some(mime.essence_str().to_string())
}
