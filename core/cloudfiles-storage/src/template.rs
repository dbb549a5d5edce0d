//! Path and URL templates.
//!
//! Templates are plain strings with `:name` placeholders. The set of names
//! is fixed:
//!
//! | placeholder     | value                                   |
//! |-----------------|-----------------------------------------|
//! | `:attachment`   | attachment name                         |
//! | `:class`        | owning model name                       |
//! | `:id`           | record id                               |
//! | `:id_partition` | id split into `000/000/042` directories |
//! | `:style`        | style being read or written             |
//! | `:basename`     | original filename without extension     |
//! | `:extension`    | original extension, no dot              |
//! | `:filename`     | original filename                       |
//! | `:cf_path_url`  | CDN URL of the object (URL templates)   |
//!
//! Unknown placeholders are left as written.

use crate::attachment::Attachment;

pub const DEFAULT_PATH_TEMPLATE: &str = ":attachment/:id/:style/:basename.:extension";
pub const DEFAULT_URL_TEMPLATE: &str = ":cf_path_url";

const CDN_PATH_URL: &str = "cf_path_url";

/// Substitutes placeholders using `lookup`, leaving unknown names intact.
///
/// A placeholder name is the longest run of `[A-Za-z0-9_]` after the colon.
pub fn interpolate_with<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(idx) = rest.find(':') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..len];
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

/// Resolves a path template for one style of an attachment.
pub fn interpolate(template: &str, attachment: &Attachment, style: &str) -> String {
    interpolate_with(template, |name| lookup(name, attachment, style))
}

/// Resolves a URL template. `:cf_path_url` becomes the public CDN URL of `path`.
pub fn render_url(
    template: &str,
    cdn_base: &str,
    path: &str,
    attachment: &Attachment,
    style: &str,
) -> String {
    interpolate_with(template, |name| {
        if name == CDN_PATH_URL {
            Some(public_url(cdn_base, path))
        } else {
            lookup(name, attachment, style)
        }
    })
}

fn lookup(name: &str, attachment: &Attachment, style: &str) -> Option<String> {
    let value = match name {
        "attachment" => attachment.name.clone(),
        "class" => attachment.class_name.clone(),
        "id" => attachment.id.clone(),
        "id_partition" => attachment.id_partition(),
        "style" => style.to_string(),
        "basename" => attachment.basename(),
        "extension" => attachment.extension(),
        "filename" => attachment.original_filename.clone().unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

/// Joins a CDN base URL and an object path.
///
/// Every path segment is percent-encoded, `&` included, so a filename can
/// never start a query string.
pub fn public_url(cdn_base: &str, path: &str) -> String {
    let encoded = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{encoded}", cdn_base.trim_end_matches('/'))
}

/// True for templates of the form `:cf...url`, which are served from the CDN.
pub fn is_cdn_url_template(template: &str) -> bool {
    template.starts_with(":cf") && template.ends_with("url")
}

/// Keeps a CDN-style URL template, replacing anything else with the default.
pub fn normalize_url_template(template: Option<&str>) -> String {
    match template {
        Some(t) if is_cdn_url_template(t) => t.to_string(),
        _ => DEFAULT_URL_TEMPLATE.to_string(),
    }
}
