//! Placeholder substitution into a document template.
//!
//! Templates are opaque text. Only the three tokens below are interpreted:
//! the data and config tokens must be present, the logo token is optional.

use crate::error::{PackageError, Result};

/// Replaced with the payload token text.
pub const DATA_TOKEN: &str = "/*SNAPSHOT_DATA*/";
/// Replaced with the manifest JSON.
pub const CONFIG_TOKEN: &str = "/*SNAPSHOT_CONFIG*/";
/// Replaced with a logo `<img>` tag, or removed.
pub const LOGO_TOKEN: &str = "/*SNAPSHOT_LOGO*/";

/// Minimal viewer carrying all three tokens.
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/template.html");

/// Fill `template` with the payload, the manifest and an optional base64 PNG
/// logo.
pub fn compose(
    template: &str,
    payload_text: &str,
    manifest_json: &str,
    logo_base64: Option<&str>,
) -> Result<String> {
    for token in [DATA_TOKEN, CONFIG_TOKEN] {
        if !template.contains(token) {
            return Err(PackageError::TemplateTokenMissing(token));
        }
    }

    let logo = match logo_base64 {
        Some(b64) if !b64.is_empty() => {
            format!(r#"<img id="header-logo" src="data:image/png;base64,{b64}" alt="Logo">"#)
        }
        _ => String::new(),
    };

    // Config first: payload text is arbitrary and could contain a token.
    let document = template
        .replace(CONFIG_TOKEN, manifest_json)
        .replace(LOGO_TOKEN, &logo);
    Ok(document.replace(DATA_TOKEN, &script_safe(payload_text)))
}

/// Keep a name like `</script>` from closing the surrounding script block.
/// `<\/` is an equivalent JSON string escape.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}
