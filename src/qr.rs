//! Bridge to the host page's QR encoder.

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub const ERROR_MARKUP: &str = r#"<div style="color: #f85149;">Error generating QR code</div>"#;

#[wasm_bindgen]
extern "C" {
    /// Provided by the page. Returns an image data URL, or a promise of one.
    #[wasm_bindgen(catch, js_name = generateQRCode)]
    fn generate_qr_code(text: &str) -> Result<JsValue, JsValue>;
}

pub fn image_markup(data_url: &str) -> String {
    format!(
        r#"<br><img src="{}" alt="QR Code" style="display: block; margin: 10px 0; max-width: 100%; height: auto;" />"#,
        data_url.replace('"', "&quot;")
    )
}

/// Encode `text` through the host. Every failure, including a missing
/// `generateQRCode`, collapses into [`ERROR_MARKUP`].
pub async fn markup(text: &str) -> String {
    match data_url(text).await {
        Ok(url) => image_markup(&url),
        Err(reason) => {
            log::warn!("qr: {reason}");
            ERROR_MARKUP.to_string()
        }
    }
}

async fn data_url(text: &str) -> Result<String, String> {
    let returned = generate_qr_code(text).map_err(describe)?;
    // `Promise.resolve` adopts thenables and wraps plain values.
    let promise = js_sys::Promise::resolve(&returned);
    let value = JsFuture::from(promise).await.map_err(describe)?;
    match value.as_string() {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err("host returned no data url".to_string()),
    }
}

fn describe(err: JsValue) -> String {
    crate::error::SiteError::from(err).to_string()
}
