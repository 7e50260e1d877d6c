//! WebAssembly module for the certificate template editor
//!
//! Provides client-side:
//! - Template syntax checks while typing
//! - Variable discovery
//! - Live previews against sample certificate data
//! - Certificate number format checks on the verification page

use js_sys::Array;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::TemplateEngine;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("certificate template editor ready"));
}

fn language(code: &str) -> Language {
    match code {
        "th" => Language::Thai,
        _ => Language::English,
    }
}

/// Compile-check a template. Returns `{ valid, error? }` as JSON.
#[wasm_bindgen]
pub fn validate_template(html_content: &str) -> String {
    let validation = TemplateEngine::default().validate(html_content);
    serde_json::to_string(&validation).unwrap_or_else(|_| "{\"valid\":false}".to_string())
}

/// Variables referenced by a template, in order of first use
#[wasm_bindgen]
pub fn extract_template_variables(html_content: &str) -> Array {
    shared::template::extract_variables(html_content)
        .into_iter()
        .map(JsValue::from)
        .collect()
}

/// Render a template against sample certificate data. `data_json` may
/// override any sample value; pass an empty string to use the samples only.
#[wasm_bindgen]
pub fn render_template_preview(
    html_content: &str,
    data_json: &str,
    language_code: &str,
) -> Result<String, JsValue> {
    let mut data = RenderContext::sample().to_template_data();
    if !data_json.trim().is_empty() {
        let overrides: Value = serde_json::from_str(data_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid data JSON: {}", e)))?;
        if let (Value::Object(base), Value::Object(overrides)) = (&mut data, overrides) {
            base.extend(overrides);
        }
    }

    TemplateEngine::new(language(language_code))
        .render(html_content, &data)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Wrap rendered content in the A4 landscape print document
#[wasm_bindgen]
pub fn create_complete_html(fragment: &str, css_styles: Option<String>, language_code: &str) -> String {
    TemplateEngine::new(language(language_code)).create_complete_html(fragment, css_styles.as_deref())
}

/// Whether `number` looks like a certificate number issued with `prefix`
#[wasm_bindgen]
pub fn is_valid_certificate_number(number: &str, prefix: &str) -> bool {
    validate_certificate_number(&number.trim().to_ascii_uppercase(), prefix).is_ok()
}
