//! Print-ready HTML document wrapping

use crate::types::{Language, PageGeometry};

/// Wrap a content fragment in a complete HTML document sized for print.
///
/// The page rule, the zero margins and the full-bleed container all use the
/// same physical size so the renderer never rescales the content. The
/// fragment is embedded unmodified; `css` is appended after the base rules.
pub fn create_complete_html(
    fragment: &str,
    css: Option<&str>,
    page: PageGeometry,
    language: Language,
) -> String {
    let (width, height) = page.size_mm();
    let extra_css = css.unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
@page {{ size: {format} {orientation}; margin: 0; }}
html, body {{ width: {width}mm; height: {height}mm; -webkit-print-color-adjust: exact; print-color-adjust: exact; }}
.certificate-container {{ position: relative; width: {width}mm; height: {height}mm; overflow: hidden; }}
{extra_css}
</style>
</head>
<body>
<div class="certificate-container">
{fragment}
</div>
</body>
</html>"#,
        lang = language.code(),
        format = page.format.css_name(),
        orientation = page.orientation.as_str(),
    )
}

/// Whether a string already is a full HTML document
pub fn is_complete_document(html: &str) -> bool {
    html.trim_start()
        .get(..15)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("<!DOCTYPE html>"))
}
