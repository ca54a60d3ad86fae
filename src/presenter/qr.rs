//! Compact terminal QR codes.

use qrcode::render::unicode::Dense1x2;
use qrcode::types::QrError;
use qrcode::QrCode;

/// Render `payload` as half-block characters, two modules per text row.
///
/// Colors are inverted so the code scans on dark terminal backgrounds.
pub fn render(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .build())
}
