//! Privacy-shield redaction (spec.md §4.5 point 3): applied to
//! bitmap-update PDUs before they're forwarded to the Coordinator.
//!
//! The handler treats PDU payload as opaque, so redaction is opaque
//! too: each configured zone addresses a byte range of the packet body
//! (`y * width + x` .. `+ width * height`, clamped to the body's
//! bounds) which is overwritten with zeros rather than actually
//! decoding pixels.

use lucid_types::RedactionZone;

/// Applies every zone in `zones` to `body` in place.
pub fn redact(body: &mut [u8], zones: &[RedactionZone]) {
    for zone in zones {
        redact_zone(body, zone);
    }
}

fn redact_zone(body: &mut [u8], zone: &RedactionZone) {
    let start = (zone.y as usize).saturating_mul(zone.width as usize) + zone.x as usize;
    if start >= body.len() {
        return;
    }
    let len = (zone.width as usize).saturating_mul(zone.height as usize);
    let end = (start + len).min(body.len());
    body[start..end].fill(0);
}
