use eframe::egui::Color32;

use crate::feed::{ConnectionStatus, EdgeKind, NodeKind};
use crate::logs::RiskLevel;

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub(super) const HIGHLIGHT: Color32 = Color32::from_rgb(246, 206, 104);
pub(super) const HOVER: Color32 = Color32::from_rgb(255, 164, 101);
pub(super) const SEARCH_MATCH: Color32 = Color32::from_rgb(103, 196, 255);
pub(super) const LABEL: Color32 = Color32::from_gray(238);
pub(super) const NODE_OUTLINE: Color32 = Color32::from_rgba_premultiplied(15, 15, 15, 190);

/// Mixes in unmultiplied sRGBA space.
pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let [br, bg, bb, ba] = base.to_srgba_unmultiplied();
    let [or, og, ob, oa] = overlay.to_srgba_unmultiplied();
    let mix = |from: u8, to: u8| (from as f32 * (1.0 - amount) + to as f32 * amount).round() as u8;

    Color32::from_rgba_unmultiplied(mix(br, or), mix(bg, og), mix(bb, ob), mix(ba, oa))
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let scale = |channel: u8, by: f32| (channel as f32 * by).round() as u8;
    Color32::from_rgba_unmultiplied(
        scale(r, factor),
        scale(g, factor),
        scale(b, factor),
        scale(a, 0.45 + factor * 0.55),
    )
}

pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0) as u8)
}

pub(super) fn kind_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::MemoryChunk => Color32::from_rgb(92, 170, 222),
        NodeKind::Hub => Color32::from_rgb(236, 168, 72),
        NodeKind::Tracer => Color32::from_rgb(126, 214, 140),
        NodeKind::Organ => Color32::from_rgb(208, 110, 190),
        NodeKind::Sigil => Color32::from_rgb(240, 96, 96),
        NodeKind::Unknown => Color32::from_rgb(150, 150, 160),
    }
}

pub(super) fn kind_radius(kind: NodeKind) -> f32 {
    match kind {
        NodeKind::Hub => 12.0,
        NodeKind::Organ => 10.0,
        NodeKind::MemoryChunk | NodeKind::Sigil => 7.0,
        NodeKind::Tracer => 5.0,
        NodeKind::Unknown => 6.0,
    }
}

pub(super) fn edge_color(kind: EdgeKind) -> Color32 {
    match kind {
        EdgeKind::Lineage => Color32::from_rgb(182, 160, 112),
        EdgeKind::Association => Color32::from_rgb(118, 128, 140),
        EdgeKind::Flow => Color32::from_rgb(96, 170, 196),
        EdgeKind::Unknown => Color32::from_rgb(100, 100, 100),
    }
}

pub(super) fn status_color(status: ConnectionStatus) -> Color32 {
    match status {
        ConnectionStatus::Connected => Color32::from_rgb(110, 200, 120),
        ConnectionStatus::Loading => Color32::from_rgb(120, 170, 230),
        ConnectionStatus::Error => Color32::from_rgb(230, 96, 88),
        ConnectionStatus::Mock => Color32::from_rgb(226, 188, 88),
        ConnectionStatus::Disconnected => Color32::from_gray(150),
    }
}

pub(super) fn scup_color(scup: f32) -> Color32 {
    if scup >= 0.7 {
        Color32::from_rgb(110, 200, 120)
    } else if scup >= 0.4 {
        Color32::from_rgb(226, 188, 88)
    } else {
        Color32::from_rgb(230, 96, 88)
    }
}

pub(super) fn risk_color(risk: RiskLevel) -> Color32 {
    match risk {
        RiskLevel::Stable => Color32::from_gray(160),
        RiskLevel::Low => Color32::from_rgb(120, 170, 230),
        RiskLevel::Elevated => Color32::from_rgb(226, 188, 88),
        RiskLevel::Critical => Color32::from_rgb(230, 96, 88),
    }
}

/// `#rrggbb` plus opacity, for SVG attributes.
pub(super) fn svg_color(color: Color32) -> (String, f32) {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    (format!("#{r:02x}{g:02x}{b:02x}"), a as f32 / 255.0)
}
