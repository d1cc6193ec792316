//! Paints a [`Board`] into a vello [`Scene`].
//!
//! The board's retained canvas stores every lane's text in surface-local
//! coordinates (center anchored). Here each surface is mapped onto its strip
//! from the [`BoardLayout`] and clipped to it, so scrolling text slides
//! under the strip edges.

use vello::Scene;
use vello::kurbo::{Affine, Rect};
use vello::peniko::{Color, Fill, FontData, Mix};

use crate::board::Board;
use crate::canvas::{FontSpec, Geometry, Rgb, SurfaceId, TextMeasure};
use crate::fonts::glyph_run;
use crate::layout::BoardLayout;

const TITLE: &str = "Line status";
const HEADER_COLOR: Rgb = Rgb::new(0.0, 0.0, 0.0);
const SECTION_SCALE: f32 = 0.6;
/// Line names wrap at this many characters.
const LABEL_WRAP_CHARS: usize = 10;
const LABEL_MAX_LINES: usize = 2;

pub fn color(rgb: Rgb) -> Color {
    Color::new([rgb.r, rgb.g, rgb.b, 1.0])
}

/// Draw the whole board over a scene whose base color is the board
/// background. Without a font only the strip backgrounds are painted.
pub fn render_board<M: TextMeasure>(
    scene: &mut Scene,
    board: &Board<M>,
    layout: &BoardLayout,
    font: Option<&FontData>,
) {
    let config = board.config();
    let colors = &config.colors;

    let header_font = config.fonts.label();
    let header_baseline = baseline(board, &header_font, layout.header.center().y);
    draw_text(
        scene,
        font,
        TITLE,
        &header_font,
        layout.header.x0 + 12.0,
        header_baseline,
        HEADER_COLOR,
    );
    let clock_width = board.canvas().measure_text(board.clock_text(), &header_font);
    draw_text(
        scene,
        font,
        board.clock_text(),
        &header_font,
        layout.header.x1 - 12.0 - clock_width,
        header_baseline,
        HEADER_COLOR,
    );

    for (view, row) in board.lane_views().iter().zip(&layout.rows) {
        let label_font = config.fonts.label();
        let section_font = FontSpec::new(label_font.size_px * SECTION_SCALE);
        let label_top = row.label.y0 + row.label.height() * 0.4;
        let section_top = row.label.y0 + row.label.height() * 0.78;
        let name_lines = wrap_label(&view.name, LABEL_WRAP_CHARS, LABEL_MAX_LINES);
        let line_height = board.canvas().font_metrics(&label_font).line_height();
        let extra_lines = name_lines.len().saturating_sub(1) as f64;
        let first_center = label_top - extra_lines * line_height / 2.0;

        push_clip(scene, row.label);
        for (i, line) in name_lines.iter().enumerate() {
            draw_text(
                scene,
                font,
                line,
                &label_font,
                row.label.x0,
                baseline(board, &label_font, first_center + i as f64 * line_height),
                HEADER_COLOR,
            );
        }
        draw_text(
            scene,
            font,
            &view.section,
            &section_font,
            row.label.x0,
            baseline(board, &section_font, section_top),
            HEADER_COLOR,
        );
        scene.pop_layer();

        let background = if view.is_alert() {
            colors.alert_background
        } else {
            colors.normal_background
        };
        scene.fill(Fill::NonZero, Affine::IDENTITY, color(background), None, &row.strip);
        draw_surface(scene, board, view.surface, row.strip, font);
    }

    if let Some(news) = layout.news {
        scene.fill(Fill::NonZero, Affine::IDENTITY, color(colors.news_background), None, &news);
        draw_surface(scene, board, board.news_surface(), news, font);
    }
}

/// Draw every item of `surface` inside `strip`, clipped.
fn draw_surface<M: TextMeasure>(
    scene: &mut Scene,
    board: &Board<M>,
    surface: SurfaceId,
    strip: Rect,
    font: Option<&FontData>,
) {
    let items = board.canvas().items(surface);
    if items.is_empty() || strip.width() <= 0.0 || strip.height() <= 0.0 {
        return;
    }
    push_clip(scene, strip);
    for item in items {
        let width = board.canvas().measure_text(&item.text, &item.font);
        let start_x = strip.x0 + item.x - width / 2.0;
        let base = baseline(board, &item.font, strip.y0 + item.y);
        draw_text(scene, font, &item.text, &item.font, start_x, base, item.color);
    }
    scene.pop_layer();
}

/// Clip everything up to the matching `pop_layer` to `rect`.
fn push_clip(scene: &mut Scene, rect: Rect) {
    scene.push_layer(Fill::NonZero, Mix::Normal, 1.0, Affine::IDENTITY, &rect);
}

/// Word-wrap `text` to lines of at most `width` characters, breaking words
/// that are longer than a line, and keep the first `max_lines`.
fn wrap_label(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut rest = word;
        while !rest.is_empty() {
            let used = current.chars().count();
            let len = rest.chars().count();
            if used == 0 && len <= width {
                current.push_str(rest);
                break;
            }
            if used > 0 && used + 1 + len <= width {
                current.push(' ');
                current.push_str(rest);
                break;
            }
            if used > 0 {
                lines.push(std::mem::take(&mut current));
                continue;
            }
            let split = rest.char_indices().nth(width).map_or(rest.len(), |(i, _)| i);
            lines.push(rest[..split].to_string());
            rest = &rest[split..];
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.truncate(max_lines);
    lines
}

/// Baseline that vertically centers a line of text on `center_y`.
fn baseline<M: TextMeasure>(board: &Board<M>, font: &FontSpec, center_y: f64) -> f64 {
    let metrics = board.canvas().font_metrics(font);
    center_y + (metrics.ascent - metrics.descent) / 2.0
}

fn draw_text(
    scene: &mut Scene,
    font: Option<&FontData>,
    text: &str,
    spec: &FontSpec,
    start_x: f64,
    baseline: f64,
    rgb: Rgb,
) {
    let Some(font) = font else {
        return;
    };
    if text.is_empty() {
        return;
    }
    let glyphs = glyph_run(font, text, spec.size_px, start_x, baseline);
    if glyphs.is_empty() {
        return;
    }
    scene
        .draw_glyphs(font)
        .font_size(spec.size_px)
        .brush(&color(rgb))
        .draw(Fill::NonZero, glyphs.into_iter());
}
