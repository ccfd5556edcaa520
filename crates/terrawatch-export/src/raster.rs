//! Anti-aliased raster renderings of a clip mask.
//!
//! Uses `tiny-skia` for path filling and stroking, so a mask rendered
//! here covers exactly the pixels a browser would reveal for the same
//! polygon (up to anti-aliasing at the edge).

use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Mask, Paint, Path, PathBuilder, Pixmap, Stroke, Transform,
};

use terrawatch_core::{MaskDescriptor, Ring, Viewport};

/// A mask that cannot be rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The viewport is zero-sized or too large for a pixmap.
    #[error("cannot allocate a {0} raster")]
    Allocation(Viewport),

    /// The clip ring has fewer than two points or non-finite coordinates.
    #[error("clip ring does not form a drawable path")]
    EmptyPath,

    /// The outline color is not `#rgb` or `#rrggbb`.
    #[error("unsupported outline color {0:?}")]
    Color(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

#[allow(clippy::cast_possible_truncation)]
fn ring_path(ring: &Ring) -> Result<Path, RenderError> {
    let points = ring.points();
    let mut pb = PathBuilder::new();
    if let Some(first) = points.first() {
        pb.move_to(first.x as f32, first.y as f32);
        for p in &points[1..] {
            pb.line_to(p.x as f32, p.y as f32);
        }
        pb.close();
    }
    pb.finish().ok_or(RenderError::EmptyPath)
}

fn pixmap(viewport: Viewport) -> Result<Pixmap, RenderError> {
    Pixmap::new(viewport.width, viewport.height).ok_or(RenderError::Allocation(viewport))
}

/// Parse `#rgb` or `#rrggbb`.
fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| channel(&c.to_string()).map(|v| v * 17));
            Some((digits.next()??, digits.next()??, digits.next()??))
        }
        6 => Some((
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        _ => None,
    }
}

/// Per-pixel coverage of the clip region: 255 inside, 0 outside,
/// intermediate values along the anti-aliased edge.
///
/// # Errors
///
/// Returns [`RenderError::Allocation`] for an empty viewport and
/// [`RenderError::EmptyPath`] if the ring cannot form a path.
pub fn coverage(mask: &MaskDescriptor) -> Result<Mask, RenderError> {
    let path = ring_path(&mask.clip)?;
    let mut coverage =
        Mask::new(mask.viewport.width, mask.viewport.height).ok_or(RenderError::Allocation(mask.viewport))?;
    coverage.fill_path(&path, FillRule::Winding, true, Transform::identity());
    Ok(coverage)
}

/// Fraction of the viewport the mask reveals, in `[0, 1]`.
///
/// # Errors
///
/// Same as [`coverage`].
#[allow(clippy::cast_precision_loss)]
pub fn coverage_ratio(mask: &MaskDescriptor) -> Result<f64, RenderError> {
    let coverage = coverage(mask)?;
    let data = coverage.data();
    if data.is_empty() {
        return Ok(0.0);
    }
    let total: u64 = data.iter().map(|&a| u64::from(a)).sum();
    Ok(total as f64 / (data.len() as f64 * 255.0))
}

/// The mask as a grayscale PNG: black where the raster is hidden, white
/// where it shows through. Same semantics as an SVG luminance mask.
///
/// # Errors
///
/// Returns [`RenderError`] if the mask cannot be rendered or encoded.
pub fn render_mask_png(mask: &MaskDescriptor) -> Result<Vec<u8>, RenderError> {
    let path = ring_path(&mask.clip)?;
    let mut pixmap = pixmap(mask.viewport)?;
    pixmap.fill(Color::BLACK);

    let mut paint = Paint::default();
    paint.set_color(Color::WHITE);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

/// The outline alone on a transparent background, in the mask's outline
/// color, width and opacity.
///
/// # Errors
///
/// Returns [`RenderError`] if the color is unsupported or the outline
/// cannot be rendered or encoded.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn render_outline_png(mask: &MaskDescriptor) -> Result<Vec<u8>, RenderError> {
    let style = &mask.outline;
    let (r, g, b) =
        parse_hex(&style.color).ok_or_else(|| RenderError::Color(style.color.clone()))?;
    let alpha = (style.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;

    let path = ring_path(&mask.clip)?;
    let mut pixmap = pixmap(mask.viewport)?;

    let stroke = Stroke {
        width: style.width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, alpha);
    paint.anti_alias = true;
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}
