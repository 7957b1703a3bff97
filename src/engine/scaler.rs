// src/engine/scaler.rs
//
// Progressive downscale: repeated small-ratio resampling toward a target
// scale instead of one large-ratio pass. Shrinking by much more than half in
// a single convolution loses detail, so the step ratio stays near sqrt-ish
// factors and the step count is capped.

use crate::engine::surface::{Dimension, FillMode, RasterSurface, Rect};
use crate::error::{Result, ShrinkImageError};

/// Upper bound on resampling passes per scale() call.
pub const MAX_STEPS: u32 = 4;

/// Number of resampling passes for a target scale in (0, 1]:
/// min(MAX_STEPS, ceil(log2(1 / target_scale))). A target of 1 (or anything
/// not strictly below it) needs no pass at all.
pub fn plan_steps(target_scale: f64) -> u32 {
    if !(target_scale < 1.0) {
        return 0;
    }
    let halvings = (1.0 / target_scale).log2().ceil();
    (halvings as u32).clamp(1, MAX_STEPS)
}

/// Downscale `source` by `target_scale`, alternating between the source
/// buffer and one equal-sized mirror buffer so no per-step allocation
/// happens. The per-step factor is geometric (target^(1/steps)), so the
/// cumulative scale after all steps is exactly the target; intermediate
/// dimensions are derived from the cumulative factor to avoid rounding
/// drift, and the final step lands on round(target * source dims).
///
/// `fill` is applied to the destination buffer before every draw, per the
/// output-format alpha rule.
pub fn scale(source: RasterSurface, target_scale: f64, fill: FillMode) -> Result<RasterSurface> {
    if !(target_scale > 0.0 && target_scale <= 1.0) {
        return Err(ShrinkImageError::invalid_argument(
            "target_scale",
            target_scale.to_string(),
            "must be in (0, 1]",
        ));
    }

    let steps = plan_steps(target_scale);
    if steps == 0 {
        // No-op: hand the surface straight back, no resampling.
        return Ok(source);
    }

    let src_w = source.width();
    let src_h = source.height();
    let final_dim = Dimension::new(
        (src_w as f64 * target_scale).round() as u32,
        (src_h as f64 * target_scale).round() as u32,
    );
    let factor = target_scale.powf(1.0 / steps as f64);

    let mut current = source;
    let mut mirror = RasterSurface::create(src_w, src_h);
    let mut content = Rect::at_origin(src_w, src_h);

    for step in 1..=steps {
        let (next_w, next_h) = if step == steps {
            (final_dim.width, final_dim.height)
        } else {
            let cumulative = factor.powi(step as i32);
            (
                ((src_w as f64 * cumulative).round() as u32).max(1),
                ((src_h as f64 * cumulative).round() as u32).max(1),
            )
        };
        mirror.clear(fill);
        mirror.draw_scaled(&current, content, Rect::at_origin(next_w, next_h))?;
        std::mem::swap(&mut current, &mut mirror);
        content = Rect::at_origin(next_w, next_h);
    }

    // Commit: the full-size buffer's top-left corner holds the final raster.
    // Read it back, shrink the surface to the final dimensions, and write the
    // pixels in — no extra resample on the last step.
    let pixels = current.read_pixels(Rect::at_origin(final_dim.width, final_dim.height));
    current.resize_in_place(final_dim);
    current.write_pixels(&pixels)?;
    Ok(current)
}
