//! Screen/NDC/world coordinate transforms
//!
//! Two 3x3 affine matrices drive all coordinate conversion: a projection
//! matrix derived purely from the viewport size, and a model matrix mutated
//! only by pan/zoom input. Rendering never writes either one.

use glam::{Mat3, Vec2, Vec3};

use crate::constants::render;

/// Builds the projection matrix mapping viewport pixel coordinates
/// (origin top-left, y down) to clip space.
pub fn projection(width: f32, height: f32) -> Mat3 {
    let w = width.max(1.0);
    let h = height.max(1.0);
    Mat3::from_cols(
        Vec3::new(2.0 / w, 0.0, 0.0),
        Vec3::new(0.0, -2.0 / h, 0.0),
        Vec3::new(-1.0, 1.0, 1.0),
    )
}

/// Builds the pan/zoom model matrix: translate(tx, ty) ∘ scale(s).
///
/// The anchor translation that keeps a zoom centered on the cursor is folded
/// into `tx`/`ty` by [`zoom_about`], so the composed matrix stays a plain
/// translate-scale pair and its scale component can be read back directly.
pub fn compose(tx: f32, ty: f32, scale: f32) -> Mat3 {
    Mat3::from_translation(Vec2::new(tx, ty)) * Mat3::from_scale(Vec2::splat(scale))
}

/// Reads the zoom level back out of a model matrix.
pub fn zoom_of(model: &Mat3) -> f32 {
    model.x_axis.x
}

/// Converts a screen-space point to world space by inverting
/// `projection * model` applied to the point's NDC form.
///
/// A singular composition falls back to the identity matrix so picking
/// degrades to "no match" instead of panicking.
pub fn screen_to_world(screen: Vec2, viewport: Vec2, projection: &Mat3, model: &Mat3) -> Vec2 {
    let ndc = Vec3::new(
        2.0 * screen.x / viewport.x.max(1.0) - 1.0,
        1.0 - 2.0 * screen.y / viewport.y.max(1.0),
        1.0,
    );
    let composed = *projection * *model;
    let inverse = if composed.determinant().abs() <= f32::EPSILON {
        Mat3::IDENTITY
    } else {
        composed.inverse()
    };
    let world = inverse * ndc;
    Vec2::new(world.x, world.y)
}

/// Converts a world-space point to screen-space pixels.
pub fn world_to_screen(world: Vec2, viewport: Vec2, projection: &Mat3, model: &Mat3) -> Vec2 {
    let clip = *projection * *model * Vec3::new(world.x, world.y, 1.0);
    Vec2::new(
        (clip.x + 1.0) * 0.5 * viewport.x,
        (1.0 - clip.y) * 0.5 * viewport.y,
    )
}

/// Returns the `(tx, ty, scale)` triple that zooms to `new_scale` while
/// keeping the world point under `anchor` (screen px) stationary.
pub fn zoom_about(anchor: Vec2, world_at_anchor: Vec2, new_scale: f32) -> (f32, f32, f32) {
    // screen = world * s + t, so t = screen - world * s
    let tx = anchor.x - world_at_anchor.x * new_scale;
    let ty = anchor.y - world_at_anchor.y * new_scale;
    (tx, ty, new_scale)
}

/// Zoom-compensated primitive size: `size * zoom^k`.
///
/// The attenuation is logarithmic rather than linear so point and ring sizes
/// stay legible at both zoom extremes.
pub fn attenuated_size(size: f32, zoom: f32, k: f32) -> f32 {
    size * (zoom.max(f32::MIN_POSITIVE).ln() * k).exp()
}

/// Node point size compensation.
pub fn node_screen_size(size: f32, zoom: f32) -> f32 {
    attenuated_size(size, zoom, render::NODE_SIZE_ATTENUATION)
}

/// Selection ring radius compensation.
pub fn ring_screen_size(size: f32, zoom: f32) -> f32 {
    attenuated_size(size, zoom, render::RING_SIZE_ATTENUATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_projection_corners() {
        let p = projection(800.0, 600.0);
        let tl = p * Vec3::new(0.0, 0.0, 1.0);
        let br = p * Vec3::new(800.0, 600.0, 1.0);
        assert!((tl.x + 1.0).abs() < 1e-6 && (tl.y - 1.0).abs() < 1e-6);
        assert!((br.x - 1.0).abs() < 1e-6 && (br.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let viewport = Vec2::new(640.0, 480.0);
        let p = projection(viewport.x, viewport.y);
        for &(tx, ty, s) in &[(0.0, 0.0, 1.0), (120.0, -45.0, 2.5), (-300.0, 80.0, 0.2)] {
            let m = compose(tx, ty, s);
            for &pt in &[
                Vec2::new(10.0, 10.0),
                Vec2::new(320.0, 240.0),
                Vec2::new(555.5, 17.25),
            ] {
                let screen = world_to_screen(pt, viewport, &p, &m);
                let back = screen_to_world(screen, viewport, &p, &m);
                assert!(approx(back, pt), "{pt:?} -> {screen:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn test_singular_model_degrades() {
        let viewport = Vec2::new(640.0, 480.0);
        let p = projection(viewport.x, viewport.y);
        let m = compose(0.0, 0.0, 0.0);
        let out = screen_to_world(Vec2::new(320.0, 240.0), viewport, &p, &m);
        assert!(out.x.is_finite() && out.y.is_finite());
    }

    #[test]
    fn test_zoom_readback() {
        let m = compose(17.0, -4.0, 3.25);
        assert!((zoom_of(&m) - 3.25).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_about_keeps_anchor() {
        let viewport = Vec2::new(500.0, 500.0);
        let p = projection(viewport.x, viewport.y);
        let m = compose(40.0, -20.0, 1.5);
        let anchor = Vec2::new(260.0, 140.0);
        let world = screen_to_world(anchor, viewport, &p, &m);
        let (tx, ty, s) = zoom_about(anchor, world, 2.4);
        let m2 = compose(tx, ty, s);
        let anchor_after = world_to_screen(world, viewport, &p, &m2);
        assert!(approx(anchor, anchor_after));
    }

    #[test]
    fn test_attenuated_size() {
        // zoom = 1 is the fixed point for any exponent
        assert!((attenuated_size(10.0, 1.0, 0.5) - 10.0).abs() < 1e-5);
        // k = 0.5 grows with the square root of the zoom
        assert!((attenuated_size(10.0, 4.0, 0.5) - 20.0).abs() < 1e-4);
        // k = -0.5 shrinks with the square root of the zoom
        assert!((attenuated_size(10.0, 4.0, -0.5) - 5.0).abs() < 1e-4);
    }
}
