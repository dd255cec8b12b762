//! The deformable "zeta landscape": a fixed grid in the x/y plane whose
//! heights and colors are recomputed every frame.

use glam::Vec3;

use crate::field::{contraction_factor, hsl_to_rgb, oscillator_height, zeta_amplitude};

pub const SURFACE_WIDTH: f32 = 26.0;
pub const SURFACE_HEIGHT: f32 = 90.0;
pub const WIDTH_SEGMENTS: usize = 140;
pub const HEIGHT_SEGMENTS: usize = 260;

/// Re(s) that the surface is squeezed towards.
pub const CRITICAL_RE: f32 = 0.5;

/// Seconds of demo time over which the contraction goes from 0 to 1.
pub const CONTRACTION_SECONDS: f32 = 12.0;

pub struct Surface {
    cols: usize,
    rows: usize,
    /// (x, y, z) per vertex; x and y never change after construction.
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl Surface {
    pub fn new() -> Self {
        Self::with_segments(WIDTH_SEGMENTS, HEIGHT_SEGMENTS)
    }

    /// Plane of `SURFACE_WIDTH x SURFACE_HEIGHT` centred on the origin.
    /// Rows run from the top edge (+y) down, columns left to right.
    pub fn with_segments(width_segments: usize, height_segments: usize) -> Self {
        let width_segments = width_segments.max(1);
        let height_segments = height_segments.max(1);
        let cols = width_segments + 1;
        let rows = height_segments + 1;

        let dx = SURFACE_WIDTH / width_segments as f32;
        let dy = SURFACE_HEIGHT / height_segments as f32;

        let mut positions = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            let y = SURFACE_HEIGHT / 2.0 - row as f32 * dy;
            for col in 0..cols {
                let x = col as f32 * dx - SURFACE_WIDTH / 2.0;
                positions.push([x, y, 0.0]);
            }
        }

        let colors = positions.iter().map(|p| vertex_color(p[1])).collect();

        Surface {
            cols,
            rows,
            positions,
            colors,
        }
    }

    #[cfg(test)]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn columns(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    /// Recompute every vertex height and color for clock `t`, with the
    /// contraction progress derived from `demo_time`.
    pub fn deform(&mut self, t: f32, demo_time: f32) {
        let contraction = contraction_factor((demo_time / CONTRACTION_SECONDS).min(1.0));
        let half_width = SURFACE_WIDTH / 2.0;

        for (pos, color) in self.positions.iter_mut().zip(self.colors.iter_mut()) {
            let [x, y, _] = *pos;
            let re = CRITICAL_RE + (x / half_width) * contraction;
            let im = y;

            let amplitude = zeta_amplitude(re, im, t);
            let osc = oscillator_height(x, y, t);
            pos[2] = 0.6 * amplitude + 0.6 * osc;

            *color = vertex_color(im);
        }
    }

    /// Two triangles per grid cell, as vertex indices.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.rows - 1).flat_map(move |row| {
            (0..self.cols - 1).flat_map(move |col| {
                let a = self.index(col, row);
                let b = self.index(col, row + 1);
                let c = self.index(col + 1, row + 1);
                let d = self.index(col + 1, row);
                [[a, b, d], [b, c, d]]
            })
        })
    }

    /// Nearest intersection of a ray with the current surface triangles.
    pub fn raycast(&self, origin: Vec3, dir: Vec3) -> Option<Vec3> {
        let mut nearest: Option<f32> = None;
        for [a, b, c] in self.triangles() {
            let v0 = Vec3::from(self.positions[a]);
            let v1 = Vec3::from(self.positions[b]);
            let v2 = Vec3::from(self.positions[c]);
            if let Some(dist) = ray_triangle(origin, dir, v0, v1, v2) {
                if nearest.map_or(true, |best| dist < best) {
                    nearest = Some(dist);
                }
            }
        }
        nearest.map(|dist| origin + dir * dist)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

/// Rainbow along the imaginary axis: hue 0 at the bottom edge, 1 at the top.
fn vertex_color(im: f32) -> [f32; 3] {
    let hue = (im + SURFACE_HEIGHT / 2.0) / SURFACE_HEIGHT;
    hsl_to_rgb(hue, 1.0, 0.5)
}

/// Möller–Trumbore, double sided. Returns the ray parameter of the hit.
fn ray_triangle(origin: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPS: f32 = 1e-7;
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let dist = e2.dot(q) * inv_det;
    (dist > EPS).then_some(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{oscillator_height, zeta_amplitude};

    #[test]
    fn test_grid_layout() {
        let surface = Surface::new();
        assert_eq!(surface.vertex_count(), 141 * 261);

        let top_left = surface.positions()[0];
        assert_eq!(top_left[0], -13.0);
        assert_eq!(top_left[1], 45.0);

        let last = surface.positions()[surface.vertex_count() - 1];
        assert!((last[0] - 13.0).abs() < 1e-4);
        assert!((last[1] + 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_colors_follow_height_band() {
        let surface = Surface::with_segments(2, 2);
        // bottom row has hue 0 => red, top row hue 1 => red again, middle hue 0.5 => cyan
        let bottom = surface.colors()[surface.index(0, 2)];
        assert!((bottom[0] - 1.0).abs() < 1e-5 && bottom[1].abs() < 1e-5);
        let middle = surface.colors()[surface.index(1, 1)];
        assert!(middle[0].abs() < 1e-5 && (middle[1] - 1.0).abs() < 1e-5 && (middle[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deform_matches_fields() {
        let mut surface = Surface::with_segments(4, 4);
        surface.deform(1.5, 0.0);
        let [x, y, z] = surface.positions()[surface.index(3, 1)];
        let re = 0.5 + x / 13.0;
        let expected = 0.6 * zeta_amplitude(re, y, 1.5) + 0.6 * oscillator_height(x, y, 1.5);
        assert!((z - expected).abs() < 1e-5);
    }

    #[test]
    fn test_deform_contracts_with_demo_time() {
        let mut idle = Surface::with_segments(4, 4);
        let mut contracted = Surface::with_segments(4, 4);
        idle.deform(0.0, 0.0);
        contracted.deform(0.0, 24.0);

        let i = idle.index(4, 2);
        let [x, y, _] = contracted.positions()[i];
        let re = 0.5 + (x / 13.0) * 0.15;
        let expected = 0.6 * zeta_amplitude(re, y, 0.0) + 0.6 * oscillator_height(x, y, 0.0);
        assert!((contracted.positions()[i][2] - expected).abs() < 1e-5);
        assert!((idle.positions()[i][2] - contracted.positions()[i][2]).abs() > 1e-3);
    }

    #[test]
    fn test_deform_keeps_xy() {
        let mut surface = Surface::with_segments(8, 8);
        let before: Vec<_> = surface.positions().iter().map(|p| (p[0], p[1])).collect();
        surface.deform(3.0, 5.0);
        let after: Vec<_> = surface.positions().iter().map(|p| (p[0], p[1])).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_raycast_hits_flat_surface() {
        let surface = Surface::with_segments(4, 4);
        let hit = surface
            .raycast(Vec3::new(1.0, 2.0, 10.0), Vec3::new(0.0, 0.0, -1.0))
            .expect("ray straight down should hit");
        assert!((hit - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_raycast_miss() {
        let surface = Surface::with_segments(4, 4);
        assert!(surface
            .raycast(Vec3::new(100.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -1.0))
            .is_none());
        assert!(surface
            .raycast(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 1.0))
            .is_none());
    }
}
