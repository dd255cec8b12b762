//! Turns simulation state into GPU vertex lists: a wireframe surface, the
//! critical line, zero markers, prime sprites and blob spheres.

use glam::Vec3;

use crate::graphics::Vertex;
use crate::sim::Simulation;

const SURFACE_OPACITY: f32 = 0.85;
const CRITICAL_LINE_HALF_LENGTH: f32 = 60.0;
const PRIME_SIZE: f32 = 0.6;
const SPHERE_RINGS: usize = 12;
const SPHERE_SEGMENTS: usize = 16;

const CYAN: [f32; 3] = [0.0, 1.0, 1.0];
const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];

#[derive(Default)]
pub struct SceneGeometry {
    pub triangles: Vec<Vertex>,
    pub lines: Vec<Vertex>,
}

fn vertex(p: Vec3, rgb: [f32; 3], alpha: f32) -> Vertex {
    Vertex {
        position: p.to_array(),
        color: [rgb[0], rgb[1], rgb[2], alpha],
    }
}

impl SceneGeometry {
    /// Rebuild in place, reusing the allocations from the previous frame.
    /// `right` and `up` are the camera's world axes, used to face prime sprites.
    pub fn rebuild(&mut self, sim: &Simulation, right: Vec3, up: Vec3) {
        self.triangles.clear();
        self.lines.clear();

        self.push_surface(sim);
        self.push_line(
            Vec3::new(0.0, -CRITICAL_LINE_HALF_LENGTH, 0.0),
            Vec3::new(0.0, CRITICAL_LINE_HALF_LENGTH, 0.0),
            CYAN,
            1.0,
        );

        for (k, &opacity) in sim.zeros.opacity().iter().enumerate() {
            if opacity > 0.0 {
                let (a, b) = sim.zeros.segment(k);
                self.push_line(a, b, RED, opacity);
            }
        }

        let half_right = right * (PRIME_SIZE / 2.0);
        let half_up = up * (PRIME_SIZE / 2.0);
        for &p in sim.primes.positions() {
            let corners = [
                p - half_right - half_up,
                p + half_right - half_up,
                p + half_right + half_up,
                p - half_right + half_up,
            ];
            for i in [0, 1, 2, 0, 2, 3] {
                self.triangles.push(vertex(corners[i], GREEN, 1.0));
            }
        }

        for blob in sim.blobs.iter() {
            self.push_sphere(blob.position, blob.scale, CYAN, blob.opacity());
        }
    }

    fn push_line(&mut self, a: Vec3, b: Vec3, rgb: [f32; 3], alpha: f32) {
        self.lines.push(vertex(a, rgb, alpha));
        self.lines.push(vertex(b, rgb, alpha));
    }

    /// Grid edges along rows and columns, colored per vertex.
    fn push_surface(&mut self, sim: &Simulation) {
        let surface = &sim.surface;
        let positions = surface.positions();
        let colors = surface.colors();
        let at = |i: usize| Vertex {
            position: positions[i],
            color: [colors[i][0], colors[i][1], colors[i][2], SURFACE_OPACITY],
        };

        for row in 0..surface.rows() {
            for col in 0..surface.columns() {
                let i = surface.index(col, row);
                if col + 1 < surface.columns() {
                    self.lines.push(at(i));
                    self.lines.push(at(surface.index(col + 1, row)));
                }
                if row + 1 < surface.rows() {
                    self.lines.push(at(i));
                    self.lines.push(at(surface.index(col, row + 1)));
                }
            }
        }
    }

    fn push_sphere(&mut self, center: Vec3, radius: f32, rgb: [f32; 3], alpha: f32) {
        let point = |ring: usize, seg: usize| {
            let theta = ring as f32 / SPHERE_RINGS as f32 * std::f32::consts::PI;
            let phi = seg as f32 / SPHERE_SEGMENTS as f32 * std::f32::consts::TAU;
            let (sin_t, cos_t) = theta.sin_cos();
            let (sin_p, cos_p) = phi.sin_cos();
            center + radius * Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p)
        };

        for ring in 0..SPHERE_RINGS {
            for seg in 0..SPHERE_SEGMENTS {
                let a = point(ring, seg);
                let b = point(ring + 1, seg);
                let c = point(ring + 1, seg + 1);
                let d = point(ring, seg + 1);
                for p in [a, b, c, a, c, d] {
                    self.triangles.push(vertex(p, rgb, alpha));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::PrimeCloud;
    use crate::surface::Surface;

    #[test]
    fn test_geometry_counts() {
        let primes = PrimeCloud::from_positions(vec![Vec3::new(-10.0, 0.0, 0.0); 3]);
        let mut sim = Simulation::with_parts(Surface::with_segments(2, 3), primes);
        let mut scene = SceneGeometry::default();

        scene.rebuild(&sim, Vec3::X, Vec3::Y);
        // 3x4 grid: 2*4 row edges + 3*3 column edges, plus the critical line
        assert_eq!(scene.lines.len(), (8 + 9 + 1) * 2);
        assert_eq!(scene.triangles.len(), 3 * 6);

        sim.collapse(Vec3::new(50.0, 50.0, 0.0));
        scene.rebuild(&sim, Vec3::X, Vec3::Y);
        // marker 0 revealed, one blob
        assert_eq!(scene.lines.len(), (8 + 9 + 1 + 1) * 2);
        assert_eq!(scene.triangles.len(), 3 * 6 + SPHERE_RINGS * SPHERE_SEGMENTS * 6);
        let blob_alpha = scene.triangles.last().unwrap().color[3];
        assert_eq!(blob_alpha, 0.8);
    }
}
