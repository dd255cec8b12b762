//! Prime particles and zeta-zero markers.
//!
//! Both collections are sized once from the data tables and only ever
//! mutated in place.

use glam::Vec3;
use rand::Rng;

use crate::tables::{PRIMES, ZERO_HEIGHTS};

/// Particles closer than this to a collapse point snap onto the critical line.
pub const CAPTURE_RADIUS: f32 = 6.0;

/// Amplitude of the per-index z offset given to collapsed particles.
pub const COLLAPSE_JITTER: f32 = 0.7;

/// Half length of a zero marker segment along y.
pub const MARKER_HALF_LENGTH: f32 = 0.6;

pub struct PrimeCloud {
    positions: Vec<Vec3>,
}

impl PrimeCloud {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cloud = PrimeCloud {
            positions: vec![Vec3::ZERO; PRIMES.len()],
        };
        cloud.scatter(rng);
        cloud
    }

    #[cfg(test)]
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        PrimeCloud { positions }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Throw every particle back to the left of the critical line:
    /// x in (-24, -6], y in [-40, 40), z = 0.
    pub fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for p in &mut self.positions {
            p.x = -rng.gen::<f32>() * 18.0 - 6.0;
            p.y = rng.gen::<f32>() * 80.0 - 40.0;
            p.z = 0.0;
        }
    }

    /// Snap every particle within [`CAPTURE_RADIUS`] of `point` onto x = 0
    /// with a fixed z offset of `sin(index) * 0.7`. Returns how many moved.
    pub fn collapse_near(&mut self, point: Vec3) -> usize {
        let mut collapsed = 0;
        for (i, p) in self.positions.iter_mut().enumerate() {
            if p.distance(point) < CAPTURE_RADIUS {
                p.x = 0.0;
                p.z = (i as f32).sin() * COLLAPSE_JITTER;
                collapsed += 1;
            }
        }
        collapsed
    }
}

pub struct ZeroMarkers {
    heights: Vec<f32>,
    opacity: Vec<f32>,
}

impl ZeroMarkers {
    pub fn new() -> Self {
        ZeroMarkers {
            heights: ZERO_HEIGHTS.to_vec(),
            opacity: vec![0.0; ZERO_HEIGHTS.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn opacity(&self) -> &[f32] {
        &self.opacity
    }

    /// Segment endpoints on the critical axis for marker `k`.
    pub fn segment(&self, k: usize) -> (Vec3, Vec3) {
        let h = self.heights[k];
        (
            Vec3::new(0.0, h - MARKER_HALF_LENGTH, 0.0),
            Vec3::new(0.0, h + MARKER_HALF_LENGTH, 0.0),
        )
    }

    /// Reveal index for a collapse that moved `collapsed` particles:
    /// one more marker per two particles, capped at the last marker.
    pub fn reveal_index_for(&self, collapsed: usize) -> usize {
        (collapsed / 2).min(self.len().saturating_sub(1))
    }

    /// Make markers `0..=index` fully opaque. Markers above are left alone.
    pub fn reveal_through(&mut self, index: usize) {
        let end = (index + 1).min(self.opacity.len());
        for o in &mut self.opacity[..end] {
            *o = 1.0;
        }
    }

    pub fn hide_all(&mut self) {
        self.opacity.iter_mut().for_each(|o| *o = 0.0);
    }
}

impl Default for ZeroMarkers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scatter_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let cloud = PrimeCloud::new(&mut rng);
        assert_eq!(cloud.len(), PRIMES.len());
        for p in cloud.positions() {
            assert!(p.x > -24.0 && p.x <= -6.0, "x = {}", p.x);
            assert!(p.y >= -40.0 && p.y < 40.0, "y = {}", p.y);
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn test_collapse_near_moves_only_captured() {
        let mut cloud = PrimeCloud::from_positions(vec![
            Vec3::new(-10.0, 0.0, 0.0),
            Vec3::new(-8.0, 1.0, 0.0),
            Vec3::new(-10.0, 20.0, 0.0),
            Vec3::new(-10.0, 6.0, 0.0),
        ]);
        let count = cloud.collapse_near(Vec3::new(-10.0, 0.0, 0.0));
        assert_eq!(count, 2);

        let p = cloud.positions();
        assert_eq!(p[0].x, 0.0);
        assert_eq!(p[0].z, 0.0_f32.sin() * 0.7);
        assert_eq!(p[1].x, 0.0);
        assert_eq!(p[1].y, 1.0);
        assert_eq!(p[1].z, 1.0_f32.sin() * 0.7);
        // far away and exactly on the radius: untouched
        assert_eq!(p[2], Vec3::new(-10.0, 20.0, 0.0));
        assert_eq!(p[3], Vec3::new(-10.0, 6.0, 0.0));
    }

    #[test]
    fn test_reveal_is_prefix_and_monotonic() {
        let mut markers = ZeroMarkers::new();
        markers.reveal_through(markers.reveal_index_for(7));
        assert_eq!(&markers.opacity()[..4], &[1.0; 4]);
        assert!(markers.opacity()[4..].iter().all(|&o| o == 0.0));

        // a smaller collapse never hides anything
        markers.reveal_through(markers.reveal_index_for(0));
        assert_eq!(&markers.opacity()[..4], &[1.0; 4]);

        markers.hide_all();
        assert!(markers.opacity().iter().all(|&o| o == 0.0));
    }

    #[test]
    fn test_reveal_index_capped() {
        let markers = ZeroMarkers::new();
        assert_eq!(markers.reveal_index_for(0), 0);
        assert_eq!(markers.reveal_index_for(1), 0);
        assert_eq!(markers.reveal_index_for(9), 4);
        assert_eq!(markers.reveal_index_for(1000), ZERO_HEIGHTS.len() - 1);
    }

    #[test]
    fn test_marker_segment() {
        let markers = ZeroMarkers::new();
        let (a, b) = markers.segment(0);
        assert!((a.y - (14.1347 - 0.6)).abs() < 1e-4);
        assert!((b.y - (14.1347 + 0.6)).abs() < 1e-4);
        assert_eq!(a.x, 0.0);
    }
}
