//! Transient "gaussian" spheres spawned by collapses. They grow, fade and
//! expire on their own.

use glam::Vec3;

pub const BLOB_LIFETIME: f32 = 1.3;
pub const BLOB_GROWTH_PER_TICK: f32 = 0.06;
pub const BLOB_START_OPACITY: f32 = 0.8;
const BLOB_DECAY_RATE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub position: Vec3,
    pub age: f32,
    pub scale: f32,
}

impl Blob {
    pub fn new(position: Vec3) -> Self {
        Blob {
            position,
            age: 0.0,
            scale: 1.0,
        }
    }

    pub fn opacity(&self) -> f32 {
        BLOB_START_OPACITY * (-BLOB_DECAY_RATE * self.age).exp()
    }

    pub fn is_expired(&self) -> bool {
        self.age > BLOB_LIFETIME
    }
}

#[derive(Default)]
pub struct Blobs {
    active: Vec<Blob>,
}

impl Blobs {
    pub fn spawn(&mut self, position: Vec3) {
        self.active.push(Blob::new(position));
    }

    /// Age, grow and cull. Growth is per tick, not per second.
    pub fn advance(&mut self, dt: f32) {
        for blob in &mut self.active {
            blob.age += dt;
            blob.scale += BLOB_GROWTH_PER_TICK;
        }
        self.active.retain(|b| !b.is_expired());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blob> {
        self.active.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_fades_and_grows() {
        let mut blobs = Blobs::default();
        blobs.spawn(Vec3::new(1.0, 2.0, 3.0));
        let fresh = *blobs.iter().next().unwrap();
        assert_eq!(fresh.opacity(), 0.8);

        blobs.advance(0.5);
        let blob = blobs.iter().next().unwrap();
        assert!((blob.scale - 1.06).abs() < 1e-6);
        assert!((blob.opacity() - 0.8 * (-1.0_f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_blob_expires_after_lifetime() {
        let mut blobs = Blobs::default();
        blobs.spawn(Vec3::ZERO);
        for _ in 0..81 {
            blobs.advance(0.016);
        }
        // 81 * 0.016 = 1.296, still alive
        assert_eq!(blobs.len(), 1);
        blobs.advance(0.016);
        assert!(blobs.is_empty());
    }
}
