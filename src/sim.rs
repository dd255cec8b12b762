//! Everything that changes from frame to frame, with no graphics attached.
//! The host calls [`Simulation::update`] once per frame, forwards pointer hits
//! to [`Simulation::click`], and renders whatever state is left afterwards.

use glam::Vec3;
use rand::Rng;
use tracing::{debug, info};

use crate::blob::Blobs;
use crate::demo::{Overlay, Playback, INTRO_MESSAGE};
use crate::particles::{PrimeCloud, ZeroMarkers};
use crate::surface::Surface;

/// What a single collapse did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseReport {
    pub collapsed: usize,
    pub revealed_through: usize,
}

pub struct Simulation {
    pub t: f32,
    pub surface: Surface,
    pub primes: PrimeCloud,
    pub zeros: ZeroMarkers,
    pub blobs: Blobs,
    pub playback: Playback,
    pub overlay: Overlay,
}

impl Simulation {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_parts(Surface::new(), PrimeCloud::new(rng))
    }

    pub fn with_parts(surface: Surface, primes: PrimeCloud) -> Self {
        Simulation {
            t: 0.0,
            surface,
            primes,
            zeros: ZeroMarkers::new(),
            blobs: Blobs::default(),
            playback: Playback::default(),
            overlay: Overlay::default(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.playing
    }

    /// One frame: clock, surface, blobs, then the demo timeline.
    pub fn update(&mut self, dt: f32) {
        self.t += dt;

        // The contraction follows demo time even while idle.
        self.surface.deform(self.t, self.playback.demo_time);

        self.blobs.advance(dt);

        if !self.playback.playing {
            return;
        }

        for step in self.playback.advance(dt) {
            info!(demo_time = self.playback.demo_time, message = step.message, "demo step");
            self.overlay.set_text(step.message);
            self.collapse(step.point());
        }

        if self.playback.finish_if_done() {
            info!(demo_time = self.playback.demo_time, "demo finished");
            self.overlay.hide();
        }
    }

    /// Spawn a blob at `point`, pull nearby primes onto the critical line and
    /// reveal zero markers in proportion.
    pub fn collapse(&mut self, point: Vec3) -> CollapseReport {
        self.blobs.spawn(point);

        let collapsed = self.primes.collapse_near(point);
        let revealed_through = self.zeros.reveal_index_for(collapsed);
        self.zeros.reveal_through(revealed_through);

        debug!(x = point.x, y = point.y, z = point.z, collapsed, revealed_through, "collapse");
        CollapseReport {
            collapsed,
            revealed_through,
        }
    }

    /// Pointer hit on the surface. Ignored during playback.
    pub fn click(&mut self, point: Vec3) -> Option<CollapseReport> {
        if self.playback.playing {
            return None;
        }
        Some(self.collapse(point))
    }

    /// Reset primes and markers, then start the scripted playback.
    pub fn start_demo<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.primes.scatter(rng);
        self.zeros.hide_all();
        self.playback.start();
        self.overlay.show(INTRO_MESSAGE);
        info!("demo started");
    }
}
