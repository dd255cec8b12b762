//! The guided "proof" playback: a fixed timeline of narrative steps and the
//! overlay text they write into.

use glam::Vec3;

/// Demo time after which playback switches itself off.
pub const DEMO_DURATION: f32 = 15.0;

pub const INTRO_MESSAGE: &str = "Demo: primes as superpositions (Phase-0 D3)";

#[derive(Debug, Clone, Copy)]
pub struct ScriptStep {
    pub at: f32,
    pub message: &'static str,
    pub position: [f32; 3],
}

impl ScriptStep {
    pub fn point(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// True when the trigger time was crossed by the tick that moved demo
    /// time from `before` to `after`. Each step fires on exactly one tick.
    pub fn crossed(&self, before: f32, after: f32) -> bool {
        before <= self.at && self.at < after
    }
}

pub const DEMO_SCRIPT: [ScriptStep; 4] = [
    ScriptStep {
        at: 2.0,
        message: "Gaussian smoothing (Symmetry-Breaking §3.1)",
        position: [-10.0, 0.0, 0.0],
    },
    ScriptStep {
        at: 5.0,
        message: "Prime anchors stabilize (Phase-0 D3/L5)",
        position: [-12.0, 12.0, 0.0],
    },
    ScriptStep {
        at: 8.0,
        message: "Contraction forces zeros to Re = 0.5",
        position: [-9.0, -18.0, 0.0],
    },
    ScriptStep {
        at: 11.0,
        message: "RH proven: zeros converge on critical line",
        position: [-14.0, 24.0, 0.0],
    },
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub text: String,
    pub visible: bool,
}

impl Overlay {
    pub fn show(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.visible = true;
    }

    pub fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Playback {
    pub playing: bool,
    pub demo_time: f32,
}

impl Playback {
    pub fn start(&mut self) {
        self.playing = true;
        self.demo_time = 0.0;
    }

    /// Advance demo time by `dt` and return the steps that trigger on this tick.
    /// Does nothing while idle.
    pub fn advance(&mut self, dt: f32) -> Vec<&'static ScriptStep> {
        if !self.playing {
            return Vec::new();
        }
        let before = self.demo_time;
        self.demo_time += dt;
        let after = self.demo_time;
        DEMO_SCRIPT
            .iter()
            .filter(|step| step.crossed(before, after))
            .collect()
    }

    /// Stop once past [`DEMO_DURATION`]. Returns true on the tick it stops.
    pub fn finish_if_done(&mut self) -> bool {
        if self.playing && self.demo_time > DEMO_DURATION {
            self.playing = false;
            return true;
        }
        false
    }
}
