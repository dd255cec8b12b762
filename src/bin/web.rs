use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[path = "../blob.rs"]
mod blob;
#[path = "../config.rs"]
mod config;
#[path = "../demo.rs"]
mod demo;
#[path = "../error.rs"]
mod error;
#[path = "../field.rs"]
mod field;
#[path = "../particles.rs"]
mod particles;
#[path = "../sim.rs"]
mod sim;
#[path = "../surface.rs"]
mod surface;
#[path = "../tables.rs"]
mod tables;

use config::{AppConfig, SimulationConfig};
use demo::DEMO_SCRIPT;
use error::AppError;
use sim::{CollapseReport, Simulation};
use surface::{SURFACE_HEIGHT, SURFACE_WIDTH};
use tables::{PRIMES, ZERO_HEIGHTS};

/// Period of the server-side simulation clock.
const TICK_PERIOD: Duration = Duration::from_millis(16);

/// One simulation shared by every request. Only the ticker task advances
/// its clock; requests read it or apply clicks and restarts.
struct Session {
    sim: Simulation,
    rng: StdRng,
    simulation: SimulationConfig,
}

type Shared = Arc<Mutex<Session>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Session> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Serialize)]
struct SceneLayout {
    width: f32,
    height: f32,
    columns: usize,
    rows: usize,
    vertices: Vec<[f32; 2]>,
    colors: Vec<[f32; 3]>,
    primes: Vec<u32>,
    zero_heights: Vec<f32>,
    script: Vec<ScriptInfo>,
}

#[derive(Serialize)]
struct ScriptInfo {
    at: f32,
    message: &'static str,
    position: [f32; 3],
}

#[derive(Serialize)]
struct OverlayState {
    text: String,
    visible: bool,
}

#[derive(Serialize)]
struct BlobState {
    position: [f32; 3],
    scale: f32,
    opacity: f32,
}

#[derive(Serialize)]
struct FrameState {
    t: f32,
    playing: bool,
    demo_time: f32,
    overlay: OverlayState,
    particles: Vec<[f32; 3]>,
    markers: Vec<f32>,
    blobs: Vec<BlobState>,
}

impl FrameState {
    fn capture(sim: &Simulation) -> Self {
        FrameState {
            t: sim.t,
            playing: sim.is_playing(),
            demo_time: sim.playback.demo_time,
            overlay: OverlayState {
                text: sim.overlay.text.clone(),
                visible: sim.overlay.visible,
            },
            particles: sim.primes.positions().iter().map(|p| p.to_array()).collect(),
            markers: sim.zeros.opacity().to_vec(),
            blobs: sim
                .blobs
                .iter()
                .map(|b| BlobState {
                    position: b.position.to_array(),
                    scale: b.scale,
                    opacity: b.opacity(),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct CollapseRequest {
    point: [f32; 3],
}

#[derive(Serialize)]
struct CollapseResponse {
    collapsed: usize,
    revealed_through: usize,
}

impl From<CollapseReport> for CollapseResponse {
    fn from(report: CollapseReport) -> Self {
        CollapseResponse {
            collapsed: report.collapsed,
            revealed_through: report.revealed_through,
        }
    }
}

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Riemann Collapse 3D</title>
    <style>
      html, body { margin: 0; padding: 0; height: 100%; overflow: hidden; background: #000; color: #e6e6e6; font-family: "Segoe UI", sans-serif; }
      canvas { display: block; }
      #playButton { position: absolute; top: 12px; left: 12px; background: #11151b; color: #e6e6e6; border: 1px solid #3c6a9e; border-radius: 6px; padding: 8px 14px; font-size: 13px; cursor: pointer; }
      #overlay { position: absolute; bottom: 24px; left: 50%; transform: translateX(-50%); background: rgba(10,12,16,0.85); border: 1px solid #2a2f36; border-radius: 8px; padding: 10px 16px; font-size: 15px; display: none; }
    </style>
  </head>
  <body>
    <canvas id="rhCanvas"></canvas>
    <button id="playButton">Play demo</button>
    <div id="overlay"></div>
    <script type="module">
      import * as THREE from 'https://cdn.jsdelivr.net/npm/three@0.168.0/build/three.module.js';
      import { OrbitControls } from 'https://cdn.jsdelivr.net/npm/three@0.168.0/examples/jsm/controls/OrbitControls.js';

      const canvas = document.getElementById('rhCanvas');
      const playButton = document.getElementById('playButton');
      const overlay = document.getElementById('overlay');

      const renderer = new THREE.WebGLRenderer({ canvas, antialias: true });
      renderer.setPixelRatio(window.devicePixelRatio);
      renderer.setSize(window.innerWidth, window.innerHeight);

      const scene = new THREE.Scene();
      scene.background = new THREE.Color(0x000000);
      const camera = new THREE.PerspectiveCamera(60, window.innerWidth / window.innerHeight, 0.1, 200);
      camera.position.set(30, 20, 40);
      const controls = new OrbitControls(camera, renderer.domElement);
      controls.enableDamping = true;
      controls.dampingFactor = 0.05;

      scene.add(new THREE.AmbientLight(0xffffff, 0.5));
      const dir = new THREE.DirectionalLight(0xffffff, 1.1);
      dir.position.set(20, 40, 20);
      scene.add(dir);

      const layout = await (await fetch('/api/scene')).json();

      scene.add(new THREE.Line(
        new THREE.BufferGeometry().setFromPoints([new THREE.Vector3(0, -60, 0), new THREE.Vector3(0, 60, 0)]),
        new THREE.LineBasicMaterial({ color: 0x00ffff })
      ));

      const primeGeo = new THREE.BufferGeometry();
      const primePositions = new Float32Array(layout.primes.length * 3);
      primeGeo.setAttribute('position', new THREE.BufferAttribute(primePositions, 3));
      scene.add(new THREE.Points(primeGeo, new THREE.PointsMaterial({ color: 0x00ff00, size: 0.6 })));

      const zeros = layout.zero_heights.map((h) => {
        const line = new THREE.Line(
          new THREE.BufferGeometry().setFromPoints([new THREE.Vector3(0, h - 0.6, 0), new THREE.Vector3(0, h + 0.6, 0)]),
          new THREE.LineBasicMaterial({ color: 0xff0000, transparent: true, opacity: 0.0 })
        );
        scene.add(line);
        return line;
      });

      const count = layout.vertices.length;
      const sPositions = new Float32Array(count * 3);
      const sColors = new Float32Array(count * 3);
      layout.vertices.forEach(([x, y], i) => { sPositions[i * 3] = x; sPositions[i * 3 + 1] = y; });
      layout.colors.forEach(([r, g, b], i) => { sColors[i * 3] = r; sColors[i * 3 + 1] = g; sColors[i * 3 + 2] = b; });
      const index = [];
      for (let row = 0; row < layout.rows - 1; row++) {
        for (let col = 0; col < layout.columns - 1; col++) {
          const a = row * layout.columns + col, b = a + layout.columns, c = b + 1, d = a + 1;
          index.push(a, b, d, b, c, d);
        }
      }
      const surfaceGeo = new THREE.BufferGeometry();
      surfaceGeo.setAttribute('position', new THREE.BufferAttribute(sPositions, 3));
      surfaceGeo.setAttribute('color', new THREE.BufferAttribute(sColors, 3));
      surfaceGeo.setIndex(index);
      const surface = new THREE.Mesh(surfaceGeo, new THREE.MeshStandardMaterial({
        vertexColors: true, side: THREE.DoubleSide, wireframe: true, opacity: 0.85, transparent: true
      }));
      scene.add(surface);

      const blobPool = [];
      const sphereGeo = new THREE.SphereGeometry(1.0, 32, 32);
      function blobMesh(i) {
        while (blobPool.length <= i) {
          const mesh = new THREE.Mesh(sphereGeo, new THREE.MeshBasicMaterial({ color: 0x00ffff, transparent: true, opacity: 0.8 }));
          scene.add(mesh);
          blobPool.push(mesh);
        }
        return blobPool[i];
      }

      const post = (url, body) => fetch(url, {
        method: 'POST', headers: { 'content-type': 'application/json' }, body: JSON.stringify(body ?? {})
      });

      let playing = false;
      function applyState(state) {
        playing = state.playing;
        state.particles.forEach(([x, y, z], i) => { primePositions.set([x, y, z], i * 3); });
        primeGeo.attributes.position.needsUpdate = true;
        state.markers.forEach((o, k) => { zeros[k].material.opacity = o; });
        blobPool.forEach((m) => { m.visible = false; });
        state.blobs.forEach((b, i) => {
          const m = blobMesh(i);
          m.visible = true;
          m.position.set(...b.position);
          m.scale.setScalar(b.scale);
          m.material.opacity = b.opacity;
        });
        overlay.style.display = state.overlay.visible ? 'block' : 'none';
        overlay.textContent = state.overlay.text;
        playButton.style.display = playing ? 'none' : 'block';
      }

      const raycaster = new THREE.Raycaster();
      const mouse = new THREE.Vector2();
      canvas.addEventListener('click', async (event) => {
        if (playing) return;
        const rect = canvas.getBoundingClientRect();
        mouse.x = ((event.clientX - rect.left) / rect.width) * 2 - 1;
        mouse.y = -((event.clientY - rect.top) / rect.height) * 2 + 1;
        raycaster.setFromCamera(mouse, camera);
        const hits = raycaster.intersectObject(surface);
        if (hits.length > 0) {
          const p = hits[0].point;
          await post('/api/collapse', { point: [p.x, p.y, p.z] });
        }
      });

      playButton.addEventListener('click', () => post('/api/play'));

      // frame = u32 LE json length, json state padded to 4 bytes, f32 LE heights
      let busy = false;
      async function step() {
        busy = true;
        try {
          const buf = await (await fetch('/api/frame')).arrayBuffer();
          const jsonLen = new DataView(buf).getUint32(0, true);
          const state = JSON.parse(new TextDecoder().decode(new Uint8Array(buf, 4, jsonLen)));
          const heights = new Float32Array(buf, 4 + Math.ceil(jsonLen / 4) * 4);
          applyState(state);
          for (let i = 0; i < heights.length; i++) sPositions[i * 3 + 2] = heights[i];
          surfaceGeo.attributes.position.needsUpdate = true;
          surfaceGeo.attributes.color.needsUpdate = true;
        } finally {
          busy = false;
        }
      }

      function animate() {
        requestAnimationFrame(animate);
        controls.update();
        if (!busy) step();
        renderer.render(scene, camera);
      }
      animate();

      window.addEventListener('resize', () => {
        camera.aspect = window.innerWidth / window.innerHeight;
        camera.updateProjectionMatrix();
        renderer.setSize(window.innerWidth, window.innerHeight);
      });
    </script>
  </body>
</html>
"##;

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn scene_layout(State(shared): State<Shared>) -> Json<SceneLayout> {
    let session = lock(&shared);
    let surface = &session.sim.surface;
    Json(SceneLayout {
        width: SURFACE_WIDTH,
        height: SURFACE_HEIGHT,
        columns: surface.columns(),
        rows: surface.rows(),
        vertices: surface.positions().iter().map(|p| [p[0], p[1]]).collect(),
        colors: surface.colors().to_vec(),
        primes: PRIMES.to_vec(),
        zero_heights: ZERO_HEIGHTS.to_vec(),
        script: DEMO_SCRIPT
            .iter()
            .map(|s| ScriptInfo {
                at: s.at,
                message: s.message,
                position: s.position,
            })
            .collect(),
    })
}

/// Advance the shared clock by a measured interval. Non-finite input counts
/// as no time passing.
fn advance(session: &mut Session, measured: f32) {
    let dt = if measured.is_finite() {
        session.simulation.frame_dt(measured)
    } else {
        0.0
    };
    session.sim.update(dt);
}

/// Drive the simulation from one task so the clock follows wall time no
/// matter how many clients are polling.
fn spawn_ticker(shared: Shared) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();
        loop {
            interval.tick().await;
            let now = Instant::now();
            advance(&mut lock(&shared), now.duration_since(last).as_secs_f32());
            last = now;
        }
    })
}

/// Overlay, particles, markers and blobs as JSON, followed by the surface
/// heights, all read under one lock so they describe the same tick.
fn encode_frame(sim: &Simulation) -> Result<Vec<u8>, serde_json::Error> {
    let state = serde_json::to_vec(&FrameState::capture(sim))?;
    let padded = state.len().next_multiple_of(4);
    let heights = sim.surface.positions();

    let mut bytes = Vec::with_capacity(4 + padded + heights.len() * 4);
    bytes.extend_from_slice(&(state.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&state);
    bytes.resize(4 + padded, b' ');
    for p in heights {
        bytes.extend_from_slice(&p[2].to_le_bytes());
    }
    Ok(bytes)
}

async fn frame(State(shared): State<Shared>) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bytes = encode_frame(&lock(&shared).sim)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

async fn collapse(
    State(shared): State<Shared>,
    Json(req): Json<CollapseRequest>,
) -> Json<Option<CollapseResponse>> {
    let mut session = lock(&shared);
    let report = session.sim.click(glam::Vec3::from(req.point));
    if let Some(report) = report {
        info!(
            collapsed = report.collapsed,
            revealed_through = report.revealed_through,
            "collapse"
        );
    }
    Json(report.map(CollapseResponse::from))
}

async fn play(State(shared): State<Shared>) -> Json<FrameState> {
    let mut session = lock(&shared);
    let Session { sim, rng, .. } = &mut *session;
    if sim.is_playing() {
        debug!("demo already running");
    } else {
        sim.start_demo(rng);
    }
    Json(FrameState::capture(sim))
}

fn app(shared: Shared) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/scene", get(scene_layout))
        .route("/api/frame", get(frame))
        .route("/api/collapse", post(collapse))
        .route("/api/play", post(play))
        .with_state(shared)
}

fn new_session(config: &AppConfig) -> Shared {
    let mut rng = match config.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sim = Simulation::new(&mut rng);
    Arc::new(Mutex::new(Session {
        sim,
        rng,
        simulation: config.simulation.clone(),
    }))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    let shared = new_session(&config);
    spawn_ticker(shared.clone());
    let router = app(shared);

    let listener = tokio::net::TcpListener::bind(config.web.addr).await?;
    info!("Serving on http://{}", config.web.addr);
    axum::serve(listener, router).await?;
    Ok(())
}
