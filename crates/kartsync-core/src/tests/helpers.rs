//! Test helpers: a simulated network and a three-role session.
//!
//! The network is modelled as one [`LatentChannel`] per direction. Delivery
//! is delayed by a fixed latency plus seeded jitter but never reordered, so
//! runs with the same seed are reproducible.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::KartConfig;
use crate::kinematics::KinematicState;
use crate::moves::{InputSample, MoveRecord};
use crate::net::NullSink;
use crate::role::{Frame, Kart, KartId, Role, SharedWorld};
use crate::state::ServerState;
use crate::track::{Bounds, Track};

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Network
// =============================================================================

/// In-order channel with latency and jitter.
#[derive(Debug)]
pub struct LatentChannel<T> {
    queue: VecDeque<(f64, T)>,
    latency: f64,
    jitter: f64,
    last_delivery: f64,
    rng: ChaCha8Rng,
}

impl<T> LatentChannel<T> {
    /// Creates a channel delaying every item by `latency` plus up to
    /// `jitter` seconds.
    pub fn new(latency: f64, jitter: f64, seed: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            latency,
            jitter,
            last_delivery: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Queues `item` at time `now`.
    pub fn send(&mut self, now: f64, item: T) {
        let jitter = if self.jitter > 0.0 {
            self.rng.gen_range(0.0..self.jitter)
        } else {
            0.0
        };
        // Never overtake an earlier item.
        let deliver_at = (now + self.latency + jitter).max(self.last_delivery);
        self.last_delivery = deliver_at;
        self.queue.push_back((deliver_at, item));
    }

    /// Everything due by `now`, oldest first.
    pub fn receive(&mut self, now: f64) -> Vec<T> {
        let mut delivered = Vec::new();
        while let Some((at, _)) = self.queue.front() {
            if *at > now {
                break;
            }
            if let Some((_, item)) = self.queue.pop_front() {
                delivered.push(item);
            }
        }
        delivered
    }

    /// Only the newest item due by `now`; older ones are coalesced away.
    pub fn receive_latest(&mut self, now: f64) -> Option<T> {
        self.receive(now).pop()
    }

    /// Whether anything is still in flight.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// =============================================================================
// Worlds
// =============================================================================

/// A 40 m square arena with a barrier in the middle of the long straight.
pub fn test_track() -> Track {
    Track::new(Bounds::new(4_000.0, 4_000.0, 400.0)).with_obstacle(Bounds::from_min_max(
        Vec3::new(800.0, -200.0, -100.0),
        Vec3::new(1_000.0, 200.0, 100.0),
    ))
}

/// Driver input that weaves and occasionally brakes; a pure function of the
/// tick index.
#[allow(clippy::cast_precision_loss)]
pub fn weaving_input(tick: usize) -> InputSample {
    let phase = tick as f32 * 0.07;
    let throttle = if tick % 90 < 70 { 1.0 } else { -0.5 };
    InputSample::new(phase.sin(), throttle)
}

/// `count` straight, full-throttle moves of `dt` starting at `first`.
#[allow(clippy::cast_precision_loss)]
pub fn straight_moves(first: f64, count: usize, dt: f32) -> Vec<MoveRecord> {
    (0..count)
        .map(|i| MoveRecord::new(0.0, 1.0, dt, first + f64::from(dt) * i as f64))
        .collect()
}

// =============================================================================
// Session
// =============================================================================

/// One server, the owning client, and one observer, wired through latent
/// channels.
pub struct Session {
    /// Authority for the kart
    pub server: Kart,
    /// Client driving the kart
    pub client: Kart,
    /// Client watching the kart
    pub observer: Kart,
    /// Client → server moves
    pub uplink: LatentChannel<MoveRecord>,
    /// Server → owning client snapshots
    pub to_client: LatentChannel<ServerState>,
    /// Server → observer snapshots
    pub to_observer: LatentChannel<ServerState>,
    /// Snapshots are sent to the observer every this many ticks
    pub observer_send_every: usize,
    /// Upper bound on one-way delivery time, in seconds
    pub max_delay: f64,
    /// Every move the client sent, in order
    pub sent: Vec<MoveRecord>,
    now: f64,
    ticks: usize,
}

impl Session {
    /// Builds a session in `world` with the given channel latency and seed.
    pub fn new(world: SharedWorld, latency: f64, jitter: f64, seed: u64) -> Self {
        let config = KartConfig::default();
        let start = KinematicState::default();
        let build = |id: u64, role: Role| {
            Kart::new(KartId::new(id), role, &config, start)
                .map(|kart| kart.with_world(Arc::clone(&world)))
        };
        Self {
            server: build(1, Role::Authority).unwrap(),
            client: build(2, Role::OwningClient).unwrap(),
            observer: build(3, Role::RemoteObserver).unwrap(),
            uplink: LatentChannel::new(latency, jitter, seed),
            to_client: LatentChannel::new(latency, jitter, seed.wrapping_add(1)),
            to_observer: LatentChannel::new(latency, jitter, seed.wrapping_add(2)),
            observer_send_every: 3,
            max_delay: latency + jitter,
            sent: Vec::new(),
            now: 0.0,
            ticks: 0,
        }
    }

    /// One tick: the client drives with `input`, the server advances and
    /// publishes, and deliveries due this tick are handed over.
    pub fn tick(&mut self, input: InputSample, dt: f32) {
        self.now += f64::from(dt);
        self.ticks += 1;

        let mut sink = NullSink;
        self.server
            .update(&mut Frame::new(dt, input, &mut sink))
            .unwrap();

        let mut outbox: Vec<MoveRecord> = Vec::new();
        self.client
            .update(&mut Frame::new(dt, input, &mut outbox))
            .unwrap();
        for mv in outbox {
            self.sent.push(mv);
            self.uplink.send(self.now, mv);
        }

        self.exchange(dt);
    }

    /// One tick in which the client sends nothing.
    pub fn idle(&mut self, dt: f32) {
        self.now += f64::from(dt);
        self.ticks += 1;

        let mut sink = NullSink;
        self.server
            .update(&mut Frame::new(dt, InputSample::default(), &mut sink))
            .unwrap();
        self.exchange(dt);
    }

    /// Idles until every sent move is acknowledged, then long enough for
    /// the final snapshot to reach the observer.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn settle(&mut self, dt: f32) {
        let mut budget = 10_000;
        while !(self.uplink.is_empty() && self.client_pending() == 0) {
            assert!(budget > 0, "session did not settle");
            budget -= 1;
            self.idle(dt);
        }
        let delivery_ticks = (self.max_delay / f64::from(dt)).ceil() as usize;
        for _ in 0..delivery_ticks + self.observer_send_every + 2 {
            self.idle(dt);
        }
    }

    /// Moves the client is still waiting on.
    pub fn client_pending(&self) -> usize {
        self.client.prediction_buffer().map_or(0, |buffer| buffer.len())
    }

    fn exchange(&mut self, dt: f32) {
        for mv in self.uplink.receive(self.now) {
            // Rejections are logged by the kart and otherwise ignored here.
            let _ = self.server.on_move_received(mv);
        }

        if let Some(snapshot) = self.server.server_state().copied() {
            self.to_client.send(self.now, snapshot);
            if self.ticks % self.observer_send_every == 0 {
                self.to_observer.send(self.now, snapshot);
            }
        }

        if let Some(snapshot) = self.to_client.receive_latest(self.now) {
            self.client.on_server_state(&snapshot).unwrap();
        }
        if let Some(snapshot) = self.to_observer.receive_latest(self.now) {
            self.observer.on_server_state(&snapshot).unwrap();
        }

        let mut sink = NullSink;
        self.observer
            .update(&mut Frame::new(dt, InputSample::default(), &mut sink))
            .unwrap();
    }

    /// Seconds simulated so far.
    pub fn now(&self) -> f64 {
        self.now
    }
}
