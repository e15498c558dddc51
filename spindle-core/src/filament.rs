//! Per-filament growth/shrinkage state machine.

use rand::Rng;
use rand::distr::Distribution;

use crate::config::Config;
use crate::types::{FilamentId, Orientation};

/// Distance from the spindle center at which every filament starts.
pub const STARTING_POINT: f64 = 1.0;

/// Growth-duration distribution with CDF `(1 - e^{-r t})^n`.
///
/// Sampled by inverting the CDF: `t = -ln(1 - u^{1/n}) / r` for a uniform `u`
/// in `[0, 1)`. Samples are never negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CatastropheTime {
    n: f64,
    r: f64,
}

impl CatastropheTime {
    /// Both parameters are expected to be strictly positive, which
    /// [`Config::validate`] guarantees.
    pub fn new(n: f64, r: f64) -> Self {
        Self { n, r }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.duration_n, cfg.duration_r)
    }
}

impl Distribution<f64> for CatastropheTime {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random();
        -(1.0 - u.powf(1.0 / self.n)).ln() / self.r
    }
}

/// Dynamic phase of a filament.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Growing,
    Shrinking,
    /// Depolymerized past the pole. Terminal.
    Lost,
}

/// One microtubule.
///
/// `pos` is the signed offset of the plus end from the spindle center, so
/// `pos * orientation` is the distance the plus end has travelled towards the
/// opposite pole and `pos * orientation + spindle_edge` is the filament length.
#[derive(Clone, Debug, PartialEq)]
pub struct Filament {
    pub id: FilamentId,
    pub orientation: Orientation,
    pub pos: f64,
    pub phase: Phase,
    /// Remaining growth time before a forced catastrophe.
    pub next_catastrophe: f64,
    step_grow: f64,
    step_shrink: f64,
}

impl Filament {
    /// Creates a growing filament at the starting point with its given time
    /// to catastrophe.
    pub fn new(id: FilamentId, cfg: &Config, next_catastrophe: f64) -> Self {
        let orientation = Orientation::for_id(id);
        let sign = orientation.sign();
        Self {
            id,
            orientation,
            pos: STARTING_POINT * sign,
            phase: Phase::Growing,
            next_catastrophe,
            step_grow: cfg.dt * (cfg.v_growth - cfg.v_slide) * sign,
            step_shrink: -cfg.dt * (cfg.v_shrink + cfg.v_slide) * sign,
        }
    }

    /// Plus-end position measured along the filament's own axis.
    #[inline]
    pub fn lead(&self) -> f64 {
        self.pos * self.orientation.sign()
    }

    #[inline]
    pub fn length(&self, spindle_edge: f64) -> f64 {
        self.lead() + spindle_edge
    }

    #[inline]
    pub fn is_lost(&self) -> bool {
        self.phase == Phase::Lost
    }

    /// Advances a growing filament by one step.
    ///
    /// Returns `true` when the filament underwent catastrophe, either because
    /// its growth time ran out or because its plus end went past the pole.
    pub fn grow(&mut self, dt: f64, spindle_edge: f64) -> bool {
        self.pos += self.step_grow;
        self.next_catastrophe -= dt;

        if self.next_catastrophe < 0.0 || self.lead() > spindle_edge {
            self.phase = Phase::Shrinking;
            true
        } else {
            false
        }
    }

    pub fn shrink(&mut self) {
        self.pos += self.step_shrink;
    }

    /// Switches back to growth with a fresh time to catastrophe.
    pub fn rescue(&mut self, next_catastrophe: f64) {
        self.phase = Phase::Growing;
        self.next_catastrophe = next_catastrophe;
    }

    pub fn mark_lost(&mut self) {
        self.phase = Phase::Lost;
    }
}
