//! Simulation driver for one spindle.
//!
//! Every tick runs the same phases in order:
//! 1. Advance the clock by `dt` and move both poles outwards by `dt * v_slide`.
//! 2. Check for spindle disassembly and stop if the two half-spindles no
//!    longer overlap.
//! 3. In ase1 mode, refresh the uniform rescue field from the current
//!    filament lengths.
//! 4. Step every active filament in id order. A filament lost during this
//!    phase immediately triggers rearrangement and a field recompute, so the
//!    filaments after it in the same tick already see the new field.
//!
//! A run owns all of its state, including its random source, so independent
//! runs can be moved to separate threads freely.

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::config::{Config, RescueMode};
use crate::error::ConfigError;
use crate::filament::{CatastropheTime, Filament, Phase};
use crate::recorder::{EventKind, EventRecorder, Record};
use crate::rescue::{RescueField, RescueQuery};
use crate::topology::Topology;
use crate::types::{FILAMENT_COUNT, FilamentId, Orientation};

/// Simulated time after which a run stops even if the spindle still holds.
pub const HORIZON: f64 = 20.0;

/// Pole-to-center distance at `t = 0`.
pub const INITIAL_SPINDLE_EDGE: f64 = 2.0;

/// Outcome of a single [`Simulation::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Disassembled,
    /// The run already ended; nothing was stepped.
    Finished,
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Horizon,
    Disassembled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub termination: Termination,
    /// Simulated time at which the run stopped.
    pub time: f64,
    /// Filaments still present at the end.
    pub surviving: usize,
    /// Total number of records emitted, end-of-run records included.
    pub records: usize,
}

#[derive(Debug)]
pub struct Simulation {
    cfg: Config,
    rng: StdRng,
    catastrophe: CatastropheTime,
    t: f64,
    spindle_edge: f64,
    midzone_edge: f64,
    filaments: [Filament; FILAMENT_COUNT],
    topology: Topology,
    field: RescueField,
    recorder: EventRecorder,
    termination: Option<Termination>,
}

impl Simulation {
    /// Creates a run whose random source is seeded with `seed`.
    ///
    /// Two runs built from the same configuration and seed emit identical
    /// record streams.
    pub fn new(cfg: Config, seed: u64) -> Result<Self, ConfigError> {
        Self::from_rng(cfg, StdRng::seed_from_u64(seed))
    }

    /// Creates a run that draws all of its randomness from `rng`.
    ///
    /// Construction validates `cfg`, samples the midzone edge, creates the
    /// nine filaments with their first catastrophe times, records their
    /// creation and builds the initial rescue field.
    ///
    /// ### Returns
    /// - `Err` if `cfg` fails [`Config::validate`] or its distributions cannot
    ///   be built. No random number is drawn in that case.
    pub fn from_rng(cfg: Config, mut rng: StdRng) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut field = RescueField::new(&cfg)?;
        let midzone = Normal::new(cfg.midzone_mu, cfg.midzone_sigma).map_err(|_| {
            ConfigError::MidzoneSampling {
                mu: cfg.midzone_mu,
                sigma: cfg.midzone_sigma,
            }
        })?;
        let catastrophe = CatastropheTime::from_config(&cfg);

        let midzone_edge = midzone.sample(&mut rng);
        let filaments: [Filament; FILAMENT_COUNT] =
            std::array::from_fn(|id| Filament::new(id, &cfg, rng.sample(catastrophe)));

        let topology = Topology::new();
        field.recompute_links(&topology, midzone_edge);
        debug!(
            "new spindle: mode {:?}, midzone edge {:.3}, rescue table {:?}",
            cfg.mode(),
            midzone_edge,
            field.table()
        );

        let mut sim = Self {
            cfg,
            rng,
            catastrophe,
            t: 0.0,
            spindle_edge: INITIAL_SPINDLE_EDGE,
            midzone_edge,
            filaments,
            topology,
            field,
            recorder: EventRecorder::new(),
            termination: None,
        };
        for id in 0..FILAMENT_COUNT {
            sim.record(id, EventKind::Creation);
        }
        sim.log_linkers();
        Ok(sim)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn spindle_edge(&self) -> f64 {
        self.spindle_edge
    }

    pub fn midzone_edge(&self) -> f64 {
        self.midzone_edge
    }

    pub fn filaments(&self) -> &[Filament; FILAMENT_COUNT] {
        &self.filaments
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn rescue_field(&self) -> &RescueField {
        &self.field
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> EventRecorder {
        self.recorder
    }

    pub fn surviving(&self) -> usize {
        self.filaments.iter().filter(|f| !f.is_lost()).count()
    }

    /// Whether the two half-spindles have come apart.
    ///
    /// The spindle holds while both orientations still have an active
    /// filament and the longest filament of each orientation together span
    /// more than the pole-to-pole distance.
    pub fn is_disassembled(&self) -> bool {
        let mut longest_plus: Option<f64> = None;
        let mut longest_minus: Option<f64> = None;

        for f in self.filaments.iter().filter(|f| !f.is_lost()) {
            let len = f.length(self.spindle_edge);
            let longest = if f.orientation == Orientation::Plus {
                &mut longest_plus
            } else {
                &mut longest_minus
            };
            *longest = Some(longest.map_or(len, |m| m.max(len)));
        }

        match (longest_plus, longest_minus) {
            (Some(plus), Some(minus)) => plus + minus <= 2.0 * self.spindle_edge,
            _ => true,
        }
    }

    /// Advances the run by one `dt`.
    ///
    /// ### Returns
    /// - [`Tick::Disassembled`] if the spindle came apart at the new time, in
    ///   which case no filament was stepped.
    /// - [`Tick::Finished`] once [`Simulation::run`] has ended the run. The
    ///   clock and the records are left untouched.
    pub fn tick(&mut self) -> Tick {
        if self.termination.is_some() {
            return Tick::Finished;
        }

        self.t += self.cfg.dt;
        self.spindle_edge += self.cfg.dt * self.cfg.v_slide;

        if self.is_disassembled() {
            return Tick::Disassembled;
        }

        if self.cfg.mode() == RescueMode::Uniform {
            self.field.recompute_uniform(&self.filaments, self.spindle_edge);
        }

        for id in 0..FILAMENT_COUNT {
            if !self.filaments[id].is_lost() {
                self.step_filament(id);
            }
        }
        Tick::Continue
    }

    /// Runs until the horizon or until the spindle disassembles, then
    /// records the final position of every surviving filament.
    ///
    /// Calling `run` again on a finished simulation does nothing and returns
    /// the same summary.
    pub fn run(&mut self) -> RunSummary {
        if let Some(termination) = self.termination {
            return self.summary(termination);
        }

        let termination = loop {
            if self.t >= HORIZON {
                break Termination::Horizon;
            }
            if self.tick() == Tick::Disassembled {
                break Termination::Disassembled;
            }
        };

        for id in 0..FILAMENT_COUNT {
            if !self.filaments[id].is_lost() {
                self.record(id, EventKind::EndOfRun);
            }
        }
        self.termination = Some(termination);

        let summary = self.summary(termination);
        info!(
            "run finished ({:?}) at t = {:.2} with {} of {} filaments",
            summary.termination, summary.time, summary.surviving, FILAMENT_COUNT
        );
        summary
    }

    fn summary(&self, termination: Termination) -> RunSummary {
        RunSummary {
            termination,
            time: self.t,
            surviving: self.surviving(),
            records: self.recorder.len(),
        }
    }

    fn step_filament(&mut self, id: FilamentId) {
        match self.filaments[id].phase {
            Phase::Growing => {
                if self.filaments[id].grow(self.cfg.dt, self.spindle_edge) {
                    trace!("t = {:.2}: filament {id} catastrophe", self.t);
                    self.record(id, EventKind::Catastrophe);
                }
            }
            Phase::Shrinking => {
                self.filaments[id].shrink();
                let query = self.field.query(
                    &self.filaments[id],
                    &self.topology,
                    self.spindle_edge,
                    self.midzone_edge,
                );
                match query {
                    RescueQuery::BeyondPole => {
                        self.lose_filament(id);
                        self.record(id, EventKind::Loss);
                    }
                    RescueQuery::Probability(p) => {
                        if p > self.rng.random::<f64>() {
                            let next = self.rng.sample(self.catastrophe);
                            self.filaments[id].rescue(next);
                            trace!("t = {:.2}: filament {id} rescued (p = {p:.4})", self.t);
                            self.record(id, EventKind::Rescue);
                        }
                    }
                }
            }
            Phase::Lost => {}
        }
    }

    /// Marks filament `id` as lost, rearranges the survivors if enabled and
    /// redistributes the rescue field over the new arrangement.
    fn lose_filament(&mut self, id: FilamentId) {
        let verbose = self.cfg.print_linkers;
        trace!("t = {:.2}: filament {id} lost", self.t);
        if verbose {
            info!(">> filament {id} lost");
        }

        self.filaments[id].mark_lost();
        self.topology.mark_lost(id);

        if self.cfg.rearranges()
            && let Some(swap) = self.topology.rearrange(id, &mut self.rng)
            && verbose
        {
            info!(
                "swapped filaments {} and {} ({:?})",
                swap.moved, swap.vacated, swap.case
            );
        }

        self.field.recompute_links(&self.topology, self.midzone_edge);
        self.log_linkers();
    }

    /// Logs the link counts and the grid cartoon when `print_linkers` is on.
    fn log_linkers(&self) {
        if self.cfg.print_linkers && self.cfg.mode() != RescueMode::Uniform {
            info!("links per filament: {:?}", self.topology.link_counts());
            info!("arrangement:\n{}", self.topology.draw_arrangement());
        }
    }

    fn record(&mut self, id: FilamentId, kind: EventKind) {
        let f = &self.filaments[id];
        self.recorder.push(Record {
            id,
            time: self.t,
            pos: f.pos,
            kind,
            orientation: f.orientation,
        });
    }
}
