//! Rescue probability field.
//!
//! The field turns the global rescue budget into a per-step rescue
//! probability for each shrinking filament. How it is distributed depends on
//! the [`RescueMode`]:
//!
//! - [`RescueMode::Uniform`] (ase1) - the budget is spread along the total
//!   polymer length, giving one probability for every filament. It changes
//!   with the filament lengths and is recomputed every tick.
//! - [`RescueMode::NeighborTable`] (wild type) - the budget is spread over the
//!   links between neighboring filaments inside the midzone. A filament's
//!   probability depends on how many neighbors it has.
//! - [`RescueMode::Positional`] (wild type, `alpha != 0`) - as above, but the
//!   per-filament rate is additionally weighted by a beta density over the
//!   filament's position within the midzone.
//!
//! Wild-type fields only change when a filament is lost.

use statrs::distribution::{Beta, Continuous};

use crate::config::{Config, RescueMode};
use crate::error::ConfigError;
use crate::filament::Filament;
use crate::topology::{MAX_NEIGHBORS, Topology};
use crate::types::FILAMENT_COUNT;

/// Result of asking the field about one shrinking filament.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RescueQuery {
    /// The filament has depolymerized past its pole and is lost.
    BeyondPole,
    /// Probability of rescue during this step.
    Probability(f64),
}

/// Converts a rate into the probability of at least one event during `dt`.
#[inline]
fn rate_to_probability(rate: f64, dt: f64) -> f64 {
    1.0 - (-rate * dt).exp()
}

#[derive(Clone, Debug)]
pub struct RescueField {
    mode: RescueMode,
    dt: f64,
    total_rescue: f64,
    /// ase1 probability, shared by all filaments.
    uniform: f64,
    /// Wild-type probability indexed by neighbor count.
    table: [f64; MAX_NEIGHBORS + 1],
    /// Wild-type rate per filament id, before positional weighting.
    rates: [f64; FILAMENT_COUNT],
    density: Option<Beta>,
}

impl RescueField {
    /// Builds an empty field for the configured mode.
    ///
    /// All probabilities start at zero; the engine fills them with
    /// [`RescueField::recompute_links`] or [`RescueField::recompute_uniform`].
    ///
    /// ### Returns
    /// - `Err(ConfigError::InvalidBetaShape)` if positional weighting is on
    ///   and the beta density rejects `(alpha, beta)`.
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        let mode = cfg.mode();
        let density = match mode {
            RescueMode::Positional => Some(Beta::new(cfg.alpha, cfg.beta).map_err(|err| {
                ConfigError::InvalidBetaShape {
                    alpha: cfg.alpha,
                    beta: cfg.beta,
                    reason: err.to_string(),
                }
            })?),
            RescueMode::Uniform | RescueMode::NeighborTable => None,
        };

        Ok(Self {
            mode,
            dt: cfg.dt,
            total_rescue: cfg.total_rescue,
            uniform: 0.0,
            table: [0.0; MAX_NEIGHBORS + 1],
            rates: [0.0; FILAMENT_COUNT],
            density,
        })
    }

    pub fn mode(&self) -> RescueMode {
        self.mode
    }

    pub fn uniform(&self) -> f64 {
        self.uniform
    }

    pub fn table(&self) -> &[f64; MAX_NEIGHBORS + 1] {
        &self.table
    }

    pub fn rates(&self) -> &[f64; FILAMENT_COUNT] {
        &self.rates
    }

    /// Redistributes the rescue budget over the links of the current
    /// arrangement (wild type only; a no-op in ase1 mode).
    ///
    /// The budget is spread homogeneously over the midzone, which spans
    /// `2 * midzone_edge`, and then evenly over the links. When no links are
    /// left the field is kept as it was.
    pub fn recompute_links(&mut self, topology: &Topology, midzone_edge: f64) {
        if self.mode == RescueMode::Uniform {
            return;
        }

        let total_links = topology.total_links();
        if total_links == 0 {
            return;
        }
        let rate_per_link = self.total_rescue / midzone_edge / 2.0 / total_links as f64;

        match self.mode {
            RescueMode::NeighborTable => {
                for (k, p) in self.table.iter_mut().enumerate() {
                    *p = rate_to_probability(rate_per_link * k as f64, self.dt);
                }
            }
            RescueMode::Positional => {
                let links = topology.link_counts();
                for (rate, &k) in self.rates.iter_mut().zip(links.iter()) {
                    *rate = rate_per_link * k as f64;
                }
            }
            RescueMode::Uniform => {}
        }
    }

    /// Spreads the rescue budget along the total length of the active
    /// filaments (ase1 only).
    pub fn recompute_uniform(&mut self, filaments: &[Filament], spindle_edge: f64) {
        let total_length: f64 = filaments
            .iter()
            .filter(|f| !f.is_lost())
            .map(|f| f.length(spindle_edge))
            .sum();

        if total_length <= 0.0 {
            return;
        }
        // Half the budget per unit of polymer length.
        self.uniform = rate_to_probability(self.total_rescue / total_length / 2.0, self.dt);
    }

    /// Rescue probability for a shrinking filament at its current position.
    ///
    /// ### Parameters
    /// - `filament` - The shrinking filament, already moved for this step.
    /// - `topology` - Current arrangement, used for the neighbor count.
    /// - `spindle_edge` - Current pole position.
    /// - `midzone_edge` - Half-width of the midzone for this run.
    ///
    /// ### Returns
    /// [`RescueQuery::BeyondPole`] if the plus end passed the pole, otherwise
    /// the rescue probability for this step (zero outside the midzone in
    /// wild type).
    pub fn query(
        &self,
        filament: &Filament,
        topology: &Topology,
        spindle_edge: f64,
        midzone_edge: f64,
    ) -> RescueQuery {
        if filament.lead() < -spindle_edge {
            return RescueQuery::BeyondPole;
        }

        if self.mode == RescueMode::Uniform {
            return RescueQuery::Probability(self.uniform);
        }

        if filament.pos.abs() >= midzone_edge {
            return RescueQuery::Probability(0.0);
        }

        let p = match &self.density {
            None => {
                let k = topology.neighbor_count(filament.id).min(MAX_NEIGHBORS);
                self.table[k]
            }
            Some(density) => {
                // Map (-midzone_edge, midzone_edge) onto (0, 1).
                let x = (filament.lead() + midzone_edge) / (2.0 * midzone_edge);
                let rate = self.rates[filament.id] * density.pdf(x);
                rate_to_probability(rate, self.dt)
            }
        };
        RescueQuery::Probability(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filament::Phase;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn filaments(cfg: &Config) -> Vec<Filament> {
        (0..FILAMENT_COUNT).map(|id| Filament::new(id, cfg, 1.0)).collect()
    }

    fn probability(query: RescueQuery) -> f64 {
        match query {
            RescueQuery::Probability(p) => p,
            RescueQuery::BeyondPole => panic!("unexpected loss"),
        }
    }

    #[test]
    fn neighbor_table_matches_rate_per_link() {
        let cfg = Config::wild_type();
        let mut field = RescueField::new(&cfg).unwrap();
        let topology = Topology::new();

        field.recompute_links(&topology, 1.2);

        // Full grid has 12 links.
        let rate_per_link = 55.0 / 1.2 / 2.0 / 12.0;
        for (k, &p) in field.table().iter().enumerate() {
            assert!(approx(p, 1.0 - (-rate_per_link * 0.01 * k as f64).exp()));
        }
        assert_eq!(field.table()[0], 0.0);
    }

    #[test]
    fn neighbor_table_is_non_decreasing() {
        let cfg = Config::wild_type();
        let mut field = RescueField::new(&cfg).unwrap();
        let mut topology = Topology::new();
        topology.mark_lost(4);
        field.recompute_links(&topology, 0.9);

        assert!(field.table().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut cfg = Config::wild_type();
        cfg.alpha = 4.0;
        let mut field = RescueField::new(&cfg).unwrap();
        let mut topology = Topology::new();
        topology.mark_lost(2);

        field.recompute_links(&topology, 1.1);
        let first = *field.rates();
        field.recompute_links(&topology, 1.1);

        assert_eq!(first, *field.rates());
    }

    #[test]
    fn neighbor_table_recompute_is_idempotent() {
        let cfg = Config::wild_type();
        let mut field = RescueField::new(&cfg).unwrap();
        let mut topology = Topology::new();
        topology.mark_lost(7);

        field.recompute_links(&topology, 1.1);
        let first = *field.table();
        field.recompute_links(&topology, 1.1);

        assert_eq!(first, *field.table());
    }

    #[test]
    fn uniform_recompute_is_idempotent() {
        let cfg = Config::ase1();
        let mut field = RescueField::new(&cfg).unwrap();
        let mut fs = filaments(&cfg);
        fs[2].pos = 0.4;
        fs[5].mark_lost();

        field.recompute_uniform(&fs, 2.3);
        let first = field.uniform();
        field.recompute_uniform(&fs, 2.3);

        assert!(first > 0.0);
        assert_eq!(first, field.uniform());
    }

    #[test]
    fn no_links_leaves_field_unchanged() {
        let cfg = Config::wild_type();
        let mut field = RescueField::new(&cfg).unwrap();
        let mut topology = Topology::new();
        field.recompute_links(&topology, 1.0);
        let before = *field.table();

        for id in 0..FILAMENT_COUNT {
            topology.mark_lost(id);
        }
        field.recompute_links(&topology, 1.0);

        assert_eq!(before, *field.table());
        assert!(field.table().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn positional_rates_scale_with_link_count() {
        let mut cfg = Config::wild_type();
        cfg.alpha = 8.0;
        let mut field = RescueField::new(&cfg).unwrap();
        let topology = Topology::new();
        field.recompute_links(&topology, 1.0);

        let rate_per_link = 55.0 / 1.0 / 2.0 / 12.0;
        assert!(approx(field.rates()[4], 4.0 * rate_per_link));
        assert!(approx(field.rates()[0], 2.0 * rate_per_link));
    }

    #[test]
    fn query_reports_loss_past_the_pole() {
        let cfg = Config::wild_type();
        let field = RescueField::new(&cfg).unwrap();
        let mut f = Filament::new(1, &cfg, 1.0);
        f.phase = Phase::Shrinking;
        f.pos = 2.01;

        assert_eq!(
            field.query(&f, &Topology::new(), 2.0, 1.0),
            RescueQuery::BeyondPole
        );
    }

    #[test]
    fn query_is_zero_outside_midzone_in_wild_type() {
        let cfg = Config::wild_type();
        let mut field = RescueField::new(&cfg).unwrap();
        let topology = Topology::new();
        field.recompute_links(&topology, 1.0);

        let mut f = Filament::new(4, &cfg, 1.0);
        f.pos = 1.5;
        assert_eq!(probability(field.query(&f, &topology, 3.0, 1.0)), 0.0);

        f.pos = 0.5;
        assert!(approx(
            probability(field.query(&f, &topology, 3.0, 1.0)),
            field.table()[4]
        ));
    }

    #[test]
    fn positional_query_uses_beta_density() {
        let mut cfg = Config::wild_type();
        cfg.alpha = 2.0;
        cfg.beta = 2.0;
        let mut field = RescueField::new(&cfg).unwrap();
        let topology = Topology::new();
        field.recompute_links(&topology, 1.0);

        // Midzone center maps to x = 0.5, where Beta(2, 2) has density 1.5.
        let mut f = Filament::new(4, &cfg, 1.0);
        f.pos = 0.0;
        let expected = 1.0 - (-field.rates()[4] * 1.5 * cfg.dt).exp();
        assert!((probability(field.query(&f, &topology, 3.0, 1.0)) - expected).abs() < 1e-9);
    }

    #[test]
    fn uniform_field_spreads_over_total_length() {
        let cfg = Config::ase1();
        let mut field = RescueField::new(&cfg).unwrap();
        let fs = filaments(&cfg);

        field.recompute_uniform(&fs, 2.0);

        // Nine filaments of length 1 + 2.
        let expected = 1.0 - (-34.0 / 27.0 / 2.0 * 0.01_f64).exp();
        assert!(approx(field.uniform(), expected));

        let mut far = fs[3].clone();
        far.pos = 1.9;
        assert!(approx(
            probability(field.query(&far, &Topology::new(), 2.0, 0.1)),
            expected
        ));
    }

    #[test]
    fn uniform_mode_ignores_link_recompute() {
        let cfg = Config::ase1();
        let mut field = RescueField::new(&cfg).unwrap();
        field.recompute_links(&Topology::new(), 1.0);
        assert_eq!(*field.table(), [0.0; MAX_NEIGHBORS + 1]);
    }
}
