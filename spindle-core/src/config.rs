use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Scalar parameters of one spindle run.
///
/// All magnitudes are in minutes and micrometers. A `Config` is validated
/// once by [`Config::validate`] and then treated as immutable for the run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Sliding velocity of antiparallel filaments (half the spindle elongation rate).
    pub v_slide: f64,
    pub v_growth: f64,
    pub v_shrink: f64,
    pub dt: f64,
    /// Shape `n` of the growth-duration distribution `(1 - e^{-r t})^n`.
    pub duration_n: f64,
    /// Rate `r` of the growth-duration distribution.
    pub duration_r: f64,
    /// Mean and spread of the normal distribution the midzone edge is drawn from.
    pub midzone_mu: f64,
    pub midzone_sigma: f64,
    /// Rescue budget, spread over links (wild type) or over polymer length (ase1).
    pub total_rescue: f64,
    /// Beta-distribution shape for positional rescue weighting; `0` selects the neighbor table.
    pub alpha: f64,
    pub beta: f64,
    /// Spread rescue uniformly along filaments instead of over inter-filament links.
    pub ase1: bool,
    /// Reposition surviving filaments when one is lost. Ignored in ase1 mode.
    pub rearrange_mts: bool,
    /// Log link counts and the grid cartoon on every loss.
    pub print_linkers: bool,
}

/// How the rescue field is computed, derived from the mode flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RescueMode {
    /// ase1: one probability for every filament, recomputed every tick.
    Uniform,
    /// Wild type with `alpha == 0`: probability looked up by neighbor count.
    NeighborTable,
    /// Wild type with `alpha != 0`: per-filament rate weighted by a beta density.
    Positional,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            v_slide: 0.0,
            v_growth: 0.0,
            v_shrink: 0.0,
            dt: 0.0,
            duration_n: 0.0,
            duration_r: 0.0,
            midzone_mu: 0.0,
            midzone_sigma: 0.0,
            total_rescue: 0.0,
            alpha: 0.0,
            beta: 2.0,
            ase1: false,
            rearrange_mts: false,
            print_linkers: false,
        }
    }
}

impl Config {
    /// Wild-type spindle with the fitted growth and midzone parameters.
    pub fn wild_type() -> Self {
        Self {
            v_slide: 0.35,
            v_growth: 1.6,
            v_shrink: 3.6,
            dt: 0.01,
            duration_n: 8.53,
            duration_r: 3.17,
            midzone_mu: 1.23,
            midzone_sigma: 0.25,
            total_rescue: 55.0,
            rearrange_mts: true,
            ..Self::default()
        }
    }

    /// ase1 spindle: rescue spread along the filaments, no rearrangement.
    pub fn ase1() -> Self {
        Self {
            duration_n: 6.8,
            duration_r: 2.5,
            total_rescue: 34.0,
            ase1: true,
            rearrange_mts: false,
            ..Self::wild_type()
        }
    }

    pub fn mode(&self) -> RescueMode {
        if self.ase1 {
            RescueMode::Uniform
        } else if self.alpha == 0.0 {
            RescueMode::NeighborTable
        } else {
            RescueMode::Positional
        }
    }

    /// Whether a loss triggers the rearrangement heuristic.
    pub fn rearranges(&self) -> bool {
        self.rearrange_mts && !self.ase1
    }

    /// Checks every constraint a run relies on.
    ///
    /// ### Returns
    /// - `Ok(())` if the configuration can drive a run.
    /// - `Err` naming the first offending parameter otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("v_slide", self.v_slide),
            ("v_growth", self.v_growth),
            ("v_shrink", self.v_shrink),
            ("dt", self.dt),
            ("duration_n", self.duration_n),
            ("duration_r", self.duration_r),
            ("midzone_mu", self.midzone_mu),
            ("midzone_sigma", self.midzone_sigma),
            ("total_rescue", self.total_rescue),
            ("alpha", self.alpha),
            ("beta", self.beta),
        ];
        if let Some(&(name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NotFinite { name });
        }

        for (name, value) in [
            ("dt", self.dt),
            ("duration_n", self.duration_n),
            ("duration_r", self.duration_r),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        for (name, value) in [
            ("v_growth", self.v_growth),
            ("v_shrink", self.v_shrink),
            ("midzone_sigma", self.midzone_sigma),
            ("total_rescue", self.total_rescue),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }

        if self.alpha < 0.0 {
            return Err(ConfigError::NegativeAlpha(self.alpha));
        }
        if self.alpha > 0.0 && self.beta <= 0.0 {
            return Err(ConfigError::InvalidBetaShape {
                alpha: self.alpha,
                beta: self.beta,
                reason: "beta must be strictly positive".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert_eq!(Config::wild_type().validate(), Ok(()));
        assert_eq!(Config::ase1().validate(), Ok(()));
    }

    #[test]
    fn default_is_rejected_because_dt_is_zero() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositive {
                name: "dt",
                value: 0.0
            }
        );
    }

    #[test]
    fn non_positive_duration_parameters_fail_fast() {
        let mut cfg = Config::wild_type();
        cfg.duration_n = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { name: "duration_n", .. })
        ));

        let mut cfg = Config::wild_type();
        cfg.duration_r = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { name: "duration_r", .. })
        ));
    }

    #[test]
    fn negative_velocities_and_nan_are_rejected() {
        let mut cfg = Config::wild_type();
        cfg.v_shrink = -0.1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Negative { name: "v_shrink", .. })
        ));

        let mut cfg = Config::wild_type();
        cfg.midzone_mu = f64::NAN;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NotFinite { name: "midzone_mu" })
        );
    }

    #[test]
    fn beta_shape_is_checked_only_when_weighting_is_on() {
        let mut cfg = Config::wild_type();
        cfg.beta = 0.0;
        assert_eq!(cfg.validate(), Ok(()), "beta is unused while alpha == 0");

        cfg.alpha = 4.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBetaShape { .. })
        ));

        cfg.alpha = -1.0;
        assert_eq!(cfg.validate(), Err(ConfigError::NegativeAlpha(-1.0)));
    }

    #[test]
    fn mode_follows_flags() {
        let mut cfg = Config::wild_type();
        assert_eq!(cfg.mode(), RescueMode::NeighborTable);
        cfg.alpha = 8.0;
        assert_eq!(cfg.mode(), RescueMode::Positional);
        cfg.ase1 = true;
        assert_eq!(cfg.mode(), RescueMode::Uniform);
    }

    #[test]
    fn rearrangement_is_ignored_in_ase1_mode() {
        let mut cfg = Config::ase1();
        cfg.rearrange_mts = true;
        assert!(!cfg.rearranges());
        assert!(Config::wild_type().rearranges());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "dt": 0.05, "ase1": true }"#).unwrap();
        assert_eq!(cfg.dt, 0.05);
        assert!(cfg.ase1);
        assert_eq!(cfg.beta, 2.0);
        assert_eq!(cfg.total_rescue, 0.0);
    }

    #[test]
    fn misspelled_json_field_is_an_error() {
        let res: Result<Config, _> = serde_json::from_str(r#"{ "v_grwoth": 1.0 }"#);
        assert!(res.is_err());
    }
}
