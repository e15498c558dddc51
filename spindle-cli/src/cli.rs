//! Command-line arguments and their translation into a [`Config`].

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use spindle_core::Config;

/// Parameter set to start from before applying the file and flag overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Wild-type spindle, rescue distributed over filament links.
    Wt,
    /// ase1 spindle, rescue distributed along the filaments.
    Ase1,
}

impl Preset {
    fn config(self) -> Config {
        match self {
            Preset::Wt => Config::wild_type(),
            Preset::Ase1 => Config::ase1(),
        }
    }
}

/// Simulate microtubule dynamics in one mitotic spindle and print the event records.
///
/// Parameters are layered: preset, then `--config` JSON, then individual flags.
#[derive(Parser, Debug)]
#[command(name = "spindle_sim", version)]
pub struct Args {
    #[arg(long, value_enum, default_value_t = Preset::Wt)]
    pub preset: Preset,
    /// JSON object with any subset of the configuration fields.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sliding velocity (half the spindle elongation rate), µm/min.
    #[arg(long)]
    pub v_slide: Option<f64>,
    #[arg(long)]
    pub v_growth: Option<f64>,
    #[arg(long)]
    pub v_shrink: Option<f64>,
    /// Integration step, min.
    #[arg(long)]
    pub dt: Option<f64>,
    #[arg(long)]
    pub duration_n: Option<f64>,
    #[arg(long)]
    pub duration_r: Option<f64>,
    #[arg(long)]
    pub midzone_mu: Option<f64>,
    #[arg(long)]
    pub midzone_sigma: Option<f64>,
    #[arg(long)]
    pub total_rescue: Option<f64>,
    /// Beta shape for positional rescue weighting; 0 uses the neighbor table.
    #[arg(long)]
    pub alpha: Option<f64>,
    #[arg(long)]
    pub beta: Option<f64>,
    #[arg(long, value_name = "BOOL")]
    pub ase1: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub rearrange_mts: Option<bool>,
    /// Log link counts and the grid cartoon whenever a filament is lost.
    #[arg(long)]
    pub print_linkers: bool,

    /// Seed for the run's random source. A random seed is drawn and logged if omitted.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Write records to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Log run progress at info level (overridden by RUST_LOG).
    /// `--print-linkers` implies this.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Merges preset, JSON file and flags into a validated configuration.
    pub fn build_config(&self) -> Result<Config> {
        let mut cfg = self.preset.config();

        if let Some(path) = &self.config {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read config file {}", path.display()))?;
            cfg = overlay_json(cfg, &text)
                .with_context(|| format!("invalid config file {}", path.display()))?;
        }

        let scalars = [
            (&mut cfg.v_slide, self.v_slide),
            (&mut cfg.v_growth, self.v_growth),
            (&mut cfg.v_shrink, self.v_shrink),
            (&mut cfg.dt, self.dt),
            (&mut cfg.duration_n, self.duration_n),
            (&mut cfg.duration_r, self.duration_r),
            (&mut cfg.midzone_mu, self.midzone_mu),
            (&mut cfg.midzone_sigma, self.midzone_sigma),
            (&mut cfg.total_rescue, self.total_rescue),
            (&mut cfg.alpha, self.alpha),
            (&mut cfg.beta, self.beta),
        ];
        for (field, value) in scalars {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(ase1) = self.ase1 {
            cfg.ase1 = ase1;
        }
        if let Some(rearrange) = self.rearrange_mts {
            cfg.rearrange_mts = rearrange;
        }
        cfg.print_linkers |= self.print_linkers;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Log filter used when `RUST_LOG` is unset.
    ///
    /// Link diagnostics are logged at info level, so they raise the filter
    /// just like `--verbose`.
    pub fn default_log_filter(&self, cfg: &Config) -> &'static str {
        if self.verbose || cfg.print_linkers {
            "info"
        } else {
            "warn"
        }
    }
}

/// Applies the fields present in a JSON object on top of `base`.
fn overlay_json(base: Config, text: &str) -> Result<Config> {
    let overrides: Value = serde_json::from_str(text)?;
    let Value::Object(overrides) = overrides else {
        bail!("expected a JSON object");
    };

    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(overrides);
    }
    Ok(serde_json::from_value(merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("spindle_sim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_to_wild_type() {
        let cfg = parse(&[]).build_config().unwrap();
        assert_eq!(cfg, Config::wild_type());
    }

    #[test]
    fn flags_override_preset() {
        let args = parse(&[
            "--preset",
            "ase1",
            "--total-rescue",
            "70",
            "--rearrange-mts",
            "true",
            "--print-linkers",
        ]);
        let cfg = args.build_config().unwrap();

        assert!(cfg.ase1);
        assert_eq!(cfg.total_rescue, 70.0);
        assert_eq!(cfg.duration_n, 6.8);
        assert!(cfg.rearrange_mts);
        assert!(cfg.print_linkers);
    }

    #[test]
    fn link_diagnostics_raise_the_log_filter() {
        let quiet = parse(&[]);
        assert_eq!(quiet.default_log_filter(&quiet.build_config().unwrap()), "warn");

        let linkers = parse(&["--print-linkers"]);
        assert_eq!(linkers.default_log_filter(&linkers.build_config().unwrap()), "info");

        let verbose = parse(&["-v"]);
        assert_eq!(verbose.default_log_filter(&verbose.build_config().unwrap()), "info");
    }

    #[test]
    fn link_diagnostics_from_config_file_raise_the_log_filter() {
        let path = std::env::temp_dir().join(format!("spindle_sim_linkers_{}.json", std::process::id()));
        fs::write(&path, r#"{ "print_linkers": true }"#).unwrap();

        let args = parse(&["--config", path.to_str().unwrap()]);
        let cfg = args.build_config();
        fs::remove_file(&path).unwrap();

        assert_eq!(args.default_log_filter(&cfg.unwrap()), "info");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = parse(&["--dt", "0"]);
        assert!(args.build_config().is_err());
    }

    #[test]
    fn json_overlays_only_named_fields() {
        let cfg = overlay_json(Config::wild_type(), r#"{ "alpha": 4, "v_growth": 1.2 }"#).unwrap();
        assert_eq!(cfg.alpha, 4.0);
        assert_eq!(cfg.v_growth, 1.2);
        assert_eq!(cfg.duration_r, 3.17);
    }

    #[test]
    fn json_rejects_unknown_fields_and_non_objects() {
        assert!(overlay_json(Config::wild_type(), r#"{ "v_grwoth": 1.2 }"#).is_err());
        assert!(overlay_json(Config::wild_type(), "[1, 2]").is_err());
    }

    #[test]
    fn flags_win_over_config_file() {
        let path = std::env::temp_dir().join(format!("spindle_sim_cfg_{}.json", std::process::id()));
        fs::write(&path, r#"{ "total_rescue": 10.0, "v_slide": 0.5 }"#).unwrap();

        let args = parse(&[
            "--config",
            path.to_str().unwrap(),
            "--total-rescue",
            "20",
        ]);
        let cfg = args.build_config();
        fs::remove_file(&path).unwrap();

        let cfg = cfg.unwrap();
        assert_eq!(cfg.total_rescue, 20.0);
        assert_eq!(cfg.v_slide, 0.5);
    }
}
