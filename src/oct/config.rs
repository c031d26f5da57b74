//! Hyperparameters of the formulation.

use crate::error::{OctError, Result};
use crate::tree::TreeTopology;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How `beta_{i,t,j} = w_{t,j} · xi_{i,t}` is handed to the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BilinearEncoding {
    /// Four big-M inequalities per product; exact while `|w_{t,j}| <= M`.
    #[default]
    McCormick,
    /// One non-convex bilinear equality per product, for solvers that
    /// accept products of variables in constraints.
    Product,
}

/// Configuration of an OCT-SVM model build.
///
/// # Examples
///
/// ```
/// use octsvm::oct::{BilinearEncoding, OctSvmConfig};
///
/// let config = OctSvmConfig::new()
///     .with_depth(1)
///     .with_penalties(0.1, 0.1, 0.1)
///     .with_big_m(100.0)
///     .with_bilinear(BilinearEncoding::McCormick);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctSvmConfig {
    /// Tree depth `D`; the tree has `D + 1` layers.
    pub depth: usize,
    /// `c1`, weight of the total slack.
    pub slack_penalty: f64,
    /// `c2`, weight of the total gating activations.
    pub gating_penalty: f64,
    /// `c3`, weight of the node complexity indicators.
    pub complexity_penalty: f64,
    /// Big-M constant. Must dominate `|w_t · x_i|`, every `|w_{t,j}|` and
    /// every `‖w_t‖²` at the optimum, otherwise the gated constraints are
    /// silently weakened.
    pub big_m: f64,
    /// Append a constant feature so each node learns `w·x + b`.
    pub fit_intercept: bool,
    /// Encoding of the weight·gate products.
    pub bilinear: BilinearEncoding,
}

impl Default for OctSvmConfig {
    fn default() -> Self {
        Self {
            depth: 2,
            slack_penalty: 0.1,
            gating_penalty: 0.1,
            complexity_penalty: 0.1,
            big_m: 100_000.0,
            fit_intercept: true,
            bilinear: BilinearEncoding::McCormick,
        }
    }
}

impl OctSvmConfig {
    /// Creates a configuration with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tree depth.
    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets `c1`, `c2` and `c3` at once.
    #[must_use]
    pub fn with_penalties(mut self, slack: f64, gating: f64, complexity: f64) -> Self {
        self.slack_penalty = slack;
        self.gating_penalty = gating;
        self.complexity_penalty = complexity;
        self
    }

    /// Sets the big-M constant.
    #[must_use]
    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    /// Enables or disables the intercept column.
    #[must_use]
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Sets the bilinear product encoding.
    #[must_use]
    pub fn with_bilinear(mut self, bilinear: BilinearEncoding) -> Self {
        self.bilinear = bilinear;
        self
    }

    /// Topology implied by [`OctSvmConfig::depth`].
    ///
    /// # Errors
    ///
    /// Returns an error if the depth is out of range.
    pub fn topology(&self) -> Result<TreeTopology> {
        TreeTopology::new(self.depth)
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`OctError::InvalidHyperparameter`] for the first bad value.
    pub fn validate(&self) -> Result<()> {
        self.topology()?;
        for (param, value) in [
            ("slack_penalty", self.slack_penalty),
            ("gating_penalty", self.gating_penalty),
            ("complexity_penalty", self.complexity_penalty),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OctError::invalid_hyperparameter(param, value, "finite and >= 0"));
            }
        }
        if !self.big_m.is_finite() || self.big_m <= 0.0 {
            return Err(OctError::invalid_hyperparameter(
                "big_m",
                self.big_m,
                "finite and > 0",
            ));
        }
        Ok(())
    }

    /// Saves the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads and validates a configuration from JSON. Missing fields take
    /// their default value.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, parsing or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
