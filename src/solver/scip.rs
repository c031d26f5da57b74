//! Adapter running the SCIP command-line shell on an LP file.

use super::{lp_format, Solution, SolveOutcome, SolveStatus, Solver, SolverOptions};
use crate::error::{OctError, Result};
use crate::model::Model;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Solves models by writing them to a scratch directory and invoking `scip`.
///
/// # Examples
///
/// ```no_run
/// use octsvm::solver::{ScipSolver, Solver, SolverOptions};
/// use std::time::Duration;
///
/// let mut solver = ScipSolver::new()
///     .with_options(SolverOptions::new().with_time_limit(Duration::from_secs(60)));
/// assert_eq!(solver.name(), "scip");
/// ```
#[derive(Debug, Clone)]
pub struct ScipSolver {
    executable: PathBuf,
    options: SolverOptions,
    work_dir: Option<PathBuf>,
}

impl Default for ScipSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScipSolver {
    /// Uses `scip` from `PATH` with no limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("scip"),
            options: SolverOptions::default(),
            work_dir: None,
        }
    }

    /// Sets the executable to run.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Sets time, gap and thread limits.
    #[must_use]
    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Keeps `model.lp` and `model.sol` in `dir` instead of a temporary
    /// directory that is removed after the solve.
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Whether the configured executable can be started.
    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    /// Interactive-shell commands for one solve.
    ///
    /// # Errors
    ///
    /// Returns an error if a path is not valid UTF-8 or contains a double
    /// quote, which the shell cannot read back.
    pub(crate) fn script(&self, lp_path: &Path, sol_path: &Path) -> Result<String> {
        let mut commands = vec![format!("read {}", quoted(lp_path)?)];
        if let Some(limit) = self.options.time_limit {
            commands.push(format!("set limits time {}", limit.as_secs_f64()));
        }
        if let Some(gap) = self.options.mip_gap {
            commands.push(format!("set limits gap {gap}"));
        }
        if let Some(threads) = self.options.threads {
            commands.push(format!("set lp threads {threads}"));
        }
        commands.push("optimize".to_string());
        commands.push(format!("write solution {}", quoted(sol_path)?));
        commands.push("quit".to_string());
        Ok(commands.join(" "))
    }

    fn run(&self, model: &Model, dir: &Path) -> Result<SolveOutcome> {
        let lp_path = dir.join("model.lp");
        let sol_path = dir.join("model.sol");
        lp_format::write_lp(model, BufWriter::new(File::create(&lp_path)?))?;

        let script = self.script(&lp_path, &sol_path)?;
        tracing::debug!(executable = %self.executable.display(), %script, "invoking scip");

        let start = Instant::now();
        let output = Command::new(&self.executable)
            .arg("-c")
            .arg(&script)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OctError::SolverNotFound(self.executable.clone()),
                _ => OctError::Io(e),
            })?;
        let elapsed = start.elapsed();

        if !output.status.success() {
            return Err(OctError::Solver(format!(
                "scip exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let sol_text = fs::read_to_string(&sol_path).unwrap_or_default();
        let parsed = parse_solution_file(&sol_text);
        let status = parsed
            .status
            .or_else(|| parse_status_from_log(&stdout))
            .ok_or_else(|| OctError::Solver("could not determine scip status".to_string()))?;

        let solution = match parsed.values {
            Some(named) => Some(assignment(model, &named)?),
            None => None,
        };

        tracing::info!(
            status = %status,
            objective = solution.as_ref().map(Solution::objective),
            elapsed_ms = elapsed.as_millis() as u64,
            "scip finished"
        );

        Ok(SolveOutcome {
            status,
            solution,
            elapsed,
        })
    }
}

impl Solver for ScipSolver {
    fn solve(&mut self, model: &Model) -> Result<SolveOutcome> {
        tracing::info!(
            model = model.name(),
            variables = model.n_variables(),
            binaries = model.n_binaries(),
            constraints = model.n_constraints(),
            "solving with scip"
        );
        match &self.work_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                self.run(model, dir)
            }
            None => {
                let dir = tempfile::tempdir()?;
                self.run(model, dir.path())
            }
        }
    }

    fn name(&self) -> &'static str {
        "scip"
    }
}

/// Contents of a `write solution` file.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ParsedSolution {
    pub(crate) status: Option<SolveStatus>,
    /// Non-zero values by variable name, `None` when no solution is available.
    pub(crate) values: Option<HashMap<String, f64>>,
}

/// Parses
///
/// ```text
/// solution status: optimal solution found
/// objective value:                              0.08016
/// w_0_0                                             0.4   (obj:0)
/// ```
///
/// Variables at zero are omitted by SCIP.
pub(crate) fn parse_solution_file(text: &str) -> ParsedSolution {
    let mut parsed = ParsedSolution::default();
    let mut values = HashMap::new();
    let mut has_solution = false;
    for line in text.lines() {
        let line = line.trim();
        if let Some(reason) = line.strip_prefix("solution status:") {
            parsed.status = parse_status(reason);
        } else if line.starts_with("objective value:") {
            has_solution = true;
        } else if line.starts_with("no solution available") {
            has_solution = false;
        } else if has_solution {
            let mut fields = line.split_whitespace();
            if let (Some(name), Some(value)) = (fields.next(), fields.next()) {
                if let Ok(value) = parse_value(value) {
                    values.insert(name.to_string(), value);
                }
            }
        }
    }
    if has_solution {
        parsed.values = Some(values);
    }
    parsed
}

fn parse_value(token: &str) -> std::result::Result<f64, std::num::ParseFloatError> {
    match token {
        "+infinity" | "infinity" => Ok(f64::INFINITY),
        "-infinity" => Ok(f64::NEG_INFINITY),
        _ => token.parse(),
    }
}

/// `path` in double quotes, so that spaces survive the shell's tokenizer.
fn quoted(path: &Path) -> Result<String> {
    match path.to_str() {
        Some(s) if !s.contains('"') => Ok(format!("\"{s}\"")),
        _ => Err(OctError::validation(format!(
            "scip cannot read path {}",
            path.display()
        ))),
    }
}

/// Finds `SCIP Status : ... [reason]` in the shell log.
pub(crate) fn parse_status_from_log(log: &str) -> Option<SolveStatus> {
    log.lines()
        .filter(|l| l.trim_start().starts_with("SCIP Status"))
        .filter_map(|l| {
            let open = l.find('[')?;
            let close = l.rfind(']')?;
            parse_status(&l[open + 1..close])
        })
        .last()
}

/// Maps a SCIP status reason to a [`SolveStatus`].
pub(crate) fn parse_status(reason: &str) -> Option<SolveStatus> {
    let reason = reason.trim().to_ascii_lowercase();
    let status = if reason.starts_with("optimal") {
        SolveStatus::Optimal
    } else if reason.contains("gap limit") {
        SolveStatus::GapLimitReached
    } else if reason.contains("infeasible or unbounded") {
        SolveStatus::InfeasibleOrUnbounded
    } else if reason.starts_with("infeasible") {
        SolveStatus::Infeasible
    } else if reason.starts_with("unbounded") {
        SolveStatus::Unbounded
    } else if reason.contains("time limit") {
        SolveStatus::TimeLimitReached
    } else if reason.contains("limit") || reason.contains("interrupt") {
        SolveStatus::Interrupted
    } else {
        return None;
    };
    Some(status)
}

/// Dense assignment from named non-zero values.
fn assignment(model: &Model, named: &HashMap<String, f64>) -> Result<Solution> {
    let index: HashMap<&str, usize> = model
        .variables()
        .iter()
        .enumerate()
        .map(|(k, v)| (v.name.as_str(), k))
        .collect();
    let mut values = vec![0.0; model.n_variables()];
    for (name, &value) in named {
        match index.get(name.as_str()) {
            Some(&k) => values[k] = value,
            None => {
                return Err(OctError::Solver(format!(
                    "solution mentions unknown variable {name}"
                )))
            }
        }
    }
    Solution::new(model, values)
}
