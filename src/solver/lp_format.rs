//! CPLEX LP file writer.
//!
//! Quadratic constraint terms are written inside `[ ... ]` without the
//! `/2` factor the format only applies to objectives. Constants on the
//! left-hand side are moved to the right-hand side; an objective constant
//! is dropped since it does not change the optimizer.

use crate::model::{Constraint, LinearExpr, Model, QuadTerm, VarKind};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Terms per output line; the format allows continuation lines.
const TERMS_PER_LINE: usize = 8;

/// Renders `model` as an LP document.
#[must_use]
pub fn to_lp_string(model: &Model) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\\ Model {}", model.name());
    out.push_str("Minimize\n obj:");
    let objective = model.objective().compact();
    if objective.is_constant() {
        // an empty objective still needs one term
        match model.variables().first() {
            Some(v) => {
                let _ = write!(out, " 0 {}", v.name);
            }
            None => out.push_str(" 0"),
        }
    } else {
        push_linear(&mut out, model, &objective);
    }
    out.push_str("\nSubject To\n");

    for constraint in model.constraints() {
        push_constraint(&mut out, model, constraint);
    }

    let mut bounds = String::new();
    for v in model.variables() {
        if v.kind == VarKind::Binary {
            continue;
        }
        if v.is_free() {
            let _ = writeln!(bounds, " {} free", v.name);
        } else if v.lower != 0.0 || v.upper != f64::INFINITY {
            let _ = writeln!(
                bounds,
                " {} <= {} <= {}",
                format_bound(v.lower),
                v.name,
                format_bound(v.upper)
            );
        }
    }
    if !bounds.is_empty() {
        out.push_str("Bounds\n");
        out.push_str(&bounds);
    }

    let binaries: Vec<&str> = model
        .variables()
        .iter()
        .filter(|v| v.kind == VarKind::Binary)
        .map(|v| v.name.as_str())
        .collect();
    if !binaries.is_empty() {
        out.push_str("Binaries\n");
        for chunk in binaries.chunks(TERMS_PER_LINE) {
            let _ = writeln!(out, " {}", chunk.join(" "));
        }
    }
    out.push_str("End\n");
    out
}

/// Writes `model` as an LP document to `writer`.
///
/// # Errors
///
/// Returns any error of the underlying writer.
pub fn write_lp<W: Write>(model: &Model, mut writer: W) -> io::Result<()> {
    writer.write_all(to_lp_string(model).as_bytes())?;
    writer.flush()
}

fn push_constraint(out: &mut String, model: &Model, constraint: &Constraint) {
    let linear = constraint.linear.compact();
    if linear.is_constant() && constraint.quadratic.is_empty() {
        tracing::warn!(name = %constraint.name, "skipping constraint without variables");
        return;
    }
    let _ = write!(out, " {}:", constraint.name);
    push_linear(out, model, &linear);
    if !constraint.quadratic.is_empty() {
        out.push_str(if linear.is_constant() { " [" } else { " + [" });
        push_quadratic(out, model, &constraint.quadratic);
        out.push_str(" ]");
    }
    let rhs = constraint.rhs - linear.constant();
    let _ = writeln!(out, " {} {}", constraint.sense.as_str(), format_number(rhs));
}

fn push_linear(out: &mut String, model: &Model, expr: &LinearExpr) {
    for (k, &(var, coef)) in expr.terms().iter().enumerate() {
        if k > 0 && k % TERMS_PER_LINE == 0 {
            out.push_str("\n  ");
        }
        let _ = write!(
            out,
            " {} {}",
            format_signed(coef),
            model.variable(var).name
        );
    }
}

fn push_quadratic(out: &mut String, model: &Model, terms: &[QuadTerm]) {
    for (k, term) in terms.iter().enumerate() {
        if k > 0 && k % TERMS_PER_LINE == 0 {
            out.push_str("\n  ");
        }
        let coef = if k == 0 && term.coef > 0.0 {
            format_number(term.coef)
        } else {
            format_signed(term.coef)
        };
        let a = &model.variable(term.a).name;
        if term.is_square() {
            let _ = write!(out, " {coef} {a} ^ 2");
        } else {
            let b = &model.variable(term.b).name;
            let _ = write!(out, " {coef} {a} * {b}");
        }
    }
}

fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

fn format_signed(value: f64) -> String {
    if value < 0.0 {
        format!("- {}", format_number(-value))
    } else {
        format!("+ {}", format_number(value))
    }
}

fn format_bound(value: f64) -> String {
    if value == f64::INFINITY {
        "+inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format_number(value)
    }
}
