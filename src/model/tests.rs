//! Tests for the model container and expressions.

use super::*;

fn two_var_model() -> (Model, VarId, VarId) {
    let mut model = Model::new("toy");
    let x = model.add_variable(Variable::free("x"));
    let y = model.add_variable(Variable::binary("y"));
    (model, x, y)
}

#[test]
fn test_variable_ids_are_dense() {
    let (mut model, x, y) = two_var_model();
    let z = model.add_variable(Variable::non_negative("z"));
    assert_eq!(x.index(), 0);
    assert_eq!(y.index(), 1);
    assert_eq!(z.index(), 2);
    assert_eq!(model.variable(z).name, "z");
}

#[test]
fn test_variable_domains() {
    let free = Variable::free("w");
    assert!(free.is_free());
    assert_eq!(free.kind, VarKind::Continuous);

    let nn = Variable::non_negative("e");
    assert!(!nn.is_free());
    assert_eq!(nn.lower, 0.0);
    assert!(nn.upper.is_infinite());

    let bin = Variable::binary("z");
    assert_eq!(bin.kind, VarKind::Binary);
    assert_eq!((bin.lower, bin.upper), (0.0, 1.0));
}

#[test]
fn test_domain_violation() {
    let nn = Variable::non_negative("e");
    assert_eq!(nn.domain_violation(2.0), 0.0);
    assert!((nn.domain_violation(-0.5) - 0.5).abs() < 1e-12);

    let bin = Variable::binary("z");
    assert_eq!(bin.domain_violation(1.0), 0.0);
    assert!((bin.domain_violation(0.4) - 0.4).abs() < 1e-12);
    assert!((bin.domain_violation(1.5) - 0.5).abs() < 1e-12);
}

#[test]
fn test_linear_expr_drops_zero_terms() {
    let (_, x, y) = two_var_model();
    let expr = LinearExpr::new().term(x, 0.0).term(y, 3.0).plus(1.5);
    assert_eq!(expr.terms(), &[(y, 3.0)]);
    assert_eq!(expr.constant(), 1.5);
}

#[test]
fn test_linear_expr_compact_merges_repeats() {
    let (_, x, y) = two_var_model();
    let expr = LinearExpr::new()
        .term(x, 1.0)
        .term(y, 2.0)
        .term(x, -1.0)
        .term(y, 1.0);
    let compact = expr.compact();
    assert_eq!(compact.terms(), &[(y, 3.0)]);
}

#[test]
fn test_linear_expr_add_scaled() {
    let (_, x, y) = two_var_model();
    let mut expr = LinearExpr::from(x);
    expr.add_scaled(&LinearExpr::new().term(y, 2.0).plus(1.0), -3.0);
    assert_eq!(expr.terms(), &[(x, 1.0), (y, -6.0)]);
    assert_eq!(expr.constant(), -3.0);
}

#[test]
fn test_linear_expr_evaluate() {
    let (_, x, y) = two_var_model();
    let expr = LinearExpr::new().term(x, 2.0).term(y, -1.0).plus(0.5);
    assert!((expr.evaluate(&[3.0, 1.0]) - 5.5).abs() < 1e-12);
}

#[test]
fn test_quadratic_constraint_violation() {
    let (mut model, x, y) = two_var_model();
    let idx = model.add_constraint(Constraint::quadratic(
        "norm",
        vec![QuadTerm::square(x, 1.0)],
        LinearExpr::new().term(y, -2.0),
        Sense::LessEqual,
        0.0,
    ));
    let c = &model.constraints()[idx];
    assert!(c.is_quadratic());
    // x = 1, y = 1: 1 - 2 <= 0
    assert_eq!(c.violation(&[1.0, 1.0]), 0.0);
    // x = 2, y = 1: 4 - 2 = 2 > 0
    assert!((c.violation(&[2.0, 1.0]) - 2.0).abs() < 1e-12);
}

#[test]
fn test_equality_violation_is_absolute() {
    let (_, x, _) = two_var_model();
    let c = Constraint::linear("fix", LinearExpr::from(x), Sense::Equal, 1.0);
    assert!((c.violation(&[0.25, 0.0]) - 0.75).abs() < 1e-12);
    assert!((c.violation(&[1.5, 0.0]) - 0.5).abs() < 1e-12);
}

#[test]
fn test_model_counts_and_lookup() {
    let (mut model, x, y) = two_var_model();
    model.add_constraint(Constraint::linear(
        "c0",
        LinearExpr::new().term(x, 1.0).term(y, 1.0),
        Sense::GreaterEqual,
        1.0,
    ));
    model.set_objective(LinearExpr::new().term(x, 1.0));

    assert_eq!(model.name(), "toy");
    assert_eq!(model.n_variables(), 2);
    assert_eq!(model.n_binaries(), 1);
    assert_eq!(model.n_constraints(), 1);
    assert_eq!(model.n_quadratic_constraints(), 0);
    assert_eq!(model.find_variable("y"), Some(y));
    assert_eq!(model.find_variable("nope"), None);
    assert!((model.objective_value(&[4.0, 0.0]) - 4.0).abs() < 1e-12);
}

#[test]
fn test_sense_as_str() {
    assert_eq!(Sense::LessEqual.as_str(), "<=");
    assert_eq!(Sense::GreaterEqual.as_str(), ">=");
    assert_eq!(Sense::Equal.as_str(), "=");
}
