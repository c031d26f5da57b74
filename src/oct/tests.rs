use super::*;
use crate::model::Sense;
use crate::solver::SolveOutcome;
use crate::verify::{check_oct, DEFAULT_TOLERANCE};

fn separable_data() -> Dataset {
    Dataset::from_rows(
        &[[0.0, 0.0], [0.0, 1.0], [5.0, 0.0], [5.0, 1.0]],
        &[-1.0, -1.0, 1.0, 1.0],
    )
    .expect("valid data")
}

fn separable_config() -> OctSvmConfig {
    OctSvmConfig::new()
        .with_depth(1)
        .with_penalties(0.1, 0.1, 0.1)
        .with_big_m(100.0)
}

fn known_optimum() -> SvmTree {
    SvmTree::new(
        TreeTopology::new(1).expect("depth 1"),
        vec![
            NodeHyperplane::new(vec![0.4, 0.0], -1.0),
            NodeHyperplane::new(vec![0.0, 0.0], -1.0),
            NodeHyperplane::new(vec![0.0, 0.0], 1.0),
        ],
    )
    .expect("three nodes")
}

/// Replays a fixed assignment.
struct FixedSolver {
    status: SolveStatus,
    values: Option<Vec<f64>>,
}

impl Solver for FixedSolver {
    fn solve(&mut self, model: &Model) -> Result<SolveOutcome> {
        let solution = match self.values.take() {
            Some(values) => Some(Solution::new(model, values)?),
            None => None,
        };
        Ok(SolveOutcome {
            status: self.status,
            solution,
            elapsed: Duration::ZERO,
        })
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

// ========================================================================
// Shape
// ========================================================================

#[test]
fn test_family_counts() {
    // N = 4, T = 3, P' = 3 (two features plus intercept), D + 1 = 2 layers
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let stats = oct.stats();
    let count = |f| stats.by_family.get(&f).copied().unwrap_or(0);
    assert_eq!(count(ConstraintFamily::MarginBound), 3);
    assert_eq!(count(ConstraintFamily::ComplexityMonotonicity), 2);
    assert_eq!(count(ConstraintFamily::NormComplexityLink), 3);
    assert_eq!(count(ConstraintFamily::GatedMargin), 12);
    assert_eq!(count(ConstraintFamily::BilinearLinearization), 4 * 4 * 3 * 3);
    assert_eq!(count(ConstraintFamily::RoutingMonotonicity), 8);
    assert_eq!(count(ConstraintFamily::SignDetection), 24);
    assert_eq!(count(ConstraintFamily::BranchInheritance), 8);
    assert_eq!(count(ConstraintFamily::LayerPartition), 8);
    assert_eq!(stats.n_constraints, 212);
    assert_eq!(stats.n_quadratic, 6);
}

#[test]
fn test_variable_counts() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let stats = oct.stats();
    // delta + w + d + (e, z, theta, xi) + beta
    assert_eq!(stats.n_variables, 1 + 9 + 3 + 4 * 12 + 36);
    assert_eq!(stats.n_binaries, 36);
    assert_eq!(stats.n_continuous, stats.n_variables - 36);
    assert_eq!(oct.model().name(), MODEL_NAME);
}

#[test]
fn test_variable_names_follow_scheme() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let model = oct.model();
    let vars = oct.variables();
    assert_eq!(model.variable(vars.delta).name, "delta");
    assert_eq!(model.variable(vars.w.at(2, 1)).name, "w_2_1");
    assert_eq!(model.variable(vars.d[1]).name, "d_1");
    assert_eq!(model.variable(vars.e.at(3, 2)).name, "e_3_2");
    assert_eq!(model.variable(vars.z.at(0, 1)).name, "z_0_1");
    assert_eq!(model.variable(vars.theta.at(1, 0)).name, "theta_1_0");
    assert_eq!(model.variable(vars.xi.at(2, 2)).name, "xi_2_2");
    assert_eq!(model.variable(vars.beta.at(3, 1, 2)).name, "beta_3_1_2");
}

#[test]
fn test_product_encoding_counts() {
    let config = separable_config().with_bilinear(BilinearEncoding::Product);
    let oct = OctModel::build(&separable_data(), &config).expect("valid");
    let bilinear: Vec<&Constraint> = oct
        .constraints_of(ConstraintFamily::BilinearLinearization)
        .collect();
    assert_eq!(bilinear.len(), 4 * 3 * 3);
    assert!(bilinear.iter().all(|c| c.is_quadratic() && c.sense == Sense::Equal));
    assert_eq!(oct.stats().n_quadratic, 6 + 36);
}

#[test]
fn test_without_intercept() {
    let config = separable_config().with_intercept(false);
    let oct = OctModel::build(&separable_data(), &config).expect("valid");
    assert_eq!(oct.design_matrix().n_cols(), 2);
    assert_eq!(oct.variables().n_features(), 2);
    assert_eq!(oct.stats().n_variables, 1 + 6 + 3 + 4 * 12 + 24);
}

#[test]
fn test_intercept_stays_out_of_norms() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let intercept = oct.variables().w.at(0, 2);
    for c in oct.constraints_of(ConstraintFamily::MarginBound) {
        assert_eq!(c.quadratic.len(), 2);
        assert!(c.quadratic.iter().all(|q| q.a != intercept));
    }
}

#[test]
fn test_deeper_tree_counts() {
    // N = 4, D = 2: T = 7, L = 3
    let config = separable_config().with_depth(2);
    let stats = OctModel::build(&separable_data(), &config).expect("valid").stats();
    assert_eq!(stats.by_family[&ConstraintFamily::LayerPartition], 12);
    assert_eq!(stats.by_family[&ConstraintFamily::RoutingMonotonicity], 24);
    assert_eq!(stats.by_family[&ConstraintFamily::ComplexityMonotonicity], 6);
    assert_eq!(stats.n_binaries, 3 * 4 * 7);
}

#[test]
fn test_build_is_deterministic() {
    let a = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let b = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    assert_eq!(a.model(), b.model());
    assert_eq!(a.families(), b.families());
    assert_eq!(a.variables(), b.variables());
}

#[test]
fn test_constraint_names_unique() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let mut names: Vec<&str> = oct.model().constraints().iter().map(|c| c.name.as_str()).collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
}

// ========================================================================
// Validation
// ========================================================================

#[test]
fn test_rejects_bad_config() {
    let data = separable_data();
    for config in [
        separable_config().with_depth(0),
        separable_config().with_big_m(0.0),
        separable_config().with_big_m(f64::INFINITY),
        separable_config().with_penalties(-0.1, 0.1, 0.1),
        separable_config().with_penalties(0.1, f64::NAN, 0.1),
    ] {
        let err = OctModel::build(&data, &config).unwrap_err();
        assert!(err.is_validation(), "{err}");
    }
}

#[test]
fn test_rejects_bad_data() {
    let empty: [[f64; 2]; 0] = [];
    assert!(Dataset::from_rows(&empty, &[]).is_err());
    assert!(Dataset::from_rows(&[[0.0; 0]], &[1.0]).is_err());
    assert!(Dataset::from_rows(&[[0.0, 1.0]], &[1.0, -1.0]).is_err());
    assert!(Dataset::from_rows(&[[0.0, 1.0]], &[0.0]).is_err());
    assert!(Dataset::from_rows(&[[f64::NAN, 1.0]], &[1.0]).is_err());
}

#[test]
fn test_config_json_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    let config = separable_config().with_bilinear(BilinearEncoding::Product);
    config.save(&path).expect("save");
    assert_eq!(OctSvmConfig::load(&path).expect("load"), config);

    std::fs::write(&path, r#"{"depth": 3}"#).expect("write");
    let partial = OctSvmConfig::load(&path).expect("defaults fill the rest");
    assert_eq!(partial.depth, 3);
    assert_eq!(partial.big_m, OctSvmConfig::default().big_m);

    std::fs::write(&path, r#"{"big_m": -1.0}"#).expect("write");
    assert!(OctSvmConfig::load(&path).is_err());
}

// ========================================================================
// Assignments and extraction
// ========================================================================

#[test]
fn test_known_optimum_objective() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let solution = oct.assignment_for(&known_optimum()).expect("same shape");
    assert!(check_oct(&oct, &solution, DEFAULT_TOLERANCE).expect("sized").is_feasible());
    // delta = 0.16 / 2, d_0 = 0.16 / M
    assert!((solution.objective() - 0.08016).abs() < 1e-9);
}

#[test]
fn test_extract_known_optimum() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let solution = oct.assignment_for(&known_optimum()).expect("same shape");
    let fit = oct.extract(&solution).expect("routed");
    assert_eq!(fit.routing, vec![vec![0, 1], vec![0, 1], vec![0, 2], vec![0, 2]]);
    assert_eq!(fit.leaves(), vec![1, 1, 2, 2]);
    assert_eq!(fit.active_nodes, vec![0]);
    assert_eq!(fit.gating_activations, 0);
    assert!(fit.routed_slack().abs() < 1e-12);
    assert!((fit.margin - 0.08).abs() < 1e-12);
    assert!((fit.tree.node(0).intercept + 1.0).abs() < 1e-12);
    assert_eq!(fit.tree, known_optimum());
}

#[test]
fn test_slack_on_misclassified_sample() {
    let data = Dataset::from_rows(&[[0.0], [1.0], [2.0]], &[-1.0, 1.0, -1.0]).expect("valid");
    let config = OctSvmConfig::new().with_depth(1).with_big_m(100.0);
    let oct = OctModel::build(&data, &config).expect("valid");
    // everything goes left to a node predicting x - 0.5
    let tree = SvmTree::new(
        oct.topology(),
        vec![
            NodeHyperplane::new(vec![0.0], -1.0),
            NodeHyperplane::new(vec![2.0], -1.0),
            NodeHyperplane::new(vec![0.0], 0.0),
        ],
    )
    .expect("three nodes");
    let solution = oct.assignment_for(&tree).expect("same shape");
    assert!(check_oct(&oct, &solution, DEFAULT_TOLERANCE).expect("sized").is_feasible());
    let fit = oct.extract(&solution).expect("routed");
    // the root scores -1 everywhere, node 1 scores -1, 1, 3
    assert_eq!(fit.slacks[1][0], 2.0);
    assert_eq!(fit.slacks[2][1], 4.0);
    assert_eq!(fit.routed_slack(), 6.0);
}

#[test]
fn test_assignment_rejects_mismatched_tree() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let deeper = SvmTree::new(
        TreeTopology::new(2).expect("depth 2"),
        vec![NodeHyperplane::new(vec![0.0, 0.0], 0.0); 7],
    )
    .expect("seven nodes");
    assert!(oct.assignment_for(&deeper).is_err());

    let no_intercept = OctModel::build(&separable_data(), &separable_config().with_intercept(false))
        .expect("valid");
    assert!(no_intercept.assignment_for(&known_optimum()).is_err());
}

#[test]
fn test_extract_rejects_unrouted_sample() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let mut values = oct.assignment_for(&known_optimum()).expect("same shape").values().to_vec();
    values[oct.variables().z.at(1, 1).index()] = 0.0;
    let solution = Solution::new(oct.model(), values).expect("sized");
    assert!(matches!(oct.extract(&solution), Err(OctError::Solver(_))));
}

#[test]
fn test_solve_with_fixed_solver() {
    let oct = OctModel::build(&separable_data(), &separable_config()).expect("valid");
    let values = oct.assignment_for(&known_optimum()).expect("same shape").values().to_vec();
    let mut solver = FixedSolver {
        status: SolveStatus::TimeLimitReached,
        values: Some(values),
    };
    let outcome = oct.solve(&mut solver).expect("replayed");
    assert_eq!(outcome.status, SolveStatus::TimeLimitReached);
    assert_eq!(outcome.fit.expect("incumbent kept").tree, known_optimum());

    let mut solver = FixedSolver {
        status: SolveStatus::Infeasible,
        values: None,
    };
    let outcome = oct.solve(&mut solver).expect("replayed");
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert!(outcome.fit.is_none());
}

fn known_optimum_solver(data: &Dataset, config: &OctSvmConfig) -> FixedSolver {
    let values = OctModel::build(data, config)
        .expect("valid")
        .assignment_for(&known_optimum())
        .expect("same shape")
        .values()
        .to_vec();
    FixedSolver {
        status: SolveStatus::Optimal,
        values: Some(values),
    }
}

#[test]
fn test_classifier_fit_predict() {
    let data = separable_data();
    let config = separable_config();
    let mut solver = known_optimum_solver(&data, &config);

    let mut clf = OctSvmClassifier::new(config);
    assert!(matches!(clf.predict(data.features()), Err(OctError::NotFitted)));
    let status = clf.fit(data.features(), data.labels(), &mut solver).expect("fit");
    assert!(status.is_optimal());
    assert_eq!(clf.status(), Some(SolveStatus::Optimal));
    assert_eq!(clf.predict(data.features()).expect("fitted"), data.labels().to_vec());
    assert!((clf.score(data.features(), data.labels()).expect("fitted") - 1.0).abs() < 1e-12);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("clf.json");
    clf.save(&path).expect("save");
    let loaded = OctSvmClassifier::load(&path).expect("load");
    assert_eq!(loaded.tree().expect("fitted"), clf.tree().expect("fitted"));
}

#[test]
fn test_classifier_load_rejects_tampered_tree() {
    let data = separable_data();
    let config = separable_config();
    let mut clf = OctSvmClassifier::new(config.clone());
    clf.fit(data.features(), data.labels(), &mut known_optimum_solver(&data, &config))
        .expect("fit");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("clf.json");
    clf.save(&path).expect("save");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");

    let tamper = |edit: &dyn Fn(&mut serde_json::Value)| {
        let mut json = saved.clone();
        edit(&mut json);
        std::fs::write(&path, json.to_string()).expect("write");
        OctSvmClassifier::load(&path)
    };

    // depth 2 with the three nodes of a depth-1 tree
    let err = tamper(&|j| j["fit"]["tree"]["topology"]["depth"] = 2.into()).unwrap_err();
    assert!(matches!(err, OctError::DimensionMismatch { .. }));

    let err = tamper(&|j| {
        j["fit"]["tree"]["nodes"][2]["weights"] = serde_json::json!([0.0]);
    })
    .unwrap_err();
    assert!(matches!(err, OctError::DimensionMismatch { .. }));

    let err = tamper(&|j| j["fit"]["routing"][0] = serde_json::json!([0])).unwrap_err();
    assert!(matches!(err, OctError::DimensionMismatch { .. }));

    let err = tamper(&|j| j["fit"]["routing"][3] = serde_json::json!([0, 7])).unwrap_err();
    assert!(err.is_validation());

    let err = tamper(&|j| j["fit"]["complexity"] = serde_json::json!([0.0])).unwrap_err();
    assert!(matches!(err, OctError::DimensionMismatch { .. }));

    // tree and routing of a deeper tree than the configuration asks for
    let err = tamper(&|j| j["config"]["depth"] = 2.into()).unwrap_err();
    assert!(err.is_validation());

    let loaded = tamper(&|_| {}).expect("untouched file loads");
    assert_eq!(
        loaded.predict(data.features()).expect("fitted"),
        data.labels().to_vec()
    );
}

#[test]
fn test_classifier_rejects_bad_labels() {
    let mut clf = OctSvmClassifier::new(separable_config());
    let x = Matrix::from_rows(&[[0.0], [1.0]]).expect("rows");
    let mut solver = FixedSolver {
        status: SolveStatus::Optimal,
        values: None,
    };
    let err = clf.fit(&x, &[0.0, 1.0], &mut solver).unwrap_err();
    assert!(err.is_validation());
    assert!(!clf.is_fitted());
}

