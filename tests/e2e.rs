//! End-to-end scenarios exercised only through the public `Solver` API:
//! a linear program, a second-order-cone program, a PSD program, a
//! hypo-perspective-log (exponential-flavored) program, a primal
//! infeasibility certificate, and a rank-deficient-`A` pair (preprocess on
//! vs. the `QRChol`-without-preprocess configuration error).

use concore::algebra::CscMatrix;
use concore::{Model, Solver, SolverSettings, SolverStatus, SupportedCone};

fn solve(model: Model<f64>, settings: SolverSettings<f64>) -> Solver<f64> {
    let mut solver = Solver::new(settings);
    solver.load(model).expect("valid configuration");
    solver.solve();
    solver
}

#[test]
fn linear_program_reaches_optimum() {
    // min -x - y  s.t. x <= 1, y <= 1, x + y <= 1.5, x,y >= 0 is implied by
    // the optimum itself; three inequalities suffice.
    let a = CscMatrix::<f64>::zeros(0, 2);
    let g = CscMatrix::from_dense_row_major(3, 2, &[1.0, 0.0, 0.0, 1.0, -1.0, -1.0]);
    let model = Model::new(a, vec![], g, vec![1.0, 1.0, -1.5], vec![-1.0, -1.0], 0.0, vec![
        SupportedCone::NonnegativeCone(3),
    ])
    .unwrap();

    let solver = solve(model, SolverSettings::default());
    assert_eq!(solver.status(), SolverStatus::Optimal);
    assert!((solver.primal_objective() - (-1.5)).abs() < 1e-4);
    let x = solver.x();
    assert!((x[0] + x[1] - 1.5).abs() < 1e-3);
}

#[test]
fn second_order_cone_program_reaches_optimum() {
    // min x + y s.t. (t,x,y) in SOC_3, t <= 1.
    let a = CscMatrix::<f64>::zeros(0, 3);
    let mut g_data = vec![0.0; 4 * 3];
    g_data[0 * 3 + 0] = -1.0;
    g_data[1 * 3 + 1] = -1.0;
    g_data[2 * 3 + 2] = -1.0;
    g_data[3 * 3 + 0] = 1.0;
    let g = CscMatrix::from_dense_row_major(4, 3, &g_data);
    let h = vec![0.0, 0.0, 0.0, 1.0];
    let c = vec![0.0, 1.0, 1.0];
    let model = Model::new(a, vec![], g, h, c, 0.0, vec![
        SupportedCone::SecondOrderCone(3),
        SupportedCone::NonnegativeCone(1),
    ])
    .unwrap();

    let solver = solve(model, SolverSettings::default());
    assert_eq!(solver.status(), SolverStatus::Optimal);
    assert!((solver.primal_objective() - (-2.0_f64.sqrt())).abs() < 5e-3);
}

#[test]
fn psd_cone_program_reaches_optimum() {
    // max trace(X) s.t. X psd, X11+X22 <= 1, via svec(X) = (X11, sqrt2*X21, X22).
    let a = CscMatrix::<f64>::zeros(0, 3);
    let g = CscMatrix::from_dense_row_major(
        4,
        3,
        &[
            -1.0, 0.0, 0.0, //
            0.0, -1.0, 0.0, //
            0.0, 0.0, -1.0, //
            1.0, 0.0, 1.0,
        ],
    );
    let h = vec![0.0, 0.0, 0.0, 1.0];
    let c = vec![-1.0, 0.0, -1.0];
    let model = Model::new(a, vec![], g, h, c, 0.0, vec![
        SupportedCone::PsdTriangleCone(2),
        SupportedCone::NonnegativeCone(1),
    ])
    .unwrap();

    let solver = solve(model, SolverSettings::default());
    assert_eq!(solver.status(), SolverStatus::Optimal);
    assert!((solver.primal_objective() - (-1.0)).abs() < 1e-2);
}

#[test]
fn hypo_perspective_log_program_reaches_optimum() {
    // Fix u = 1, v = 1 and minimize w subject to u <= v*log(w/v); the bound
    // binds at w = e^u = e.
    let a = CscMatrix::<f64>::from_dense_row_major(2, 3, &[0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
    let b = vec![1.0, 1.0];
    let g = CscMatrix::from_dense_row_major(
        3,
        3,
        &[-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0],
    );
    let h = vec![0.0, 0.0, 0.0];
    let c = vec![0.0, 0.0, 1.0];
    let model = Model::new(a, b, g, h, c, 0.0, vec![SupportedCone::HypoPerspectiveLogCone(1)]).unwrap();

    let solver = solve(model, SolverSettings::default());
    assert_eq!(solver.status(), SolverStatus::Optimal);
    assert!((solver.primal_objective() - std::f64::consts::E).abs() < 5e-2);
}

#[test]
fn primal_infeasibility_is_detected() {
    // A=[1], G=[1], nonnegative-orthant: b=[1] is feasible, b=[-1] is not
    // (x >= 0 and x = -1 can't both hold).
    let a_feasible = CscMatrix::<f64>::from_dense_row_major(1, 1, &[1.0]);
    let g = CscMatrix::from_dense_row_major(1, 1, &[1.0]);
    let model_feasible = Model::new(
        a_feasible,
        vec![1.0],
        g.clone(),
        vec![0.0],
        vec![0.0],
        0.0,
        vec![SupportedCone::NonnegativeCone(1)],
    )
    .unwrap();
    let solver = solve(model_feasible, SolverSettings::default());
    assert_eq!(solver.status(), SolverStatus::Optimal);

    let a_infeasible = CscMatrix::<f64>::from_dense_row_major(1, 1, &[1.0]);
    let model_infeasible = Model::new(
        a_infeasible,
        vec![-1.0],
        g,
        vec![0.0],
        vec![0.0],
        0.0,
        vec![SupportedCone::NonnegativeCone(1)],
    )
    .unwrap();
    let solver = solve(model_infeasible, SolverSettings::default());
    assert_eq!(solver.status(), SolverStatus::PrimalInfeasible);
}

#[test]
fn rank_deficient_equality_rows_with_preprocess_reaches_optimal() {
    // Two copies of the same equality row alongside a bound-constrained LP.
    let a = CscMatrix::<f64>::from_dense_row_major(2, 1, &[1.0, 1.0]);
    let g = CscMatrix::from_dense_row_major(1, 1, &[-1.0]);
    let model = Model::new(a, vec![1.0, 1.0], g, vec![0.0], vec![1.0], 0.0, vec![
        SupportedCone::NonnegativeCone(1),
    ])
    .unwrap();

    let settings = SolverSettings::default().with_preprocess(true);
    let solver = solve(model, settings);
    assert_eq!(solver.status(), SolverStatus::Optimal);
}

#[test]
fn qrchol_without_preprocess_is_a_configuration_error() {
    let a = CscMatrix::<f64>::zeros(0, 1);
    let g = CscMatrix::from_dense_row_major(1, 1, &[-1.0]);
    let model = Model::new(a, vec![], g, vec![0.0], vec![1.0], 0.0, vec![
        SupportedCone::NonnegativeCone(1),
    ])
    .unwrap();

    let settings = SolverSettings::default()
        .with_system_solver(concore::SystemSolverKind::QrChol)
        .with_preprocess(false);
    let mut solver = Solver::new(settings);
    let result = solver.load(model);
    assert!(result.is_err());
}
