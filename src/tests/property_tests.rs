//! Property-Based and Fuzz Testing
//!
//! Uses quickcheck for property-based testing of:
//! - Parser robustness (fuzz testing)
//! - Fast paths agreeing with the symbolic path
//! - Batch rows agreeing with scalar propagation

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

use crate::{
    Operand, build_derivatives, fast_product, fast_quotient, fast_sum, parse, propagate_batch,
    propagate_scalar,
};

// ============================================================
// PART 1: INPUT GENERATORS
// ============================================================

/// A measured value away from zero, with a positive uncertainty
#[derive(Clone, Debug)]
struct Measurement {
    value: f64,
    error: f64,
}

impl Arbitrary for Measurement {
    fn arbitrary(g: &mut Gen) -> Self {
        let magnitude = (u16::arbitrary(g) % 1000 + 1) as f64 / 10.0;
        let value = if bool::arbitrary(g) { magnitude } else { -magnitude };
        let error = (u16::arbitrary(g) % 100 + 1) as f64 / 1000.0;
        Measurement { value, error }
    }
}

/// A literal `m` or `me±k` spanning physical-constant magnitudes
fn coefficient(g: &mut Gen) -> String {
    let mantissa = u8::arbitrary(g) % 9 + 1;
    match i8::arbitrary(g) % 16 {
        0 => mantissa.to_string(),
        k => format!("{}e{}", mantissa, k),
    }
}

/// Generate random formula strings over x, y, z in the accepted syntax
fn gen_formula(g: &mut Gen, depth: usize) -> String {
    if depth == 0 {
        return match u8::arbitrary(g) % 5 {
            0 => coefficient(g),
            1 => "x".to_string(),
            2 => "y".to_string(),
            3 => "z".to_string(),
            _ => "Pi".to_string(),
        };
    }
    match u8::arbitrary(g) % 8 {
        0..=3 => {
            let ops = ["+", "-", "*", "/", "^", " "];
            let op = ops[usize::arbitrary(g) % ops.len()];
            let left = gen_formula(g, depth - 1);
            let right = gen_formula(g, depth - 1);
            format!("({}){}({})", left, op, right)
        }
        4..=6 => {
            let fns = ["Sin", "Cos", "Exp", "Log", "Sqrt", "ArcTan", "Tanh"];
            let f = fns[usize::arbitrary(g) % fns.len()];
            format!("{}[{}]", f, gen_formula(g, depth - 1))
        }
        _ => format!("-{}", gen_formula(g, depth - 1)),
    }
}

#[derive(Clone, Debug)]
struct Formula(String);

impl Arbitrary for Formula {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = g.size().min(4);
        Formula(gen_formula(g, depth))
    }
}

// ============================================================
// PART 2: PARSER FUZZING
// ============================================================

#[test]
fn test_parser_never_panics() {
    fn prop_parser_no_panic(input: String) -> TestResult {
        let _ = parse(&input, &["x", "y", "z"]);
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(1000)
        .quickcheck(prop_parser_no_panic as fn(String) -> TestResult);
}

#[test]
fn test_generated_formulas_parse() {
    fn prop_generated_parses(formula: Formula) -> bool {
        parse(&formula.0, &["x", "y", "z"]).is_ok()
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(prop_generated_parses as fn(Formula) -> bool);
}

#[test]
fn test_one_derivative_per_variable() {
    fn prop_arity(formula: Formula) -> bool {
        build_derivatives(&["x", "y", "z"], &formula.0).is_ok_and(|d| d.len() == 3)
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop_arity as fn(Formula) -> bool);
}

#[test]
fn test_coefficient_scales_derivative() {
    fn prop_coefficient(mantissa: u8, exponent: i8) -> bool {
        let c = format!("{}e{}", mantissa % 9 + 1, exponent % 40);
        let want: f64 = c.parse().unwrap();
        let d = build_derivatives(&["x"], &format!("{} x", c)).unwrap();
        d[0].evaluate(&[1.5]).unwrap() == want
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop_coefficient as fn(u8, i8) -> bool);
}

// ============================================================
// PART 3: FAST PATHS VS SYMBOLIC PATH
// ============================================================

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn symbolic(formula: &str, a: &Measurement, b: &Measurement) -> f64 {
    let d = build_derivatives(&["a", "b"], formula).unwrap();
    propagate_scalar(&d, &[a.value, b.value], &[a.error, b.error]).unwrap()
}

#[test]
fn test_fast_paths_match_symbolic() {
    fn prop_fast_paths(a: Measurement, b: Measurement) -> bool {
        let (va, ea) = ([a.value], [a.error]);
        let (vb, eb) = ([b.value], [b.error]);
        let ops = [Operand::new(&va, &ea), Operand::new(&vb, &eb)];

        let sum = fast_sum(&ops).unwrap()[0];
        let product = fast_product(&ops).unwrap()[0];
        let quotient = fast_quotient(ops[0], ops[1]).unwrap()[0];

        close(sum, symbolic("a + b", &a, &b))
            && close(product, symbolic("a b", &a, &b))
            && close(quotient, symbolic("a/b", &a, &b))
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop_fast_paths as fn(Measurement, Measurement) -> bool);
}

#[test]
fn test_fast_product_is_non_negative() {
    fn prop_non_negative(ms: Vec<Measurement>) -> TestResult {
        if ms.len() < 2 {
            return TestResult::discard();
        }
        let values: Vec<[f64; 1]> = ms.iter().map(|m| [m.value]).collect();
        let errors: Vec<[f64; 1]> = ms.iter().map(|m| [m.error]).collect();
        let ops: Vec<Operand<'_>> = values
            .iter()
            .zip(&errors)
            .map(|(v, e)| Operand::new(v, e))
            .collect();
        match fast_product(&ops) {
            Ok(out) => TestResult::from_bool(out[0] >= 0.0),
            // Long products of large values may overflow
            Err(_) => TestResult::discard(),
        }
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop_non_negative as fn(Vec<Measurement>) -> TestResult);
}

// ============================================================
// PART 4: BATCH VS SCALAR
// ============================================================

#[test]
fn test_batch_rows_equal_scalar_rows() {
    fn prop_batch_rows(rows: Vec<(Measurement, Measurement)>) -> bool {
        let d = build_derivatives(&["p", "q"], "p^2 Sin[q] + p/q").unwrap();
        let columns = |f: fn(&(Measurement, Measurement)) -> f64| -> Vec<f64> {
            rows.iter().map(f).collect()
        };
        let values = [columns(|r| r.0.value), columns(|r| r.1.value)];
        let errors = [columns(|r| r.0.error), columns(|r| r.1.error)];

        let batch = propagate_batch(&d, &values, &errors).unwrap();
        batch.len() == rows.len()
            && rows.iter().zip(&batch).all(|((p, q), sigma)| {
                propagate_scalar(&d, &[p.value, q.value], &[p.error, q.error]).unwrap() == *sigma
            })
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop_batch_rows as fn(Vec<(Measurement, Measurement)>) -> bool);
}
