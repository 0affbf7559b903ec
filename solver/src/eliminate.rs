//! The fraction-free Gauss eliminator.
//!
//! This is a Bareiss-style elimination over the coefficient ring: each
//! elementary step computes
//!
//! ```text
//! A[row][col] <- (A[row][col]*A[step][step] - A[step][col]*A[row][step]) / divisor
//! ```
//!
//! where `divisor` is the pivot of the previous step (one initially). The
//! division is exact in this ring, so no fractions ever appear and the
//! final diagonal entry is the system determinant.
//!
//! The representation constraint — no constant to a power above one — is
//! maintained by pruning: a product of two addends survives only when every
//! constant of the divisor's leading product appears in exactly one of the
//! two, and every constant they share appears in the divisor's leading
//! product. Surviving products are stored already divided by that leading
//! product (bitwise XOR); the pruned ones cancel among themselves, which is
//! what makes the term-wise division sound. The same test guards the
//! subtracted products of the long-division loop, and it is also what bounds
//! that loop: every addend pushed back has a strictly smaller product than
//! the quotient term being processed.

use crate::coeff::{Addend, Coefficient, ProductMask};
use crate::matrix::MnaMatrix;

/// Errors which can occur while eliminating.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("the equation system is singular (no usable pivot at elimination step {step})")]
    Singular { step: usize },
}

/// True when the product of two addends with masks `p1` and `p2`, divided by
/// the divisor's leading product `pd`, yields a representable product (every
/// constant to the power zero or one).
fn survives(p1: ProductMask, p2: ProductMask, pd: ProductMask) -> bool {
    ((!p1 & !p2 & pd) | (p1 & p2 & !pd)).is_empty()
}

/// Accumulates `sign * (x * y) / mono(pd)` into `acc`, pruning
/// non-representable products.
fn accumulate_products(
    acc: &mut Coefficient,
    x: &Coefficient,
    y: &Coefficient,
    sign: i64,
    pd: ProductMask,
) {
    for a in x.addends() {
        for b in y.addends() {
            if !survives(a.product, b.product, pd) {
                continue;
            }
            debug_assert!(
                a.factor.checked_mul(b.factor).is_some(),
                "coefficient factor overflow"
            );
            let factor = sign * a.factor.wrapping_mul(b.factor);
            acc.add_addend(factor, a.product ^ b.product ^ pd);
        }
    }
}

/// One elementary step: `(a_rc*a_ss - a_sc*a_rs) / divisor`, with the
/// division performed as a multivariate long division by the divisor
/// polynomial.
fn elem_step(
    a_rc: &Coefficient,
    a_ss: &Coefficient,
    a_sc: &Coefficient,
    a_rs: &Coefficient,
    divisor: &Coefficient,
) -> Coefficient {
    // The previous pivot is never zero, or elimination would have failed.
    let lead = divisor.leading().expect("zero divisor in elementary step");
    let (fd, pd) = (lead.factor, lead.product);

    // The numerator, with every product already divided by the divisor's
    // leading product; factors still carry the leading factor `fd`.
    let mut num = Coefficient::zero();
    accumulate_products(&mut num, a_rc, a_ss, 1, pd);
    accumulate_products(&mut num, a_sc, a_rs, -1, pd);

    let mut quotient = Coefficient::zero();
    while let Some(Addend { factor, product }) = num.pop_leading() {
        // Exactness of the fraction-free division.
        debug_assert_eq!(factor % fd, 0, "inexact division in elementary step");
        let fq = factor / fd;
        quotient.push_trailing(Addend { factor: fq, product });
        // Subtract the quotient term times the divisor's tail from the
        // remaining numerator. Every product pushed back here is strictly
        // smaller than `product`, so the loop terminates.
        for tail in &divisor.addends()[1..] {
            if !survives(product, tail.product, pd) {
                continue;
            }
            debug_assert!(fq.checked_mul(tail.factor).is_some());
            num.add_addend(-fq.wrapping_mul(tail.factor), product ^ tail.product ^ pd);
        }
    }
    debug_assert!(quotient.is_ordered());
    quotient
}

/// Triangularizes the matrix in place.
///
/// After a successful return, row `m - 1` holds the solution for the
/// unknown in column `m - 1`: `A[m-1][m-1]` is the system determinant (for
/// the row order as given) and the known columns of that row carry the
/// negated numerators.
pub fn eliminate(matrix: &mut MnaMatrix) -> Result<(), SolverError> {
    let m = matrix.rows();
    let n = matrix.cols();
    if m == 0 {
        return Ok(());
    }

    let mut divisor = Coefficient::one();
    let mut sign_inv = false;
    for step in 0..m - 1 {
        if matrix.at(step, step).is_zero() {
            // Zero diagonal: pivot with the first usable row below.
            let pivot = (step + 1..m)
                .find(|&row| !matrix.at(row, step).is_zero())
                .ok_or(SolverError::Singular { step })?;
            matrix.swap_rows(step, pivot);
            sign_inv = !sign_inv;
        }
        for row in step + 1..m {
            for col in step + 1..n {
                let updated = elem_step(
                    matrix.at(row, col),
                    matrix.at(step, step),
                    matrix.at(step, col),
                    matrix.at(row, step),
                    &divisor,
                );
                debug_assert!(updated.is_ordered());
                matrix.set(row, col, updated);
            }
            matrix.set(row, step, Coefficient::zero());
        }
        divisor = matrix.at(step, step).clone();
    }

    if matrix.at(m - 1, m - 1).is_zero() {
        return Err(SolverError::Singular { step: m - 1 });
    }
    if sign_inv {
        // Row swaps flipped the determinant's sign; restore the original
        // orientation on the result row.
        for col in 0..n {
            let mut coeff = matrix.take(m - 1, col);
            coeff.negate();
            matrix.set(m - 1, col, coeff);
        }
    }
    Ok(())
}
