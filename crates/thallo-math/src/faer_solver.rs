//! Sparse solver back ends built on `faer`.
//!
//! Implements the [`SparseSolver`] trait twice: [`CholeskySolver`] wraps
//! faer's supernodal LLᵀ factorization for symmetric positive-definite
//! systems, and [`QrSolver`] wraps the sparse QR factorization as the
//! general fallback for systems the Cholesky path rejects.
//!
//! ## Workflow
//! 1. `factorize(matrix)` — converts CSR→CSC, computes symbolic + numeric factors
//! 2. `solve(rhs, solution)` — substitution against the cached factorization
//! 3. Repeat `solve()` with different RHS without re-factorizing

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, Qr, SymbolicLlt, SymbolicQr};
use faer::sparse::{SparseColMat, Triplet};
use faer::Side;

use crate::sparse::{CsrMatrix, SparseSolver};

/// Convert our CSR matrix to faer's CSC matrix.
///
/// Builds from faer `Triplet`s, which faer assembles into CSC format.
fn csr_to_csc(matrix: &CsrMatrix) -> Result<SparseColMat<usize, f64>, String> {
    let mut triplets: Vec<Triplet<usize, usize, f64>> = Vec::with_capacity(matrix.values.len());
    for row in 0..matrix.rows {
        for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
            let col = matrix.col_idx[idx];
            let val = matrix.values[idx];
            triplets.push(Triplet { row, col, val });
        }
    }

    SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets)
        .map_err(|e| format!("Failed to construct faer CSC matrix: {e:?}"))
}

fn check_square(matrix: &CsrMatrix) -> Result<(), String> {
    if matrix.rows != matrix.cols {
        return Err(format!(
            "Matrix must be square, got {}×{}",
            matrix.rows, matrix.cols
        ));
    }
    if matrix.rows == 0 {
        return Err("Cannot factorize empty matrix".into());
    }
    Ok(())
}

fn check_dimensions(dimension: usize, rhs: &[f64], solution: &[f64]) -> Result<(), String> {
    if rhs.len() != dimension {
        return Err(format!(
            "RHS length ({}) != matrix dimension ({dimension})",
            rhs.len()
        ));
    }
    if solution.len() != dimension {
        return Err(format!(
            "Solution length ({}) != matrix dimension ({dimension})",
            solution.len()
        ));
    }
    Ok(())
}

/// Sparse Cholesky (LLᵀ) solver using `faer`.
///
/// Fails loudly at `factorize` time when the matrix is not positive
/// definite; callers fall back to [`QrSolver`] or abort the step.
pub struct CholeskySolver {
    /// Cached LLᵀ factorization.
    factorization: Option<Llt<usize, f64>>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl CholeskySolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }
}

impl Default for CholeskySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for CholeskySolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> Result<(), String> {
        check_square(matrix)?;
        self.dimension = matrix.rows;

        let csc = csr_to_csc(matrix)?;

        // Step 1: Symbolic analysis (ordering, fill-in prediction)
        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| format!("Symbolic analysis failed: {e:?}"))?;

        // Step 2: Numeric factorization (using the symbolic structure)
        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
            .map_err(|e| format!("Cholesky factorization failed: {e:?}"))?;

        self.factorization = Some(llt);
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> Result<(), String> {
        let llt = self
            .factorization
            .as_ref()
            .ok_or_else(|| "Solver not factorized. Call factorize() first.".to_string())?;
        check_dimensions(self.dimension, rhs, solution)?;

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);

        // L L^T x = b against the cached factorization
        let sol = llt.solve(&rhs_mat);

        for (i, out) in solution.iter_mut().enumerate() {
            *out = sol[(i, 0)];
        }

        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}

/// Sparse QR solver using `faer`.
///
/// Handles general square systems, including the indefinite matrices
/// the Cholesky path rejects. Slower; used as the fallback.
pub struct QrSolver {
    /// Cached QR factorization.
    factorization: Option<Qr<usize, f64>>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl QrSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }
}

impl Default for QrSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for QrSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> Result<(), String> {
        check_square(matrix)?;
        self.dimension = matrix.rows;

        let csc = csr_to_csc(matrix)?;

        let symbolic = SymbolicQr::try_new(csc.symbolic().as_ref())
            .map_err(|e| format!("Symbolic analysis failed: {e:?}"))?;

        let qr = Qr::try_new_with_symbolic(symbolic, csc.as_ref())
            .map_err(|e| format!("QR factorization failed: {e:?}"))?;

        self.factorization = Some(qr);
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> Result<(), String> {
        let qr = self
            .factorization
            .as_ref()
            .ok_or_else(|| "Solver not factorized. Call factorize() first.".to_string())?;
        check_dimensions(self.dimension, rhs, solution)?;

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);

        let sol = qr.solve(&rhs_mat);

        for (i, out) in solution.iter_mut().enumerate() {
            *out = sol[(i, 0)];
        }

        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}
