//! Per-point geometry of the reference-to-physical map.
//!
//! The generated kernels read the Jacobian $J$ (`gdim x tdim`), its (pseudo-)determinant
//! and its (pseudo-)inverse $K$ (`tdim x gdim`) from flat arrays. This module provides the
//! matrices in `nalgebra` form together with the flattening into the kernel layout.
use nalgebra::DMatrix;

/// The Jacobian, its determinant and its inverse at a single point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGeometry {
    jacobian: DMatrix<f64>,
    det: f64,
    inverse: DMatrix<f64>,
}

impl PointGeometry {
    /// Constructs the geometry from explicitly given quantities.
    ///
    /// # Panics
    ///
    /// Panics if the shape of `inverse` is not the transpose of the shape of `jacobian`.
    pub fn new(jacobian: DMatrix<f64>, det: f64, inverse: DMatrix<f64>) -> Self {
        assert_eq!(
            (jacobian.nrows(), jacobian.ncols()),
            (inverse.ncols(), inverse.nrows()),
            "Inverse Jacobian must have the transposed shape of the Jacobian."
        );
        Self { jacobian, det, inverse }
    }

    /// Computes determinant and inverse from the Jacobian.
    ///
    /// For a square Jacobian these are the usual determinant and inverse. For a
    /// `gdim x tdim` Jacobian with `tdim < gdim` (a manifold cell) the pseudo-determinant
    /// $\sqrt{\det(J^T J)}$ and the pseudo-inverse $(J^T J)^{-1} J^T$ are used.
    ///
    /// Returns `None` if the Jacobian is singular.
    pub fn from_jacobian(jacobian: DMatrix<f64>) -> Option<Self> {
        if jacobian.is_square() {
            let det = jacobian.determinant();
            let inverse = jacobian.clone().try_inverse()?;
            Some(Self { jacobian, det, inverse })
        } else {
            let jtj = jacobian.transpose() * &jacobian;
            let gram_det = jtj.determinant();
            if gram_det <= 0.0 {
                return None;
            }
            let inverse = jtj.try_inverse()? * jacobian.transpose();
            Some(Self {
                jacobian,
                det: gram_det.sqrt(),
                inverse,
            })
        }
    }

    pub fn jacobian(&self) -> &DMatrix<f64> {
        &self.jacobian
    }

    pub fn det(&self) -> f64 {
        self.det
    }

    pub fn inverse(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    pub fn tdim(&self) -> usize {
        self.jacobian.ncols()
    }

    pub fn gdim(&self) -> usize {
        self.jacobian.nrows()
    }
}

/// The geometry at every point of a point set, sharing the same dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBundle {
    points: Vec<PointGeometry>,
}

impl GeometryBundle {
    /// # Panics
    ///
    /// Panics if the points do not all have the same dimensions.
    pub fn new(points: Vec<PointGeometry>) -> Self {
        if let Some(first) = points.first() {
            let dims = (first.tdim(), first.gdim());
            assert!(
                points.iter().all(|p| (p.tdim(), p.gdim()) == dims),
                "All points in a geometry bundle must have the same dimensions."
            );
        }
        Self { points }
    }

    /// The same geometry repeated at `num_points` points.
    pub fn uniform(geometry: PointGeometry, num_points: usize) -> Self {
        Self::new(vec![geometry; num_points])
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[PointGeometry] {
        &self.points
    }

    /// Jacobians in the layout `[point][gdim][tdim]`.
    pub fn flat_jacobians(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| row_major(p.jacobian()))
            .collect()
    }

    /// Determinants in the layout `[point]`.
    pub fn flat_determinants(&self) -> Vec<f64> {
        self.points.iter().map(PointGeometry::det).collect()
    }

    /// Inverse Jacobians in the layout `[point][tdim][gdim]`.
    pub fn flat_inverses(&self) -> Vec<f64> {
        self.points
            .iter()
            .flat_map(|p| row_major(p.inverse()))
            .collect()
    }
}

fn row_major(matrix: &DMatrix<f64>) -> Vec<f64> {
    // nalgebra stores column-major, so the transpose's storage is our row-major order
    matrix.transpose().as_slice().to_vec()
}
