//! Atom points and the immutable point set

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Error, Result};

/// A single atom from a dump snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct AtomPoint {
    /// Atom identifier from the dump
    pub id: i64,
    /// Categorical species/type column (1 when the dump has none)
    pub species: u32,
    /// Coordinate vector, typically 3-dimensional
    pub coords: Vec<f64>,
}

/// Ordered, fixed-size collection of atoms owned by one clustering
/// invocation.
///
/// Coordinates are stored as an `n x dim` matrix; partitions reference row
/// indices into it and never copy or mutate the set itself.
#[derive(Debug, Clone)]
pub struct PointSet {
    ids: Vec<i64>,
    species: Vec<u32>,
    coords: Array2<f64>,
}

impl PointSet {
    /// Build a point set from parsed atoms.
    ///
    /// All atoms must share one dimensionality; an empty input is refused
    /// so every invocation owns at least one point.
    pub fn from_points(points: Vec<AtomPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::InsufficientData { needed: 1, got: 0 });
        }
        let dim = points[0].coords.len();
        if dim == 0 {
            return Err(Error::numeric("atoms must have at least one coordinate"));
        }
        let mut coords = Array2::zeros((points.len(), dim));
        let mut ids = Vec::with_capacity(points.len());
        let mut species = Vec::with_capacity(points.len());
        for (row, p) in points.iter().enumerate() {
            if p.coords.len() != dim {
                return Err(Error::numeric(format!(
                    "atom {} has {} coordinates, expected {dim}",
                    p.id,
                    p.coords.len()
                )));
            }
            for (col, &c) in p.coords.iter().enumerate() {
                if !c.is_finite() {
                    return Err(Error::numeric(format!(
                        "atom {} has a non-finite coordinate",
                        p.id
                    )));
                }
                coords[(row, col)] = c;
            }
            ids.push(p.id);
            species.push(p.species);
        }
        Ok(Self { ids, species, coords })
    }

    /// Number of atoms
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty (never true for a constructed set)
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Coordinate dimensionality
    pub fn dim(&self) -> usize {
        self.coords.ncols()
    }

    /// Full coordinate matrix
    pub fn coords(&self) -> ArrayView2<'_, f64> {
        self.coords.view()
    }

    /// Coordinates of one atom
    pub fn point(&self, index: usize) -> ArrayView1<'_, f64> {
        self.coords.row(index)
    }

    /// Dump identifier of one atom
    pub fn id(&self, index: usize) -> i64 {
        self.ids[index]
    }

    /// Species column of one atom
    pub fn species(&self, index: usize) -> u32 {
        self.species[index]
    }

    /// Copy the coordinates of a subset of atoms into a dense matrix,
    /// preserving the order of `indices`.
    pub fn gather(&self, indices: &[usize]) -> Array2<f64> {
        let mut sub = Array2::zeros((indices.len(), self.dim()));
        for (row, &i) in indices.iter().enumerate() {
            sub.row_mut(row).assign(&self.coords.row(i));
        }
        sub
    }
}

/// Euclidean distance between two coordinate rows
pub(crate) fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    euclidean_sq(a, b).sqrt()
}

/// Squared Euclidean distance between two coordinate rows
pub(crate) fn euclidean_sq(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Arithmetic centroid of a coordinate matrix
pub(crate) fn centroid(coords: ArrayView2<'_, f64>) -> Array1<f64> {
    coords
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(coords.ncols()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(id: i64, coords: [f64; 3]) -> AtomPoint {
        AtomPoint {
            id,
            species: 1,
            coords: coords.to_vec(),
        }
    }

    #[test]
    fn from_points_preserves_order() {
        let set = PointSet::from_points(vec![
            atom(7, [0.0, 0.0, 0.0]),
            atom(3, [1.0, 2.0, 3.0]),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.dim(), 3);
        assert_eq!(set.id(0), 7);
        assert_eq!(set.id(1), 3);
        assert_eq!(set.point(1)[2], 3.0);
    }

    #[test]
    fn mixed_dimensionality_is_rejected() {
        let bad = vec![
            atom(1, [0.0, 0.0, 0.0]),
            AtomPoint {
                id: 2,
                species: 1,
                coords: vec![1.0, 2.0],
            },
        ];
        assert!(PointSet::from_points(bad).is_err());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let bad = vec![atom(1, [0.0, f64::NAN, 0.0])];
        assert!(PointSet::from_points(bad).is_err());
    }

    #[test]
    fn gather_copies_subset_in_order() {
        let set = PointSet::from_points(vec![
            atom(1, [0.0, 0.0, 0.0]),
            atom(2, [1.0, 0.0, 0.0]),
            atom(3, [2.0, 0.0, 0.0]),
        ])
        .unwrap();
        let sub = set.gather(&[2, 0]);
        assert_eq!(sub.nrows(), 2);
        assert_eq!(sub[(0, 0)], 2.0);
        assert_eq!(sub[(1, 0)], 0.0);
    }

    #[test]
    fn centroid_is_coordinate_mean() {
        let set = PointSet::from_points(vec![
            atom(1, [0.0, 0.0, 0.0]),
            atom(2, [2.0, 4.0, 6.0]),
        ])
        .unwrap();
        let c = centroid(set.coords());
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 2.0);
        assert_eq!(c[2], 3.0);
    }
}
