//! Fixed offset tables
//!
//! Every orthant of a D-cube is named by an integer in `[0, 2^D)`.
//! Axis 0 is the most significant bit:
//!
//! ```text
//! orthant = Σ bit[axis] · 2^(D - 1 - axis)
//! bit[axis] = 1  ⇔  point[axis] ≥ center[axis]
//! descent[axis] = 2 · bit[axis] - 1
//! ```
//!
//! The builder encodes with this table and the neighbor resolver decodes with
//! it, so both sides always agree on which child is which.

/// Enumerate all `d`-tuples over `values`.
///
/// Order is lexicographic in the order of `values`, first axis varying
/// slowest. For `values = [0, 1]` and `d = 2` this yields
/// `[0,0], [0,1], [1,0], [1,1]`.
pub fn cartesian_product<T: Copy>(values: &[T], d: usize) -> Vec<Vec<T>> {
    let mut tuples: Vec<Vec<T>> = vec![Vec::with_capacity(d)];

    for _ in 0..d {
        let mut extended = Vec::with_capacity(tuples.len() * values.len());
        for prefix in &tuples {
            for &value in values {
                let mut tuple = prefix.clone();
                tuple.push(value);
                extended.push(tuple);
            }
        }
        tuples = extended;
    }

    tuples
}

/// Array form of [`cartesian_product`] for a compile-time dimension.
pub fn tuples<T: Copy + Default, const D: usize>(values: &[T]) -> Vec<[T; D]> {
    cartesian_product(values, D)
        .into_iter()
        .map(|tuple| {
            let mut array = [T::default(); D];
            array.copy_from_slice(&tuple);
            array
        })
        .collect()
}

/// Per-orthant lookup tables for a `D`-dimensional tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrthantTable<const D: usize> {
    /// Positional weight of each axis, `2^(D-1-axis)`
    weights: [usize; D],

    /// `{0, 1}^D` bit patterns, indexed by orthant
    subscripts: Vec<[u8; D]>,

    /// `{-1, +1}^D` sign patterns, indexed by orthant
    descents: Vec<[i8; D]>,
}

impl<const D: usize> OrthantTable<D> {
    /// Build the tables from the cartesian enumeration.
    ///
    /// Only reached after the builder has checked `D` against
    /// `MAX_DIMENSION`, which keeps the axis weights in range.
    pub(crate) fn new() -> Self {
        let mut weights = [0usize; D];
        for (axis, weight) in weights.iter_mut().enumerate() {
            *weight = 1 << (D - 1 - axis);
        }

        let subscripts = tuples::<u8, D>(&[0, 1]);
        let descents = tuples::<i8, D>(&[-1, 1]);

        // Enumeration order must coincide with the positional weighting.
        debug_assert!(subscripts
            .iter()
            .enumerate()
            .all(|(orthant, bits)| Self::pack(&weights, bits) == orthant));

        Self {
            weights,
            subscripts,
            descents,
        }
    }

    fn pack(weights: &[usize; D], bits: &[u8; D]) -> usize {
        bits.iter()
            .zip(weights)
            .map(|(&bit, &weight)| bit as usize * weight)
            .sum()
    }

    /// Number of orthants, `2^D`.
    #[inline]
    pub fn len(&self) -> usize {
        self.descents.len()
    }

    /// Always false: even `D = 0` has one orthant.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descents.is_empty()
    }

    /// Axis weights, most significant first.
    pub fn weights(&self) -> &[usize; D] {
        &self.weights
    }

    /// Orthant of `point` relative to `center`.
    #[inline]
    pub fn encode(&self, point: &[f64; D], center: &[f64; D]) -> usize {
        let mut orthant = 0;
        for axis in 0..D {
            if point[axis] >= center[axis] {
                orthant += self.weights[axis];
            }
        }
        orthant
    }

    /// Orthant named by a `±1` sign pattern.
    ///
    /// Returns `None` if any component is not `±1`.
    #[inline]
    pub fn index_of_descent(&self, descent: &[i8; D]) -> Option<usize> {
        let mut orthant = 0;
        for axis in 0..D {
            match descent[axis] {
                1 => orthant += self.weights[axis],
                -1 => {}
                _ => return None,
            }
        }
        Some(orthant)
    }

    /// Sign pattern of an orthant.
    #[inline]
    pub fn descent(&self, orthant: usize) -> [i8; D] {
        self.descents[orthant]
    }

    /// Bit pattern of an orthant.
    #[inline]
    pub fn subscript(&self, orthant: usize) -> [u8; D] {
        self.subscripts[orthant]
    }

    /// All sign patterns in orthant order.
    pub fn descents(&self) -> &[[i8; D]] {
        &self.descents
    }
}
