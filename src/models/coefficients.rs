use serde::{Deserialize, Serialize};

/// Fixed-length vector of `f32` values addressed from an arbitrary index origin.
///
/// An index `i` is valid when `index_from <= i <= index_from + len - 1`. Access
/// outside that range is a programming error and panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    values: Vec<f32>,
    index_from: i32,
}

fn offset(index_from: i32, len: usize, index: i32) -> usize {
    let last = index_from + len as i32 - 1;
    if index < index_from || index > last {
        panic!("index {index} is outside the coefficient range {index_from}..={last}");
    }
    (index - index_from) as usize
}

impl Coefficients {
    /// Create a vector from raw values with the given index origin.
    pub fn new(values: impl Into<Vec<f32>>, index_from: i32) -> Self {
        Self {
            values: values.into(),
            index_from,
        }
    }

    /// Create a vector of `len` copies of `value`.
    pub fn filled(len: usize, value: f32, index_from: i32) -> Self {
        Self::new(vec![value; len], index_from)
    }

    /// Create a zeroed vector.
    pub fn zeroed(len: usize, index_from: i32) -> Self {
        Self::filled(len, 0.0, index_from)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_from(&self) -> i32 {
        self.index_from
    }

    /// Last valid index.
    pub fn index_to(&self) -> i32 {
        self.index_from + self.values.len() as i32 - 1
    }

    pub fn get(&self, index: i32) -> f32 {
        self.values[offset(self.index_from, self.values.len(), index)]
    }

    pub fn try_get(&self, index: i32) -> Option<f32> {
        if index < self.index_from || index > self.index_to() {
            return None;
        }
        Some(self.values[(index - self.index_from) as usize])
    }

    pub fn set(&mut self, index: i32, value: f32) {
        let i = offset(self.index_from, self.values.len(), index);
        self.values[i] = value;
    }

    /// Apply `op` to the value at one index.
    pub fn scalar_at(&mut self, index: i32, op: impl FnOnce(f32) -> f32) {
        let i = offset(self.index_from, self.values.len(), index);
        self.values[i] = op(self.values[i]);
    }

    /// New vector with `op` applied to every value.
    pub fn scalar(&self, op: impl Fn(f32) -> f32) -> Coefficients {
        Self::new(
            self.values.iter().map(|&x| op(x)).collect::<Vec<_>>(),
            self.index_from,
        )
    }

    pub fn scalar_in_place(&mut self, op: impl Fn(f32) -> f32) {
        for x in &mut self.values {
            *x = op(*x);
        }
    }

    fn check_shape(&self, other: &Coefficients) {
        if self.values.len() != other.values.len() || self.index_from != other.index_from {
            panic!(
                "pairwise operation on mismatched vectors: {}@{} vs {}@{}",
                self.values.len(),
                self.index_from,
                other.values.len(),
                other.index_from
            );
        }
    }

    /// New vector combining each value with the value at the same index in `other`.
    pub fn pairwise(&self, other: &Coefficients, op: impl Fn(f32, f32) -> f32) -> Coefficients {
        self.pairwise_with_index(other, |a, b, _| op(a, b))
    }

    pub fn pairwise_in_place(&mut self, other: &Coefficients, op: impl Fn(f32, f32) -> f32) {
        self.pairwise_in_place_with_index(other, |a, b, _| op(a, b));
    }

    /// Like [`Coefficients::pairwise`], but `op` also receives the index.
    pub fn pairwise_with_index(
        &self,
        other: &Coefficients,
        op: impl Fn(f32, f32, i32) -> f32,
    ) -> Coefficients {
        self.check_shape(other);
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .enumerate()
            .map(|(i, (&a, &b))| op(a, b, self.index_from + i as i32))
            .collect::<Vec<_>>();
        Self::new(values, self.index_from)
    }

    pub fn pairwise_in_place_with_index(
        &mut self,
        other: &Coefficients,
        op: impl Fn(f32, f32, i32) -> f32,
    ) {
        self.check_shape(other);
        let from = self.index_from;
        for (i, (a, &b)) in self.values.iter_mut().zip(&other.values).enumerate() {
            *a = op(*a, b, from + i as i32);
        }
    }

    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Read-only view of the same values with a different origin.
    pub fn reindex(&self, index_from: i32) -> CoefficientsView<'_> {
        CoefficientsView {
            values: &self.values,
            index_from,
        }
    }

    /// Mutable view of the same values with a different origin. Writes through
    /// the view land in this vector.
    pub fn reindex_mut(&mut self, index_from: i32) -> CoefficientsViewMut<'_> {
        CoefficientsViewMut {
            values: &mut self.values,
            index_from,
        }
    }
}

/// Borrowed, re-originated view over a [`Coefficients`].
#[derive(Debug, Clone, Copy)]
pub struct CoefficientsView<'a> {
    values: &'a [f32],
    index_from: i32,
}

impl CoefficientsView<'_> {
    pub fn get(&self, index: i32) -> f32 {
        self.values[offset(self.index_from, self.values.len(), index)]
    }

    pub fn index_from(&self) -> i32 {
        self.index_from
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_coefficients(&self) -> Coefficients {
        Coefficients::new(self.values.to_vec(), self.index_from)
    }
}

/// Mutable counterpart of [`CoefficientsView`].
#[derive(Debug)]
pub struct CoefficientsViewMut<'a> {
    values: &'a mut [f32],
    index_from: i32,
}

impl CoefficientsViewMut<'_> {
    pub fn get(&self, index: i32) -> f32 {
        self.values[offset(self.index_from, self.values.len(), index)]
    }

    pub fn set(&mut self, index: i32, value: f32) {
        let i = offset(self.index_from, self.values.len(), index);
        self.values[i] = value;
    }

    pub fn scalar_at(&mut self, index: i32, op: impl FnOnce(f32) -> f32) {
        let i = offset(self.index_from, self.values.len(), index);
        self.values[i] = op(self.values[i]);
    }

    pub fn index_from(&self) -> i32 {
        self.index_from
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_translates_origin() {
        let coe = Coefficients::new(vec![1.0, 2.0, 3.0], 1);
        assert_eq!(coe.get(1), 1.0);
        assert_eq!(coe.get(3), 3.0);
        assert_eq!(coe.index_to(), 3);
        assert_eq!(coe.try_get(0), None);
        assert_eq!(coe.try_get(4), None);
    }

    #[test]
    fn test_negative_origin() {
        let mut coe = Coefficients::zeroed(6, -1);
        coe.set(-1, 5.0);
        coe.set(4, 9.0);
        assert_eq!(coe.as_slice(), &[5.0, 0.0, 0.0, 0.0, 0.0, 9.0]);
    }

    #[test]
    #[should_panic(expected = "outside the coefficient range")]
    fn test_get_below_origin_panics() {
        let coe = Coefficients::new(vec![1.0, 2.0], 1);
        coe.get(0);
    }

    #[test]
    #[should_panic(expected = "outside the coefficient range")]
    fn test_set_past_end_panics() {
        let mut coe = Coefficients::new(vec![1.0, 2.0], 0);
        coe.set(2, 1.0);
    }

    #[test]
    fn test_pairwise_and_scalar() {
        let a = Coefficients::new(vec![1.0, 2.0, 3.0], 0);
        let b = Coefficients::new(vec![10.0, 20.0, 30.0], 0);
        assert_eq!(a.pairwise(&b, |x, y| x + y).as_slice(), &[11.0, 22.0, 33.0]);
        assert_eq!(a.scalar(|x| x * 2.0).as_slice(), &[2.0, 4.0, 6.0]);

        let mut c = a.clone();
        c.pairwise_in_place_with_index(&b, |x, y, i| if i == 1 { y } else { x });
        assert_eq!(c.as_slice(), &[1.0, 20.0, 3.0]);
        assert_eq!(c.index_from(), 0);
    }

    #[test]
    #[should_panic(expected = "mismatched vectors")]
    fn test_pairwise_origin_mismatch_panics() {
        let a = Coefficients::new(vec![1.0, 2.0], 0);
        let b = Coefficients::new(vec![1.0, 2.0], 1);
        a.pairwise(&b, |x, y| x + y);
    }

    #[test]
    fn test_reindex_view_shares_storage() {
        let mut coe = Coefficients::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], -1);
        {
            let mut view = coe.reindex_mut(0);
            assert_eq!(view.get(0), 1.0);
            view.set(5, 60.0);
            view.scalar_at(0, |x| x + 10.0);
        }
        assert_eq!(coe.get(4), 60.0);
        assert_eq!(coe.get(-1), 11.0);

        let view = coe.reindex(1);
        assert_eq!(view.get(1), 11.0);
        assert_eq!(view.to_coefficients().index_from(), 1);
    }

    proptest! {
        #[test]
        fn prop_get_succeeds_only_inside_range(
            origin in -5i32..5,
            len in 1usize..10,
            index in -20i32..20,
        ) {
            let coe = Coefficients::filled(len, 1.0, origin);
            let inside = origin <= index && index <= origin + len as i32 - 1;
            prop_assert_eq!(coe.try_get(index).is_some(), inside);
            let result = std::panic::catch_unwind(|| coe.get(index));
            prop_assert_eq!(result.is_ok(), inside);
        }
    }
}
