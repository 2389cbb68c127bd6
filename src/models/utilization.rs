use serde::{Deserialize, Serialize};

use super::coefficients::Coefficients;
use crate::error::YieldError;

/// Tree diameter bands used as the semantic index of a [`UtilizationVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UtilizationClass {
    Small,
    All,
    U75To125,
    U125To175,
    U175To225,
    Over225,
}

impl UtilizationClass {
    /// Every class in index order.
    pub const ALL_CLASSES: [UtilizationClass; 6] = [
        UtilizationClass::Small,
        UtilizationClass::All,
        UtilizationClass::U75To125,
        UtilizationClass::U125To175,
        UtilizationClass::U175To225,
        UtilizationClass::Over225,
    ];

    /// The four real size bands at or above 7.5 cm.
    pub const UTIL_CLASSES: [UtilizationClass; 4] = [
        UtilizationClass::U75To125,
        UtilizationClass::U125To175,
        UtilizationClass::U175To225,
        UtilizationClass::Over225,
    ];

    pub const ALL_BUT_SMALL: [UtilizationClass; 5] = [
        UtilizationClass::All,
        UtilizationClass::U75To125,
        UtilizationClass::U125To175,
        UtilizationClass::U175To225,
        UtilizationClass::Over225,
    ];

    pub const ALL_BANDS_BUT_LARGEST: [UtilizationClass; 3] = [
        UtilizationClass::U75To125,
        UtilizationClass::U125To175,
        UtilizationClass::U175To225,
    ];

    pub fn index(self) -> i32 {
        match self {
            UtilizationClass::Small => -1,
            UtilizationClass::All => 0,
            UtilizationClass::U75To125 => 1,
            UtilizationClass::U125To175 => 2,
            UtilizationClass::U175To225 => 3,
            UtilizationClass::Over225 => 4,
        }
    }

    /// Lower diameter bound in centimetres.
    pub fn low_bound(self) -> f32 {
        match self {
            UtilizationClass::Small => 0.0,
            UtilizationClass::All | UtilizationClass::U75To125 => 7.5,
            UtilizationClass::U125To175 => 12.5,
            UtilizationClass::U175To225 => 17.5,
            UtilizationClass::Over225 => 22.5,
        }
    }

    /// Upper diameter bound in centimetres.
    pub fn high_bound(self) -> f32 {
        match self {
            UtilizationClass::Small => 7.5,
            UtilizationClass::U75To125 => 12.5,
            UtilizationClass::U125To175 => 17.5,
            UtilizationClass::U175To225 => 22.5,
            UtilizationClass::All | UtilizationClass::Over225 => 10000.0,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            UtilizationClass::Small => "<7.5 cm",
            UtilizationClass::All => "7.5+ cm",
            UtilizationClass::U75To125 => "7.5-12.5 cm",
            UtilizationClass::U125To175 => "12.5-17.5 cm",
            UtilizationClass::U175To225 => "17.5-22.5 cm",
            UtilizationClass::Over225 => "22.5+ cm",
        }
    }

    pub fn next(self) -> Option<UtilizationClass> {
        Self::from_index(self.index() + 1).ok()
    }

    pub fn previous(self) -> Option<UtilizationClass> {
        Self::from_index(self.index() - 1).ok()
    }

    pub fn from_index(index: i32) -> Result<UtilizationClass, YieldError> {
        Self::ALL_CLASSES
            .into_iter()
            .find(|uc| uc.index() == index)
            .ok_or_else(|| YieldError::UnknownUtilizationClass(index.to_string()))
    }

    pub fn is_band(self) -> bool {
        Self::UTIL_CLASSES.contains(&self)
    }
}

impl std::fmt::Display for UtilizationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

impl std::str::FromStr for UtilizationClass {
    type Err = YieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map_err(|_| YieldError::UnknownUtilizationClass(s.to_string()))
            .and_then(Self::from_index)
    }
}

/// A stand attribute broken down by utilization class.
///
/// The full form has six slots indexed SMALL (-1) through OVER225 (4). The
/// height form only has SMALL and ALL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct UtilizationVector {
    coefficients: Coefficients,
}

impl Default for UtilizationVector {
    fn default() -> Self {
        Self::filled(f32::NAN)
    }
}

impl UtilizationVector {
    /// All six slots set to `value`.
    pub fn filled(value: f32) -> Self {
        Self {
            coefficients: Coefficients::filled(6, value, UtilizationClass::Small.index()),
        }
    }

    pub fn zeroed() -> Self {
        Self::filled(0.0)
    }

    /// Vector with ALL set and every other slot zero.
    pub fn with_all(all: f32) -> Self {
        let mut v = Self::zeroed();
        v.set_all(all);
        v
    }

    /// Build from values in index order SMALL, ALL, then the four bands.
    pub fn from_values(values: [f32; 6]) -> Self {
        Self {
            coefficients: Coefficients::new(values.to_vec(), UtilizationClass::Small.index()),
        }
    }

    /// Two-slot SMALL/ALL vector used for lorey height.
    pub fn heights(small: f32, all: f32) -> Self {
        Self {
            coefficients: Coefficients::new(vec![small, all], UtilizationClass::Small.index()),
        }
    }

    pub fn get(&self, uc: UtilizationClass) -> f32 {
        self.coefficients.get(uc.index())
    }

    pub fn set(&mut self, uc: UtilizationClass, value: f32) {
        self.coefficients.set(uc.index(), value);
    }

    pub fn scalar_at(&mut self, uc: UtilizationClass, op: impl FnOnce(f32) -> f32) {
        self.coefficients.scalar_at(uc.index(), op);
    }

    pub fn all(&self) -> f32 {
        self.get(UtilizationClass::All)
    }

    pub fn set_all(&mut self, value: f32) {
        self.set(UtilizationClass::All, value);
    }

    pub fn small(&self) -> f32 {
        self.get(UtilizationClass::Small)
    }

    pub fn set_small(&mut self, value: f32) {
        self.set(UtilizationClass::Small, value);
    }

    /// Sum of the four real bands.
    pub fn band_sum(&self) -> f32 {
        UtilizationClass::UTIL_CLASSES
            .iter()
            .map(|&uc| self.get(uc))
            .sum()
    }

    /// Copy values from `other` for the classes `select` accepts.
    pub fn copy_from(&mut self, other: &UtilizationVector, select: impl Fn(UtilizationClass) -> bool) {
        self.coefficients
            .pairwise_in_place_with_index(&other.coefficients, |old, new, index| {
                match UtilizationClass::from_index(index) {
                    Ok(uc) if select(uc) => new,
                    _ => old,
                }
            });
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn coefficients_mut(&mut self) -> &mut Coefficients {
        &mut self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

impl TryFrom<Vec<f32>> for UtilizationVector {
    type Error = String;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        match values.len() {
            2 | 6 => Ok(Self {
                coefficients: Coefficients::new(values, UtilizationClass::Small.index()),
            }),
            n => Err(format!(
                "a utilization vector needs 6 values (or 2 for heights) but {n} were given"
            )),
        }
    }
}

impl From<UtilizationVector> for Vec<f32> {
    fn from(v: UtilizationVector) -> Self {
        v.coefficients.as_slice().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_by_index() {
        for uc in UtilizationClass::ALL_CLASSES {
            assert_eq!(UtilizationClass::from_index(uc.index()).unwrap(), uc);
            assert_eq!(uc.index().to_string().parse::<UtilizationClass>().unwrap(), uc);
        }
    }

    #[test]
    fn test_unknown_index_names_input() {
        let err = UtilizationClass::from_index(5).unwrap_err();
        assert_eq!(err.to_string(), "UtilizationClass index 5 is not recognized");
        let err = "-2".parse::<UtilizationClass>().unwrap_err();
        assert_eq!(err.to_string(), "UtilizationClass index -2 is not recognized");
        let err = "big".parse::<UtilizationClass>().unwrap_err();
        assert_eq!(err.to_string(), "UtilizationClass index big is not recognized");
    }

    #[test]
    fn test_adjacency_symmetry() {
        for uc in UtilizationClass::ALL_CLASSES {
            if let Some(next) = uc.next() {
                assert_eq!(next.previous(), Some(uc));
            }
            if let Some(previous) = uc.previous() {
                assert_eq!(previous.next(), Some(uc));
            }
        }
        assert_eq!(UtilizationClass::Small.previous(), None);
        assert_eq!(UtilizationClass::Over225.next(), None);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(UtilizationClass::U75To125.low_bound(), 7.5);
        assert_eq!(UtilizationClass::U75To125.high_bound(), 12.5);
        assert_eq!(UtilizationClass::Over225.low_bound(), 22.5);
        assert_eq!(UtilizationClass::Over225.high_bound(), 10000.0);
        assert!(UtilizationClass::U175To225.is_band());
        assert!(!UtilizationClass::All.is_band());
    }

    #[test]
    fn test_vector_defaults_to_nan() {
        let v = UtilizationVector::default();
        assert_eq!(v.len(), 6);
        assert!(v.all().is_nan());
        assert!(v.get(UtilizationClass::Over225).is_nan());
    }

    #[test]
    fn test_vector_access_by_class() {
        let mut v = UtilizationVector::zeroed();
        v.set(UtilizationClass::U125To175, 3.0);
        v.set(UtilizationClass::Over225, 4.0);
        v.set_all(7.0);
        assert_eq!(v.coefficients().get(2), 3.0);
        assert_eq!(v.band_sum(), 7.0);
        assert_eq!(v.all(), 7.0);
    }

    #[test]
    fn test_copy_from_bands_only() {
        let mut target = UtilizationVector::filled(1.0);
        let source = UtilizationVector::filled(2.0);
        target.copy_from(&source, UtilizationClass::is_band);
        assert_eq!(target.small(), 1.0);
        assert_eq!(target.all(), 1.0);
        assert_eq!(target.band_sum(), 8.0);
    }

    #[test]
    #[should_panic]
    fn test_height_vector_has_no_bands() {
        let v = UtilizationVector::heights(1.0, 2.0);
        v.get(UtilizationClass::U75To125);
    }

    #[test]
    fn test_serde_as_array() {
        let v = UtilizationVector::from_values([0.0, 1.0, 0.25, 0.25, 0.25, 0.25]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[0.0,1.0,0.25,0.25,0.25,0.25]");
        let back: UtilizationVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<UtilizationVector>("[1.0,2.0,3.0]").is_err());
    }
}
