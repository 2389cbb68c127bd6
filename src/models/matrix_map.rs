use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// One ordered key domain of a matrix map.
#[derive(Debug, Clone)]
pub struct Dimension<K> {
    keys: Vec<K>,
    positions: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> Dimension<K> {
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        for key in keys {
            if !positions.contains_key(&key) {
                positions.insert(key.clone(), ordered.len());
                ordered.push(key);
            }
        }
        Self {
            keys: ordered,
            positions,
        }
    }

    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.positions.get(key).copied()
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.positions.contains_key(key)
    }
}

/// Dense N-ary table addressed by per-dimension positions.
///
/// The flat index is a mixed-radix encoding of the positions, first dimension
/// most significant. Storage size is the product of the dimension sizes.
#[derive(Debug, Clone)]
pub struct MatrixMap<V> {
    radices: Vec<usize>,
    values: Vec<Option<V>>,
}

impl<V> MatrixMap<V> {
    pub fn new(radices: Vec<usize>) -> Self {
        let size = radices.iter().product();
        let mut values = Vec::with_capacity(size);
        values.resize_with(size, || None);
        Self { radices, values }
    }

    fn flat_index(&self, positions: &[usize]) -> Option<usize> {
        if positions.len() != self.radices.len() {
            return None;
        }
        let mut index = 0;
        for (&p, &radix) in positions.iter().zip(&self.radices) {
            if p >= radix {
                return None;
            }
            index = index * radix + p;
        }
        Some(index)
    }

    fn positions_of(&self, mut flat: usize) -> Vec<usize> {
        let mut positions = vec![0; self.radices.len()];
        for (slot, &radix) in positions.iter_mut().zip(&self.radices).rev() {
            *slot = flat % radix;
            flat /= radix;
        }
        positions
    }

    pub fn get(&self, positions: &[usize]) -> Option<&V> {
        self.flat_index(positions)
            .and_then(|i| self.values[i].as_ref())
    }

    pub fn get_mut(&mut self, positions: &[usize]) -> Option<&mut V> {
        self.flat_index(positions)
            .and_then(move |i| self.values[i].as_mut())
    }

    /// Store `value`, returning the previous entry.
    ///
    /// Panics when the positions lie outside the declared domains.
    pub fn put(&mut self, positions: &[usize], value: V) -> Option<V> {
        let Some(i) = self.flat_index(positions) else {
            panic!(
                "positions {positions:?} are outside the matrix map domain {:?}",
                self.radices
            );
        };
        self.values[i].replace(value)
    }

    /// Total number of slots.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// True if any populated entry matches.
    pub fn any(&self, pred: impl Fn(&V) -> bool) -> bool {
        self.values.iter().flatten().any(pred)
    }

    /// True if every slot is populated and matches.
    pub fn all(&self, pred: impl Fn(&V) -> bool) -> bool {
        self.values.iter().all(|v| v.as_ref().is_some_and(&pred))
    }

    /// Fill every slot from the positions it sits at.
    pub fn set_all(&mut self, mut f: impl FnMut(&[usize]) -> V) {
        for i in 0..self.values.len() {
            let positions = self.positions_of(i);
            self.values[i] = Some(f(&positions));
        }
    }

    /// Visit the positions of every slot, populated or not.
    pub fn each_key(&self, mut f: impl FnMut(&[usize], Option<&V>)) {
        for (i, value) in self.values.iter().enumerate() {
            f(&self.positions_of(i), value.as_ref());
        }
    }
}

/// Two-key facade over [`MatrixMap`].
#[derive(Debug, Clone)]
pub struct MatrixMap2<K1, K2, V> {
    d1: Dimension<K1>,
    d2: Dimension<K2>,
    map: MatrixMap<V>,
}

impl<K1, K2, V> MatrixMap2<K1, K2, V>
where
    K1: Eq + Hash + Clone,
    K2: Eq + Hash + Clone,
{
    pub fn new(k1: impl IntoIterator<Item = K1>, k2: impl IntoIterator<Item = K2>) -> Self {
        let d1 = Dimension::new(k1);
        let d2 = Dimension::new(k2);
        let map = MatrixMap::new(vec![d1.len(), d2.len()]);
        Self { d1, d2, map }
    }

    /// Map with every combination populated by `default`.
    pub fn with_default(
        k1: impl IntoIterator<Item = K1>,
        k2: impl IntoIterator<Item = K2>,
        default: impl Fn(&K1, &K2) -> V,
    ) -> Self {
        let mut result = Self::new(k1, k2);
        result.set_all(default);
        result
    }

    fn positions<Q1, Q2>(&self, k1: &Q1, k2: &Q2) -> Option<[usize; 2]>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Eq + Hash + ?Sized,
        Q2: Eq + Hash + ?Sized,
    {
        Some([self.d1.position(k1)?, self.d2.position(k2)?])
    }

    pub fn get<Q1, Q2>(&self, k1: &Q1, k2: &Q2) -> Option<&V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Eq + Hash + ?Sized,
        Q2: Eq + Hash + ?Sized,
    {
        self.positions(k1, k2).and_then(|p| self.map.get(&p))
    }

    pub fn get_mut<Q1, Q2>(&mut self, k1: &Q1, k2: &Q2) -> Option<&mut V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Eq + Hash + ?Sized,
        Q2: Eq + Hash + ?Sized,
    {
        let p = self.positions(k1, k2)?;
        self.map.get_mut(&p)
    }

    pub fn contains_keys<Q1, Q2>(&self, k1: &Q1, k2: &Q2) -> bool
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Eq + Hash + ?Sized,
        Q2: Eq + Hash + ?Sized,
    {
        self.d1.contains(k1) && self.d2.contains(k2)
    }

    /// Panics when a key lies outside its declared domain.
    pub fn put(&mut self, k1: K1, k2: K2, value: V) -> Option<V> {
        let p = [
            self.d1.position(&k1).unwrap_or(usize::MAX),
            self.d2.position(&k2).unwrap_or(usize::MAX),
        ];
        self.map.put(&p, value)
    }

    pub fn set_all(&mut self, f: impl Fn(&K1, &K2) -> V) {
        let (d1, d2) = (&self.d1, &self.d2);
        self.map.set_all(|p| f(&d1.keys[p[0]], &d2.keys[p[1]]));
    }

    pub fn each_key(&self, mut f: impl FnMut(&K1, &K2, Option<&V>)) {
        self.map
            .each_key(|p, v| f(&self.d1.keys[p[0]], &self.d2.keys[p[1]], v));
    }

    pub fn keys1(&self) -> &[K1] {
        self.d1.keys()
    }

    pub fn keys2(&self) -> &[K2] {
        self.d2.keys()
    }

    pub fn is_full(&self) -> bool {
        self.map.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn any(&self, pred: impl Fn(&V) -> bool) -> bool {
        self.map.any(pred)
    }

    pub fn all(&self, pred: impl Fn(&V) -> bool) -> bool {
        self.map.all(pred)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn size(&self) -> usize {
        self.map.size()
    }
}

/// Three-key facade over [`MatrixMap`].
#[derive(Debug, Clone)]
pub struct MatrixMap3<K1, K2, K3, V> {
    d1: Dimension<K1>,
    d2: Dimension<K2>,
    d3: Dimension<K3>,
    map: MatrixMap<V>,
}

impl<K1, K2, K3, V> MatrixMap3<K1, K2, K3, V>
where
    K1: Eq + Hash + Clone,
    K2: Eq + Hash + Clone,
    K3: Eq + Hash + Clone,
{
    pub fn new(
        k1: impl IntoIterator<Item = K1>,
        k2: impl IntoIterator<Item = K2>,
        k3: impl IntoIterator<Item = K3>,
    ) -> Self {
        let d1 = Dimension::new(k1);
        let d2 = Dimension::new(k2);
        let d3 = Dimension::new(k3);
        let map = MatrixMap::new(vec![d1.len(), d2.len(), d3.len()]);
        Self { d1, d2, d3, map }
    }

    pub fn with_default(
        k1: impl IntoIterator<Item = K1>,
        k2: impl IntoIterator<Item = K2>,
        k3: impl IntoIterator<Item = K3>,
        default: impl Fn(&K1, &K2, &K3) -> V,
    ) -> Self {
        let mut result = Self::new(k1, k2, k3);
        result.set_all(default);
        result
    }

    fn positions<Q1, Q2, Q3>(&self, k1: &Q1, k2: &Q2, k3: &Q3) -> Option<[usize; 3]>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        K3: Borrow<Q3>,
        Q1: Eq + Hash + ?Sized,
        Q2: Eq + Hash + ?Sized,
        Q3: Eq + Hash + ?Sized,
    {
        Some([
            self.d1.position(k1)?,
            self.d2.position(k2)?,
            self.d3.position(k3)?,
        ])
    }

    pub fn get<Q1, Q2, Q3>(&self, k1: &Q1, k2: &Q2, k3: &Q3) -> Option<&V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        K3: Borrow<Q3>,
        Q1: Eq + Hash + ?Sized,
        Q2: Eq + Hash + ?Sized,
        Q3: Eq + Hash + ?Sized,
    {
        self.positions(k1, k2, k3).and_then(|p| self.map.get(&p))
    }

    pub fn get_mut<Q1, Q2, Q3>(&mut self, k1: &Q1, k2: &Q2, k3: &Q3) -> Option<&mut V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        K3: Borrow<Q3>,
        Q1: Eq + Hash + ?Sized,
        Q2: Eq + Hash + ?Sized,
        Q3: Eq + Hash + ?Sized,
    {
        let p = self.positions(k1, k2, k3)?;
        self.map.get_mut(&p)
    }

    /// Panics when a key lies outside its declared domain.
    pub fn put(&mut self, k1: K1, k2: K2, k3: K3, value: V) -> Option<V> {
        let p = [
            self.d1.position(&k1).unwrap_or(usize::MAX),
            self.d2.position(&k2).unwrap_or(usize::MAX),
            self.d3.position(&k3).unwrap_or(usize::MAX),
        ];
        self.map.put(&p, value)
    }

    pub fn set_all(&mut self, f: impl Fn(&K1, &K2, &K3) -> V) {
        let (d1, d2, d3) = (&self.d1, &self.d2, &self.d3);
        self.map
            .set_all(|p| f(&d1.keys[p[0]], &d2.keys[p[1]], &d3.keys[p[2]]));
    }

    pub fn each_key(&self, mut f: impl FnMut(&K1, &K2, &K3, Option<&V>)) {
        self.map.each_key(|p, v| {
            f(
                &self.d1.keys[p[0]],
                &self.d2.keys[p[1]],
                &self.d3.keys[p[2]],
                v,
            )
        });
    }

    pub fn is_full(&self) -> bool {
        self.map.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn any(&self, pred: impl Fn(&V) -> bool) -> bool {
        self.map.any(pred)
    }

    pub fn all(&self, pred: impl Fn(&V) -> bool) -> bool {
        self.map.all(pred)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn size(&self) -> usize {
        self.map.size()
    }
}

/// Four-key facade over [`MatrixMap`].
#[derive(Debug, Clone)]
pub struct MatrixMap4<K1, K2, K3, K4, V> {
    d1: Dimension<K1>,
    d2: Dimension<K2>,
    d3: Dimension<K3>,
    d4: Dimension<K4>,
    map: MatrixMap<V>,
}

impl<K1, K2, K3, K4, V> MatrixMap4<K1, K2, K3, K4, V>
where
    K1: Eq + Hash + Clone,
    K2: Eq + Hash + Clone,
    K3: Eq + Hash + Clone,
    K4: Eq + Hash + Clone,
{
    pub fn new(
        k1: impl IntoIterator<Item = K1>,
        k2: impl IntoIterator<Item = K2>,
        k3: impl IntoIterator<Item = K3>,
        k4: impl IntoIterator<Item = K4>,
    ) -> Self {
        let d1 = Dimension::new(k1);
        let d2 = Dimension::new(k2);
        let d3 = Dimension::new(k3);
        let d4 = Dimension::new(k4);
        let map = MatrixMap::new(vec![d1.len(), d2.len(), d3.len(), d4.len()]);
        Self {
            d1,
            d2,
            d3,
            d4,
            map,
        }
    }

    pub fn get(&self, k1: &K1, k2: &K2, k3: &K3, k4: &K4) -> Option<&V> {
        let p = [
            self.d1.position(k1)?,
            self.d2.position(k2)?,
            self.d3.position(k3)?,
            self.d4.position(k4)?,
        ];
        self.map.get(&p)
    }

    /// Panics when a key lies outside its declared domain.
    pub fn put(&mut self, k1: K1, k2: K2, k3: K3, k4: K4, value: V) -> Option<V> {
        let p = [
            self.d1.position(&k1).unwrap_or(usize::MAX),
            self.d2.position(&k2).unwrap_or(usize::MAX),
            self.d3.position(&k3).unwrap_or(usize::MAX),
            self.d4.position(&k4).unwrap_or(usize::MAX),
        ];
        self.map.put(&p, value)
    }

    pub fn set_all(&mut self, f: impl Fn(&K1, &K2, &K3, &K4) -> V) {
        let (d1, d2, d3, d4) = (&self.d1, &self.d2, &self.d3, &self.d4);
        self.map.set_all(|p| {
            f(
                &d1.keys[p[0]],
                &d2.keys[p[1]],
                &d3.keys[p[2]],
                &d4.keys[p[3]],
            )
        });
    }

    pub fn is_full(&self) -> bool {
        self.map.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn size(&self) -> usize {
        self.map.size()
    }
}
