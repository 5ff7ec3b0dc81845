use std::{fmt, hash::Hash, marker::PhantomData, num::NonZeroU32, rc::Rc};

use rustc_hash::FxHashMap;

/// A handle to some interned value of type `T`. To retrieve a `&T`, use
/// [`Interner::get`].
///
/// Two handles from the same interner are equal iff the interned values are
/// equal.
pub struct Interned<T: ?Sized> {
    // Here we use a NonZeroU32 to leverage niche layout optimization.
    handle: NonZeroU32,
    _ty: PhantomData<T>,
}

/// An interned identifier or operator name.
pub type Symbol = Interned<str>;

impl<T: ?Sized> Interned<T> {
    const fn unchecked_new(handle: NonZeroU32) -> Self {
        Interned {
            handle,
            _ty: PhantomData,
        }
    }

    /// Zero-based position of this handle in its interner.
    pub fn index(self) -> usize {
        self.handle.get() as usize - 1
    }
}

impl<T: ?Sized> Copy for Interned<T> {}

impl<T: ?Sized> Clone for Interned<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for Interned<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: ?Sized> Eq for Interned<T> {}

impl<T: ?Sized> PartialOrd for Interned<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for Interned<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.handle.cmp(&other.handle)
    }
}

impl<T: ?Sized> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interned({})", self.handle)
    }
}

/// An append-only deduplicating store. Values are never removed, so handles
/// stay valid for the lifetime of the interner.
pub struct Interner<T: ?Sized> {
    map: FxHashMap<Rc<T>, NonZeroU32>,
    vec: Vec<Rc<T>>,
}

impl fmt::Debug for Interner<str> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (i, interned) in self.vec.iter().enumerate() {
            map.entry(&(i + 1), &interned);
        }
        map.finish()
    }
}

impl<T: ?Sized> Default for Interner<T> {
    fn default() -> Self {
        Interner::with_capacity(0)
    }
}

impl<T: ?Sized> Interner<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            vec: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Interns the provided value, returning a handle which can be used to
    /// retrieve it later.
    pub fn intern(&mut self, value: &T) -> Interned<T>
    where
        T: Eq + Hash + ToOwned,
        T::Owned: Into<Rc<T>>,
    {
        if let Some(handle) = self.map.get(value) {
            return Interned::unchecked_new(*handle);
        }
        let key: Rc<T> = value.to_owned().into();
        let len = u32::try_from(self.vec.len()).unwrap_or(u32::MAX - 1);
        let i = NonZeroU32::MIN.saturating_add(len);
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, i);
        Interned::unchecked_new(i)
    }

    /// Returns the handle of an already interned value, if any.
    pub fn find(&self, value: &T) -> Option<Interned<T>>
    where
        T: Eq + Hash,
    {
        self.map.get(value).map(|h| Interned::unchecked_new(*h))
    }

    /// Returns the corresponding value for the provided [`Interned`] handle.
    /// Panics if the handle comes from another interner.
    pub fn get(&self, handle: Interned<T>) -> &T {
        &self.vec[handle.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner() {
        let mut i = Interner::<str>::with_capacity(3);

        let add1 = i.intern("+");
        let main1 = i.intern("main");
        let x1 = i.intern("x");

        let add2 = i.intern("+");
        let main2 = i.intern("main");
        let x2 = i.intern("x");

        assert_eq!(add1, add2);
        assert_eq!(main1, main2);
        assert_eq!(x1, x2);
        assert_ne!(add1, main1);
        assert_ne!(main1, x1);

        assert_eq!(i.get(main1), "main");
        assert_eq!(i.len(), 3);
        assert_eq!(i.find("x"), Some(x1));
        assert_eq!(i.find("y"), None);
    }

    #[test]
    fn interner_of_sized_values() {
        let mut i = Interner::<(u8, u8)>::default();
        let a = i.intern(&(1, 2));
        let b = i.intern(&(2, 1));
        assert_ne!(a, b);
        assert_eq!(a, i.intern(&(1, 2)));
        assert_eq!(*i.get(b), (2, 1));
    }
}
