/// Fixed-length buffer with an explicit creation flag and a single release point.
///
/// Memory is only reclaimed through [`PersistentBuffer::release`]; the store
/// tracks which buffers were created so conditional resources are never
/// released twice or released without having been allocated.
#[derive(Debug, Clone)]
pub struct PersistentBuffer<T> {
    data: Option<Box<[T]>>,
}

impl<T> Default for PersistentBuffer<T> {
    fn default() -> Self {
        Self::unallocated()
    }
}

impl<T> PersistentBuffer<T> {
    /// A buffer that has not been allocated yet.
    pub fn unallocated() -> Self {
        Self { data: None }
    }

    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            data: Some(values.into_boxed_slice()),
        }
    }

    pub fn is_created(&self) -> bool {
        self.data.is_some()
    }

    /// Number of elements; zero while unallocated.
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, |data| data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The contents, or `None` while unallocated.
    pub fn get(&self) -> Option<&[T]> {
        self.data.as_deref()
    }

    pub fn as_slice(&self) -> &[T] {
        debug_assert!(self.is_created(), "buffer read before allocation");
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        debug_assert!(self.is_created(), "buffer written before allocation");
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    /// Frees the memory. Returns `true` if there was anything to free.
    pub fn release(&mut self) -> bool {
        debug_assert!(self.is_created(), "release of a buffer that was never allocated");
        self.data.take().is_some()
    }
}

impl<T: Clone + Default> PersistentBuffer<T> {
    /// Allocates `len` default-initialized elements.
    pub fn allocate(len: usize) -> Self {
        Self::from_vec(vec![T::default(); len])
    }
}

impl<T: Copy> PersistentBuffer<T> {
    pub fn from_slice(values: &[T]) -> Self {
        Self {
            data: Some(values.into()),
        }
    }

    /// Allocates this buffer as a copy of `source` unless it already exists.
    /// Returns whether an allocation happened.
    pub fn allocate_copy_of(&mut self, source: &[T]) -> bool {
        if self.is_created() {
            return false;
        }
        self.data = Some(source.into());
        true
    }

    /// Element-wise bulk copy. Both sides must have the same length.
    pub fn copy_from(&mut self, source: &[T]) {
        debug_assert!(self.is_created(), "copy into a buffer that was never allocated");
        debug_assert_eq!(self.len(), source.len(), "buffer length mismatch");
        self.as_mut_slice().copy_from_slice(source);
    }
}
