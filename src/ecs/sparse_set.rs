//! Generic sparse-set component table
//!
//! Dense rows are packed; a sparse map turns an entity slot into a row index.
//! Removal only clears the sparse entry. Dead rows stay in place until
//! `compact` copies the live rows forward through a shadow buffer.

use super::EntityId;

#[derive(Debug)]
pub struct SparseSet<T> {
    ids: Vec<EntityId>,
    dense: Vec<T>,
    sparse: Vec<Option<usize>>,
    shadow_ids: Vec<EntityId>,
    shadow: Vec<T>,
}

/// Snapshots carry the live tables only; shadow buffers start empty
impl<T: Clone> Clone for SparseSet<T> {
    fn clone(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            dense: self.dense.clone(),
            sparse: self.sparse.clone(),
            shadow_ids: Vec::new(),
            shadow: Vec::new(),
        }
    }
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            dense: Vec::new(),
            sparse: Vec::new(),
            shadow_ids: Vec::new(),
            shadow: Vec::new(),
        }
    }
}

impl<T> SparseSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            sparse: Vec::with_capacity(capacity),
            shadow_ids: Vec::with_capacity(capacity),
            shadow: Vec::with_capacity(capacity),
        }
    }

    /// Row currently owned by `id`, if any
    #[inline]
    fn row_of(&self, id: EntityId) -> Option<usize> {
        let row = (*self.sparse.get(id.slot())?)?;
        (self.ids.get(row) == Some(&id)).then_some(row)
    }

    #[inline]
    fn row_is_live(sparse: &[Option<usize>], id: EntityId, row: usize) -> bool {
        sparse.get(id.slot()) == Some(&Some(row))
    }

    /// Insert or overwrite the component for `id`
    pub fn insert(&mut self, id: EntityId, value: T) {
        if let Some(row) = self.row_of(id) {
            self.dense[row] = value;
            return;
        }
        if id.slot() >= self.sparse.len() {
            self.sparse.resize(id.slot() + 1, None);
        }
        self.sparse[id.slot()] = Some(self.dense.len());
        self.ids.push(id);
        self.dense.push(value);
    }

    /// Detach `id`; its row lingers until the next compaction
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.row_of(id) {
            Some(_) => {
                self.sparse[id.slot()] = None;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.row_of(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.row_of(id).map(|row| &self.dense[row])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.row_of(id).map(|row| &mut self.dense[row])
    }

    /// Live rows in dense order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        let sparse = &self.sparse;
        self.ids
            .iter()
            .zip(self.dense.iter())
            .enumerate()
            .filter(move |(row, (id, _))| Self::row_is_live(sparse, **id, *row))
            .map(|(_, (id, value))| (*id, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        let sparse = &self.sparse;
        self.ids
            .iter()
            .zip(self.dense.iter_mut())
            .enumerate()
            .filter(move |(row, (id, _))| Self::row_is_live(sparse, **id, *row))
            .map(|(_, (id, value))| (*id, value))
    }

    /// Number of live rows
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical rows, including dead ones awaiting compaction
    pub fn dense_len(&self) -> usize {
        self.dense.len()
    }

    /// Every row is live and every sparse entry points at a row owned by its slot
    pub fn is_compact(&self) -> bool {
        let rows_live = self
            .ids
            .iter()
            .enumerate()
            .all(|(row, id)| Self::row_is_live(&self.sparse, *id, row));
        let sparse_valid = self.sparse.iter().enumerate().all(|(slot, entry)| match entry {
            Some(row) => self.ids.get(*row).is_some_and(|id| id.slot() == slot),
            None => true,
        });
        rows_live && sparse_valid && self.ids.len() == self.dense.len()
    }
}

impl<T: Clone> SparseSet<T> {
    /// Drop dead rows by copying live rows forward through the shadow buffer.
    ///
    /// The sparse map is rewritten as rows move, so afterwards no dense row
    /// belongs to a removed id.
    pub fn compact(&mut self) {
        std::mem::swap(&mut self.ids, &mut self.shadow_ids);
        std::mem::swap(&mut self.dense, &mut self.shadow);
        self.ids.clear();
        self.dense.clear();

        for (row, (id, value)) in self.shadow_ids.iter().zip(self.shadow.iter()).enumerate() {
            if Self::row_is_live(&self.sparse, *id, row) {
                self.sparse[id.slot()] = Some(self.dense.len());
                self.ids.push(*id);
                self.dense.push(value.clone());
            }
        }
    }
}
