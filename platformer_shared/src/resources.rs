//! Resource caches.
//!
//! Caches are plain values owned by whoever sets up a session (usually the
//! client) and passed to the level loader. There is no global cache; dropping
//! the owner drops every resource it loaded.

use std::{collections::HashMap, fmt, hash::Hash, marker::PhantomData, sync::Arc};

use serde::{Deserialize, Serialize};

/// Typed resource handle.
pub struct Handle<T> {
    id: u64,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

/// Sprite atlas description. Pixel data lives with the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub path: String,
    /// Atlas columns, addressed with `shear_x`.
    pub columns: u32,
    /// Atlas rows, addressed with `shear_y`.
    pub rows: u32,
}

impl SpriteSheet {
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            columns: 1,
            rows: 1,
        }
    }
}

/// Name-keyed cache: loading the same name twice yields the same handle.
pub struct ResourceCache<T> {
    next_id: u64,
    by_name: HashMap<String, Handle<T>>,
    items: HashMap<u64, Arc<T>>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            by_name: HashMap::new(),
            items: HashMap::new(),
        }
    }
}

impl<T> ResourceCache<T> {
    /// Inserts a resource and returns a handle.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let id = self.next_id;
        self.next_id += 1;
        self.items.insert(id, Arc::new(value));
        Handle {
            id,
            _phantom: PhantomData,
        }
    }

    /// Returns the cached handle for `name`, building the resource on a miss.
    pub fn get_or_insert_with(&mut self, name: &str, build: impl FnOnce() -> T) -> Handle<T> {
        if let Some(h) = self.by_name.get(name) {
            return *h;
        }
        let h = self.insert(build());
        self.by_name.insert(name.to_string(), h);
        h
    }

    pub fn lookup(&self, name: &str) -> Option<Handle<T>> {
        self.by_name.get(name).copied()
    }

    /// Gets a resource by handle.
    pub fn get(&self, h: &Handle<T>) -> Option<Arc<T>> {
        self.items.get(&h.id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Every cache a session owns.
#[derive(Default)]
pub struct Resources {
    pub sprites: ResourceCache<SpriteSheet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_handle() {
        let mut cache = ResourceCache::<SpriteSheet>::default();
        let a = cache.get_or_insert_with("player", || SpriteSheet::single("player.png"));
        let b = cache.get_or_insert_with("player", || panic!("must not rebuild"));
        let c = cache.get_or_insert_with("crate", || SpriteSheet::single("crate.png"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a).unwrap().path, "player.png");
        assert_eq!(cache.lookup("crate"), Some(c));
    }
}
