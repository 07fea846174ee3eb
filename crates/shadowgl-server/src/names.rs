//! Client-local → driver name translation.
//!
//! Clients allocate object names locally and never wait for the driver. The server creates the
//! real objects and remembers which driver name stands behind each client name, so every call that
//! carries a name can be rewritten before it reaches the driver.

use std::collections::HashMap;
use std::hash::Hash;

use shadowgl_types::gl::GLuint;

use crate::sync::{lock, Mutex};

/// Plain associative map with insert / lookup / remove / take.
///
/// Values are dropped when removed or when the map is dropped.
#[derive(Debug)]
pub struct NameMap<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for NameMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> NameMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn lookup(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn lookup_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Removes and drops the entry. Returns whether it existed.
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes the entry and hands its value to the caller.
    pub fn take(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Object classes whose names are assigned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Buffer,
    Texture,
    Framebuffer,
    Renderbuffer,
}

/// The one translation table shared by all dispatch threads.
///
/// Keys include the object class: a buffer and a texture may share a client name.
pub struct NameTranslation {
    map: Mutex<NameMap<(ObjectClass, GLuint), GLuint>>,
}

impl Default for NameTranslation {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTranslation {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(NameMap::new()),
        }
    }

    /// Records driver names for freshly generated client names, pairwise.
    pub fn insert_all(&self, class: ObjectClass, client: &[GLuint], driver: &[GLuint]) {
        debug_assert_eq!(client.len(), driver.len());
        let mut map = lock(&self.map);
        for (&c, &d) in client.iter().zip(driver) {
            if c != 0 {
                map.insert((class, c), d);
            }
        }
    }

    pub fn insert(&self, class: ObjectClass, client: GLuint, driver: GLuint) {
        self.insert_all(class, &[client], &[driver]);
    }

    /// Driver name for `client`. Name 0 always maps to 0.
    pub fn lookup(&self, class: ObjectClass, client: GLuint) -> Option<GLuint> {
        if client == 0 {
            return Some(0);
        }
        lock(&self.map).lookup(&(class, client)).copied()
    }

    /// Removes the translations for `client` names and returns the driver names to delete, in the
    /// same order. Names without a translation come back as 0, which the driver ignores.
    pub fn take_all(&self, class: ObjectClass, client: &[GLuint]) -> Vec<GLuint> {
        let mut map = lock(&self.map);
        client
            .iter()
            .map(|&c| {
                if c == 0 {
                    0
                } else {
                    map.take(&(class, c)).unwrap_or(0)
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_hands_back_the_value_once() {
        let mut map = NameMap::new();
        assert_eq!(map.insert(1u32, "a".to_string()), None);
        assert_eq!(map.lookup(&1).map(String::as_str), Some("a"));
        assert_eq!(map.take(&1), Some("a".to_string()));
        assert_eq!(map.take(&1), None);
        assert!(!map.remove(&1));
        assert!(map.is_empty());
    }

    #[test]
    fn classes_do_not_collide() {
        let names = NameTranslation::new();
        names.insert(ObjectClass::Buffer, 1, 100);
        names.insert(ObjectClass::Texture, 1, 200);
        assert_eq!(names.lookup(ObjectClass::Buffer, 1), Some(100));
        assert_eq!(names.lookup(ObjectClass::Texture, 1), Some(200));
        assert_eq!(names.lookup(ObjectClass::Framebuffer, 1), None);
    }

    #[test]
    fn take_all_substitutes_unknown_names_with_zero() {
        let names = NameTranslation::new();
        names.insert_all(ObjectClass::Buffer, &[1, 2], &[11, 12]);
        assert_eq!(names.take_all(ObjectClass::Buffer, &[2, 5, 0, 1]), vec![12, 0, 0, 11]);
        assert!(names.is_empty());
    }

    #[test]
    fn zero_is_never_stored() {
        let names = NameTranslation::new();
        names.insert(ObjectClass::Renderbuffer, 0, 9);
        assert!(names.is_empty());
        assert_eq!(names.lookup(ObjectClass::Renderbuffer, 0), Some(0));
    }
}
