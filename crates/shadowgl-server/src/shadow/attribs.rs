//! Vertex attribute descriptors.
//!
//! The first [`NUM_EMBEDDED_ATTRIBS`] descriptors live inline in the shadow state. Touching an
//! index past that moves the whole list to a heap array sized exactly `index + 1`; every later new
//! index allocates a fresh array of the new exact size and drops the previous one.

use shadowgl_types::gl::{GLenum, GLint, GLsizei, GLuint, GL_FLOAT};

pub const NUM_EMBEDDED_ATTRIBS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttrib {
    pub enabled: bool,
    pub size: GLint,
    pub ty: GLenum,
    pub normalized: bool,
    pub stride: GLsizei,
    /// Byte offset into `buffer`.
    pub offset: u64,
    /// Client name of the array buffer bound when the pointer was specified.
    pub buffer: GLuint,
    pub current: [f32; 4],
}

impl Default for VertexAttrib {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 4,
            ty: GL_FLOAT,
            normalized: false,
            stride: 0,
            offset: 0,
            buffer: 0,
            current: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Inline([VertexAttrib; NUM_EMBEDDED_ATTRIBS]),
    Heap(Box<[VertexAttrib]>),
}

#[derive(Debug, Clone)]
pub struct VertexAttribList {
    storage: Storage,
    count: usize,
    heap_allocations: usize,
}

impl Default for VertexAttribList {
    fn default() -> Self {
        Self {
            storage: Storage::Inline([VertexAttrib::default(); NUM_EMBEDDED_ATTRIBS]),
            count: 0,
            heap_allocations: 0,
        }
    }
}

impl VertexAttribList {
    /// Number of descriptors in use: one past the highest index ever touched.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline(_))
    }

    /// How many heap arrays have been allocated over this list's lifetime. Only the latest is
    /// still alive.
    pub fn heap_allocations(&self) -> usize {
        self.heap_allocations
    }

    pub fn as_slice(&self) -> &[VertexAttrib] {
        match &self.storage {
            Storage::Inline(attribs) => &attribs[..self.count],
            Storage::Heap(attribs) => attribs,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [VertexAttrib] {
        match &mut self.storage {
            Storage::Inline(attribs) => &mut attribs[..self.count],
            Storage::Heap(attribs) => attribs,
        }
    }

    pub fn get(&self, index: GLuint) -> Option<&VertexAttrib> {
        self.as_slice().get(index as usize)
    }

    /// Descriptor for `index`, growing the list if needed. New entries start at their defaults.
    pub fn entry(&mut self, index: GLuint) -> &mut VertexAttrib {
        let index = index as usize;
        if index >= self.count {
            self.grow_to(index + 1);
        }
        &mut self.as_mut_slice()[index]
    }

    fn grow_to(&mut self, count: usize) {
        if count <= NUM_EMBEDDED_ATTRIBS && self.is_inline() {
            self.count = count;
            return;
        }

        let mut grown = vec![VertexAttrib::default(); count].into_boxed_slice();
        grown[..self.count].copy_from_slice(self.as_slice());
        // The previous heap array, if any, is dropped here.
        self.storage = Storage::Heap(grown);
        self.count = count;
        self.heap_allocations += 1;
    }

    /// Forgets `buffer` in every descriptor that sourced from it.
    pub fn unbind_buffer(&mut self, buffer: GLuint) {
        for attrib in self.as_mut_slice() {
            if attrib.buffer == buffer {
                attrib.buffer = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_inline_up_to_embedded_capacity() {
        let mut list = VertexAttribList::default();
        list.entry(NUM_EMBEDDED_ATTRIBS as GLuint - 1).enabled = true;
        assert!(list.is_inline());
        assert_eq!(list.len(), NUM_EMBEDDED_ATTRIBS);
        assert_eq!(list.heap_allocations(), 0);
    }

    #[test]
    fn grows_to_exact_size_and_keeps_entries() {
        let mut list = VertexAttribList::default();
        list.entry(3).size = 2;
        list.entry(40).enabled = true;
        assert!(!list.is_inline());
        assert_eq!(list.len(), 41);
        assert_eq!(list.get(3).map(|a| a.size), Some(2));
        assert!(list.get(40).is_some_and(|a| a.enabled));

        list.entry(41);
        assert_eq!(list.len(), 42);
        assert_eq!(list.heap_allocations(), 2);

        // Existing indices never reallocate.
        list.entry(10).stride = 16;
        assert_eq!(list.heap_allocations(), 2);
        assert_eq!(list.get(10).map(|a| a.stride), Some(16));
    }

    #[test]
    fn defaults_match_es2() {
        let mut list = VertexAttribList::default();
        let attrib = *list.entry(0);
        assert_eq!(attrib.size, 4);
        assert_eq!(attrib.ty, GL_FLOAT);
        assert_eq!(attrib.current, [0.0, 0.0, 0.0, 1.0]);
        assert!(!attrib.enabled);
    }

    #[test]
    fn unbinding_a_buffer_clears_matching_descriptors() {
        let mut list = VertexAttribList::default();
        list.entry(0).buffer = 5;
        list.entry(1).buffer = 6;
        list.unbind_buffer(5);
        assert_eq!(list.get(0).map(|a| a.buffer), Some(0));
        assert_eq!(list.get(1).map(|a| a.buffer), Some(6));
    }
}
