use super::{Blob, ChainId, ChunkPool};
use std::cell::{Ref, RefCell};
use std::ops::{Index, IndexMut};
use std::rc::Rc;

/// One backing array of a chain
///
/// Only the head chunk of a chain is writable. Every other chunk is frozen: its bytes can still
/// be patched through a blob, but nothing gets appended to it.
pub(super) struct Chunk {
    pub buffer: Box<[u8]>,
    pub len: usize,
    pub frozen: bool,

    /// Index of the next chunk in logical order (the head links back around to the first chunk)
    pub next: usize,

    /// Where the buffer goes once the chunk is released
    pub pool: Option<Rc<ChunkPool>>,
}

impl Chunk {
    pub fn new(buffer: Box<[u8]>, pool: Option<Rc<ChunkPool>>) -> Chunk {
        Chunk {
            buffer,
            len: 0,
            frozen: false,
            next: 0,
            pool,
        }
    }

    fn vacant(index: usize) -> Chunk {
        Chunk {
            buffer: Box::default(),
            len: 0,
            frozen: true,
            next: index,
            pool: None,
        }
    }

    pub fn free(&self) -> usize {
        self.buffer.len() - self.len
    }

    pub fn content(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Hand the buffer back to the pool it was taken from
    pub fn release(self) {
        if let Some(pool) = self.pool {
            pool.release(self.buffer);
        }
    }
}

/// Chunk records of every chain drawing from the same storage
///
/// Each chain owns the records on its own ring and never looks at the others. Two chains in the
/// same arena are spliced by rewriting the `next` index of each ring's head.
#[derive(Default)]
pub(super) struct ChunkArena {
    chunks: Vec<Chunk>,
    vacant: Vec<usize>,
}

pub(super) type SharedArena = Rc<RefCell<ChunkArena>>;

impl ChunkArena {
    pub fn shared() -> SharedArena {
        Rc::new(RefCell::new(ChunkArena::default()))
    }

    /// Store a record, reusing a vacated slot if there is one
    pub fn insert(&mut self, chunk: Chunk) -> usize {
        match self.vacant.pop() {
            Some(index) => {
                self.chunks[index] = chunk;
                index
            }
            None => {
                self.chunks.push(chunk);
                self.chunks.len() - 1
            }
        }
    }

    /// Take a record out, leaving its slot up for reuse
    pub fn remove(&mut self, index: usize) -> Chunk {
        self.vacant.push(index);
        std::mem::replace(&mut self.chunks[index], Chunk::vacant(index))
    }
}

impl Index<usize> for ChunkArena {
    type Output = Chunk;

    fn index(&self, index: usize) -> &Chunk {
        &self.chunks[index]
    }
}

impl IndexMut<usize> for ChunkArena {
    fn index_mut(&mut self, index: usize) -> &mut Chunk {
        &mut self.chunks[index]
    }
}

/// Content of a chain, one chunk at a time in logical order
///
/// The chunk storage stays borrowed while the iterator (or any chunk it handed out) is alive.
pub struct Chunks<'a> {
    pub(super) arena: Ref<'a, ChunkArena>,
    pub(super) next: Option<usize>,
    pub(super) head: usize,
}

impl<'a> Clone for Chunks<'a> {
    fn clone(&self) -> Chunks<'a> {
        Chunks {
            arena: Ref::clone(&self.arena),
            next: self.next,
            head: self.head,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Ref<'a, [u8]>;

    fn next(&mut self) -> Option<Ref<'a, [u8]>> {
        let index = self.next?;
        self.next = if index == self.head {
            None
        } else {
            Some(self.arena[index].next)
        };
        Some(Ref::map(Ref::clone(&self.arena), |arena| {
            arena[index].content()
        }))
    }
}

/// Content of a chain as blobs covering each chunk, in logical order
#[derive(Clone)]
pub struct Blobs<'a> {
    pub(super) inner: Chunks<'a>,
    pub(super) chain: ChainId,
}

impl<'a> Iterator for Blobs<'a> {
    type Item = Blob;

    fn next(&mut self) -> Option<Blob> {
        let index = self.inner.next?;
        let len = self.inner.next()?.len();
        Some(Blob {
            chain: self.chain,
            chunk: index,
            start: 0,
            len,
        })
    }
}
