use super::chunk::{ChunkArena, SharedArena};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Pool of reusable chunk buffers
///
/// Chains created with [`super::BufferChain::with_pool`] take their regular sized chunks from
/// here and hand them back when they are cleared or dropped. Oversized (exact-fit) chunks are
/// never pooled. Every chunk remembers the pool it came from, so a buffer finds its way back
/// even after its chain got linked into a chain without a pool.
///
/// Chains of the same pool also share their chunk records, which is what lets them be linked
/// together without touching any record other than the two heads.
#[derive(Debug)]
pub struct ChunkPool {
    chunk_size: usize,
    max_pooled: usize,
    free: RefCell<Vec<Box<[u8]>>>,
    arena: RefCell<Weak<RefCell<ChunkArena>>>,
}

impl ChunkPool {
    /// Make a pool of `chunk_size` buffers which retains at most `max_pooled` free buffers
    pub fn new(chunk_size: usize, max_pooled: usize) -> Rc<ChunkPool> {
        Rc::new(ChunkPool {
            chunk_size: chunk_size.max(super::MIN_CHUNK_SIZE),
            max_pooled,
            free: RefCell::new(vec![]),
            arena: RefCell::new(Weak::new()),
        })
    }

    /// Size of the buffers handed out for regular requests
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of buffers currently available for reuse
    pub fn pooled(&self) -> usize {
        self.free.borrow().len()
    }

    /// Chunk records shared by the chains of this pool
    ///
    /// The pool only holds on to the arena while some chain does.
    pub(super) fn arena(&self) -> SharedArena {
        let mut arena = self.arena.borrow_mut();
        match arena.upgrade() {
            Some(shared) => shared,
            None => {
                let shared = ChunkArena::shared();
                *arena = Rc::downgrade(&shared);
                shared
            }
        }
    }

    /// Get a buffer of at least `min_len` bytes
    pub(super) fn acquire(&self, min_len: usize) -> Box<[u8]> {
        if min_len > self.chunk_size {
            return vec![0u8; min_len].into_boxed_slice();
        }
        match self.free.borrow_mut().pop() {
            Some(buffer) => buffer,
            None => vec![0u8; self.chunk_size].into_boxed_slice(),
        }
    }

    /// Hand a buffer back
    pub(super) fn release(&self, buffer: Box<[u8]>) {
        if buffer.len() != self.chunk_size {
            return;
        }
        let mut free = self.free.borrow_mut();
        if free.len() < self.max_pooled {
            free.push(buffer);
        }
    }
}
