//! Chunked byte buffers
//!
//! A [`BufferChain`] is an append-only sequence of bytes stored as a circular list of chunks.
//! Compared to a `Vec<u8>`, it supports two things that matter when assembling class files:
//!
//!   - Splicing: an entire chain can be linked before or after another chain in O(1). No bytes
//!     get copied and no chunk record moves, only the `next` links of the two ring heads are
//!     rewritten. This is how a constant pool which was written last ends up ahead of the
//!     methods that use it. Chains share their chunk records when they draw from the same
//!     [`ChunkPool`] (or when one is a [`BufferChain::sibling`] of the other); linking chains
//!     that don't share records moves the records over, one per chunk.
//!
//!   - Backpatching: bytes can be reserved as a [`Blob`] and filled in later, once their value
//!     is known. Blobs point directly at a chunk's backing array, so they are unaffected by
//!     anything written or linked after them.
//!
//! Once a chain is linked into another one, it is consumed: every further operation on it fails
//! with [`Error::ChainLinked`].

mod blob;
mod chunk;
mod pool;

pub use blob::*;
pub use chunk::{Blobs, Chunks};
pub use pool::*;

use crate::jvm::Error;
use byteorder::{BigEndian, ByteOrder};
use chunk::{Chunk, ChunkArena, SharedArena};
use std::cell::{Ref, RefMut};
use std::fmt;
use std::io;
use std::rc::Rc;

/// Capacity of the chunks allocated when nothing else is specified
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Smallest capacity a chain will use for its regular chunks
pub const MIN_CHUNK_SIZE: usize = 16;

pub struct BufferChain {
    id: ChainId,

    /// Chunk records, not in logical order (see `Chunk::next`). Shared with other chains.
    arena: SharedArena,

    /// Index of the logically last chunk, the only writable one
    head: usize,

    /// Total length of all chunks on the ring
    count: usize,

    /// Number of chunks on the ring
    chunk_count: usize,

    linked: bool,
    chunk_size: usize,
    pool: Option<Rc<ChunkPool>>,
}

fn shared(arena: &SharedArena) -> Result<Ref<'_, ChunkArena>, Error> {
    arena.try_borrow().map_err(|_| Error::ChainBusy)
}

fn exclusive(arena: &SharedArena) -> Result<RefMut<'_, ChunkArena>, Error> {
    arena.try_borrow_mut().map_err(|_| Error::ChainBusy)
}

fn window<'a>(arena: &'a mut ChunkArena, blob: &Blob) -> &'a mut [u8] {
    &mut arena[blob.chunk].buffer[blob.start..blob.start + blob.len]
}

impl BufferChain {
    pub fn new() -> BufferChain {
        BufferChain::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(chunk_size: usize) -> BufferChain {
        BufferChain::in_arena(chunk_size.max(MIN_CHUNK_SIZE), None, ChunkArena::shared())
    }

    /// Make a chain which recycles its chunks through a pool
    ///
    /// Chains of the same pool can be linked together in O(1).
    pub fn with_pool(pool: Rc<ChunkPool>) -> BufferChain {
        let arena = pool.arena();
        BufferChain::in_arena(pool.chunk_size(), Some(pool), arena)
    }

    fn in_arena(chunk_size: usize, pool: Option<Rc<ChunkPool>>, arena: SharedArena) -> BufferChain {
        // Records can't be added while an iterator holds the arena
        let arena = if arena.try_borrow_mut().is_ok() {
            arena
        } else {
            log::trace!("chunk arena is borrowed, starting a chain with its own");
            ChunkArena::shared()
        };
        let mut chain = BufferChain {
            id: ChainId::fresh(),
            arena: Rc::clone(&arena),
            head: 0,
            count: 0,
            chunk_count: 1,
            linked: false,
            chunk_size,
            pool,
        };
        chain.head = chain.fresh_head(&mut arena.borrow_mut());
        chain
    }

    /// Make an empty chain with the same chunk size, pool, and chunk records as this one
    pub fn sibling(&self) -> BufferChain {
        BufferChain::in_arena(self.chunk_size, self.pool.clone(), Rc::clone(&self.arena))
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Total number of bytes written (including reserved bytes)
    ///
    /// A chain that has been linked into another chain no longer has any content, so this is 0.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether this chain has been consumed by linking it into another chain
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn check_usable(&self) -> Result<(), Error> {
        if self.linked {
            Err(Error::ChainLinked)
        } else {
            Ok(())
        }
    }

    fn check_blob(&self, blob: &Blob) -> Result<(), Error> {
        self.check_usable()?;
        if blob.chain != self.id {
            return Err(Error::ForeignBlob {
                blob_chain: blob.chain,
                chain: self.id,
            });
        }
        Ok(())
    }

    /// Run `operation` with the chunk records borrowed mutably
    fn with_arena<R>(
        &mut self,
        operation: impl FnOnce(&mut BufferChain, &mut ChunkArena) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let arena = Rc::clone(&self.arena);
        let mut arena = exclusive(&arena)?;
        operation(self, &mut *arena)
    }

    fn allocate(&self, min_len: usize) -> Box<[u8]> {
        match &self.pool {
            Some(pool) => pool.acquire(min_len),
            None => vec![0u8; min_len.max(self.chunk_size)].into_boxed_slice(),
        }
    }

    /// Store a new empty chunk which links to itself
    fn fresh_head(&self, arena: &mut ChunkArena) -> usize {
        let buffer = self.allocate(0);
        let index = arena.insert(Chunk::new(buffer, self.pool.clone()));
        arena[index].next = index;
        index
    }

    /// Remove every chunk on the ring, returning buffers to their pools
    fn release_ring(&self, arena: &mut ChunkArena) {
        let mut index = arena[self.head].next;
        loop {
            let next = arena[index].next;
            arena.remove(index).release();
            if index == self.head {
                break;
            }
            index = next;
        }
    }

    /// Mark as linked. The ring now belongs to some other chain (or to nobody).
    fn consume(&mut self) {
        self.linked = true;
        self.count = 0;
        self.chunk_count = 0;
    }

    /// Freeze the head and make a new head with room for at least `min_len` bytes
    fn expand(&mut self, arena: &mut ChunkArena, min_len: usize) {
        let buffer = self.allocate(min_len);
        log::trace!(
            "{:?}: new chunk of {} bytes (needed {})",
            self.id,
            buffer.len(),
            min_len
        );
        let mut chunk = Chunk::new(buffer, self.pool.clone());
        chunk.next = arena[self.head].next;

        // An empty head gets swapped out instead of leaving an empty frozen chunk behind
        if arena[self.head].len == 0 {
            std::mem::replace(&mut arena[self.head], chunk).release();
            return;
        }

        arena[self.head].frozen = true;
        let index = arena.insert(chunk);
        arena[self.head].next = index;
        self.head = index;
        self.chunk_count += 1;
        self.debug_check_invariants(arena);
    }

    /// Reserve `len` bytes in the head, expanding first if needed, and hand them to `fill`
    fn reserve_with(&mut self, len: usize, fill: impl FnOnce(&mut [u8])) -> Result<Blob, Error> {
        self.check_usable()?;
        self.with_arena(|chain, arena| {
            if arena[chain.head].free() < len {
                chain.expand(arena, len);
            }
            let head = &mut arena[chain.head];
            let start = head.len;
            head.len += len;
            chain.count += len;

            let blob = Blob {
                chain: chain.id,
                chunk: chain.head,
                start,
                len,
            };
            fill(window(arena, &blob));
            Ok(blob)
        })
    }

    /// Reserve `len` contiguous bytes to be filled in later
    ///
    /// The reserved bytes are zeroed. If they don't fit in the current head, a new chunk is
    /// started (possibly leaving some unused capacity behind in the old head).
    pub fn reserve_bytes(&mut self, len: usize) -> Result<Blob, Error> {
        self.reserve_with(len, |window| window.fill(0))
    }

    /// Mutable access to the bytes of a blob reserved on this chain
    ///
    /// The chunk records of the chain stay borrowed until the returned window is dropped.
    pub fn blob_mut(&mut self, blob: &Blob) -> Result<RefMut<'_, [u8]>, Error> {
        self.check_blob(blob)?;
        let arena = exclusive(&self.arena)?;
        Ok(RefMut::map(arena, |arena| window(arena, blob)))
    }

    fn patch_with(
        &mut self,
        blob: &Blob,
        width: usize,
        fill: impl FnOnce(&mut [u8]),
    ) -> Result<(), Error> {
        let mut window = self.blob_mut(blob)?;
        if window.len() != width {
            return Err(Error::BlobWidthMismatch {
                expected: window.len(),
                found: width,
            });
        }
        fill(&mut *window);
        Ok(())
    }

    pub fn patch_u8(&mut self, blob: &Blob, value: u8) -> Result<(), Error> {
        self.patch_with(blob, 1, |window| window[0] = value)
    }

    pub fn patch_u16(&mut self, blob: &Blob, value: u16) -> Result<(), Error> {
        self.patch_with(blob, 2, |window| BigEndian::write_u16(window, value))
    }

    pub fn patch_i16(&mut self, blob: &Blob, value: i16) -> Result<(), Error> {
        self.patch_with(blob, 2, |window| BigEndian::write_i16(window, value))
    }

    pub fn patch_u32(&mut self, blob: &Blob, value: u32) -> Result<(), Error> {
        self.patch_with(blob, 4, |window| BigEndian::write_u32(window, value))
    }

    pub fn patch_i32(&mut self, blob: &Blob, value: i32) -> Result<(), Error> {
        self.patch_with(blob, 4, |window| BigEndian::write_i32(window, value))
    }

    /// Append bytes, splitting them across chunks if the head is too small
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.check_usable()?;
        self.with_arena(|chain, arena| {
            let free = arena[chain.head].free();
            let (now, rest) = bytes.split_at(free.min(bytes.len()));
            chain.head_append(arena, now);
            if !rest.is_empty() {
                chain.expand(arena, rest.len());
                chain.head_append(arena, rest);
            }
            Ok(())
        })
    }

    fn head_append(&mut self, arena: &mut ChunkArena, bytes: &[u8]) {
        let head = &mut arena[self.head];
        head.buffer[head.len..head.len + bytes.len()].copy_from_slice(bytes);
        head.len += bytes.len();
        self.count += bytes.len();
    }

    /// Append `count` copies of `value`
    pub fn write_repeated(&mut self, value: u8, count: usize) -> Result<(), Error> {
        self.check_usable()?;
        self.with_arena(|chain, arena| {
            let mut remaining = count;
            while remaining > 0 {
                if arena[chain.head].free() == 0 {
                    chain.expand(arena, remaining);
                }
                let head = &mut arena[chain.head];
                let now = head.free().min(remaining);
                head.buffer[head.len..head.len + now].fill(value);
                head.len += now;
                chain.count += now;
                remaining -= now;
            }
            Ok(())
        })
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), Error> {
        self.reserve_with(1, |window| window[0] = value)?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), Error> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.reserve_with(2, |window| BigEndian::write_u16(window, value))?;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<(), Error> {
        self.reserve_with(2, |window| BigEndian::write_i16(window, value))?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.reserve_with(4, |window| BigEndian::write_u32(window, value))?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), Error> {
        self.reserve_with(4, |window| BigEndian::write_i32(window, value))?;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        self.reserve_with(8, |window| BigEndian::write_u64(window, value))?;
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), Error> {
        self.reserve_with(8, |window| BigEndian::write_i64(window, value))?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), Error> {
        self.write_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), Error> {
        self.write_u64(value.to_bits())
    }

    /// Pad with zeroes until the count is a multiple of `alignment`
    pub fn align(&mut self, alignment: usize) -> Result<(), Error> {
        self.align_relative(alignment, 0)
    }

    /// Pad with zeroes until `count - origin` is a multiple of `alignment`
    pub fn align_relative(&mut self, alignment: usize, origin: usize) -> Result<(), Error> {
        self.check_usable()?;
        if alignment == 0 {
            return Err(Error::InvalidAlignment(alignment));
        }
        let misalignment = self.count.wrapping_sub(origin) % alignment;
        if misalignment != 0 {
            self.write_repeated(0, alignment - misalignment)?;
        }
        Ok(())
    }

    /// Consume an empty chain, returning its buffers to their pools
    fn discard(&mut self) -> Result<(), Error> {
        self.with_arena(|chain, arena| {
            chain.release_ring(arena);
            Ok(())
        })?;
        self.consume();
        Ok(())
    }

    /// Take over the ring of `other` (consuming it) and return the index of its head in our
    /// arena
    ///
    /// If `other` shares our arena, its records are used as they are. Otherwise they get moved
    /// over, one record per chunk, leaving the bytes where they are.
    fn take_ring(&self, arena: &mut ChunkArena, other: &mut BufferChain) -> Result<usize, Error> {
        if Rc::ptr_eq(&self.arena, &other.arena) {
            other.consume();
            return Ok(other.head);
        }

        let mut foreign = exclusive(&other.arena)?;
        log::trace!(
            "{:?}: moving {} chunk records over from {:?}",
            self.id,
            other.chunk_count,
            other.id
        );
        let mut index = foreign[other.head].next;
        let mut first = None;
        let mut previous = None;
        let head = loop {
            let next = foreign[index].next;
            let moved = arena.insert(foreign.remove(index));
            match previous {
                Some(previous) => arena[previous].next = moved,
                None => first = Some(moved),
            }
            previous = Some(moved);
            if index == other.head {
                arena[moved].next = first.unwrap_or(moved);
                break moved;
            }
            index = next;
        };
        drop(foreign);
        other.consume();
        Ok(head)
    }

    /// Splice all of `suffix` after the current content
    ///
    /// Afterwards, `suffix` is consumed and the head of this chain is the head of `suffix`. The
    /// current head of this chain is frozen, even if it has spare room.
    pub fn link_suffix(&mut self, suffix: &mut BufferChain) -> Result<(), Error> {
        self.check_usable()?;
        suffix.check_usable()?;
        if suffix.is_empty() {
            return suffix.discard();
        }

        self.with_arena(|chain, arena| {
            let (suffix_count, suffix_chunks) = (suffix.count, suffix.chunk_count);
            let suffix_head = chain.take_ring(arena, suffix)?;

            if chain.count == 0 {
                // Nothing worth keeping on our side, so take the suffix's ring as is
                chain.release_ring(arena);
                chain.chunk_count = 0;
            } else {
                let suffix_first = arena[suffix_head].next;
                let first = arena[chain.head].next;
                arena[chain.head].frozen = true;
                arena[chain.head].next = suffix_first;
                arena[suffix_head].next = first;
            }
            chain.head = suffix_head;
            chain.count += suffix_count;
            chain.chunk_count += suffix_chunks;

            log::trace!("{:?}: linked suffix, count is now {}", chain.id, chain.count);
            chain.debug_check_invariants(arena);
            Ok(())
        })
    }

    /// Splice all of `prefix` before the current content
    ///
    /// Afterwards, `prefix` is consumed and the head of this chain is unchanged.
    pub fn link_prefix(&mut self, prefix: &mut BufferChain) -> Result<(), Error> {
        self.check_usable()?;
        prefix.check_usable()?;
        if prefix.is_empty() {
            return prefix.discard();
        }

        self.with_arena(|chain, arena| {
            let (prefix_count, prefix_chunks) = (prefix.count, prefix.chunk_count);
            let prefix_head = chain.take_ring(arena, prefix)?;

            let prefix_first = arena[prefix_head].next;
            let first = arena[chain.head].next;
            arena[prefix_head].frozen = true;
            arena[prefix_head].next = first;
            arena[chain.head].next = prefix_first;
            chain.count += prefix_count;
            chain.chunk_count += prefix_chunks;

            log::trace!("{:?}: linked prefix, count is now {}", chain.id, chain.count);
            chain.debug_check_invariants(arena);
            Ok(())
        })
    }

    /// Move the content of `other` onto the end of this chain, consuming `other`
    ///
    /// Content that fits in the spare room of the head is copied there, so appending many small
    /// pieces doesn't leave a trail of mostly empty chunks. Anything larger is linked.
    pub fn append(&mut self, other: &mut BufferChain) -> Result<(), Error> {
        self.check_usable()?;
        other.check_usable()?;
        let free = shared(&self.arena)?[self.head].free();
        if other.count > free {
            return self.link_suffix(other);
        }

        let content = other.to_vec()?;
        self.write_bytes(&content)?;
        other.discard()
    }

    /// Iterate over the content, one chunk at a time in logical order
    ///
    /// The iterator borrows the chunk records, so nothing can be written to this chain (or to
    /// any chain sharing its records) while it is live. Calling this again starts over from the
    /// first chunk.
    pub fn chunks(&self) -> Result<Chunks<'_>, Error> {
        self.check_usable()?;
        let arena = shared(&self.arena)?;
        let first = arena[self.head].next;
        Ok(Chunks {
            arena,
            next: Some(first),
            head: self.head,
        })
    }

    /// Iterate over blobs covering each chunk's content
    pub fn blobs(&self) -> Result<Blobs<'_>, Error> {
        Ok(Blobs {
            inner: self.chunks()?,
            chain: self.id,
        })
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.count);
        for content in self.chunks()? {
            out.extend_from_slice(&content);
        }
        Ok(out)
    }

    /// Copy out `count` bytes starting from logical offset `start`
    pub fn to_vec_range(&self, start: usize, count: usize) -> Result<Vec<u8>, Error> {
        self.check_usable()?;
        let len = self.count;
        let end = start
            .checked_add(count)
            .filter(|end| *end <= len)
            .ok_or(Error::OutOfRange { start, count, len })?;

        let mut out = Vec::with_capacity(count);
        let mut chunk_start = 0;
        for content in self.chunks()? {
            if chunk_start >= end {
                break;
            }
            let chunk_end = chunk_start + content.len();
            if chunk_end > start {
                let from = start.max(chunk_start) - chunk_start;
                let to = end.min(chunk_end) - chunk_start;
                out.extend_from_slice(&content[from..to]);
            }
            chunk_start = chunk_end;
        }
        Ok(out)
    }

    /// Write the whole content to a sink, chunk by chunk
    pub fn write_content_to<W: io::Write>(&self, sink: &mut W) -> Result<(), Error> {
        for content in self.chunks()? {
            sink.write_all(&content)?;
        }
        Ok(())
    }

    /// Compare contents byte for byte, regardless of how they are split into chunks
    pub fn content_equals(&self, other: &BufferChain) -> Result<bool, Error> {
        self.check_usable()?;
        other.check_usable()?;
        if self.count != other.count {
            return Ok(false);
        }

        let mut right_chunks = other.chunks()?;
        let mut right: Option<Ref<'_, [u8]>> = None;
        let mut right_at = 0;
        for left in self.chunks()? {
            let mut left_at = 0;
            while left_at < left.len() {
                let exhausted = match &right {
                    Some(chunk) => right_at == chunk.len(),
                    None => true,
                };
                if exhausted {
                    right = right_chunks.next();
                    right_at = 0;
                    if right.is_none() {
                        return Ok(false);
                    }
                    continue;
                }
                let chunk = match &right {
                    Some(chunk) => chunk,
                    None => return Ok(false),
                };
                let common = (left.len() - left_at).min(chunk.len() - right_at);
                if left[left_at..left_at + common] != chunk[right_at..right_at + common] {
                    return Ok(false);
                }
                left_at += common;
                right_at += common;
            }
        }
        Ok(true)
    }

    /// Drop all content, returning chunks to their pools
    ///
    /// Blobs reserved before this call are no longer valid for this chain.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.check_usable()?;
        self.with_arena(|chain, arena| {
            chain.release_ring(arena);
            chain.head = chain.fresh_head(arena);
            chain.count = 0;
            chain.chunk_count = 1;
            chain.id = ChainId::fresh();
            Ok(())
        })
    }

    /// Check that the chunk ring is well formed. Only does anything in debug builds.
    fn debug_check_invariants(&self, arena: &ChunkArena) {
        if !cfg!(debug_assertions) {
            return;
        }
        let mut total = 0;
        let mut visited = 0;
        let mut index = arena[self.head].next;
        loop {
            let chunk = &arena[index];
            debug_assert_eq!(chunk.frozen, index != self.head, "only the head is writable");
            total += chunk.len;
            visited += 1;
            if index == self.head {
                break;
            }
            debug_assert!(visited < self.chunk_count, "chunk ring does not reach the head");
            index = chunk.next;
        }
        debug_assert_eq!(visited, self.chunk_count, "chunk count disagrees with the ring");
        debug_assert_eq!(total, self.count, "chunk lengths disagree with the count");
    }
}

impl Default for BufferChain {
    fn default() -> BufferChain {
        BufferChain::new()
    }
}

impl Drop for BufferChain {
    fn drop(&mut self) {
        if self.linked {
            return;
        }
        // While some iterator holds the arena, the records stay behind until the arena goes
        if let Ok(mut arena) = self.arena.try_borrow_mut() {
            self.release_ring(&mut arena);
        }
    }
}

impl fmt::Debug for BufferChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferChain")
            .field("id", &self.id)
            .field("count", &self.count)
            .field("chunks", &self.chunk_count)
            .field("linked", &self.linked)
            .finish()
    }
}

impl io::Write for BufferChain {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::ErrorKind;

    fn chain_of(bytes: &[u8]) -> BufferChain {
        let mut chain = BufferChain::with_chunk_size(MIN_CHUNK_SIZE);
        chain.write_bytes(bytes).unwrap();
        chain
    }

    #[test]
    fn writes_are_big_endian() {
        let mut chain = BufferChain::new();
        chain.write_u8(0xCA).unwrap();
        chain.write_u16(0xFEBA).unwrap();
        chain.write_i32(-2).unwrap();
        chain.write_u64(0x0102030405060708).unwrap();
        chain.write_f32(1.0).unwrap();

        assert_eq!(chain.count(), 19);
        assert_eq!(
            chain.to_vec().unwrap(),
            vec![
                0xCA, 0xFE, 0xBA, 0xFF, 0xFF, 0xFF, 0xFE, 1, 2, 3, 4, 5, 6, 7, 8, 0x3F, 0x80, 0,
                0
            ]
        );
    }

    #[test]
    fn count_follows_writes_across_chunks() {
        let mut chain = BufferChain::with_chunk_size(MIN_CHUNK_SIZE);
        let bytes: Vec<u8> = (0..100).collect();
        chain.write_bytes(&bytes).unwrap();
        chain.write_repeated(7, 40).unwrap();
        assert_eq!(chain.count(), 140);

        let content = chain.to_vec().unwrap();
        assert_eq!(&content[..100], &bytes[..]);
        assert!(content[100..].iter().all(|b| *b == 7));
        assert!(chain.chunks().unwrap().count() > 1);
    }

    #[test]
    fn large_writes_get_an_exact_fit_chunk() {
        let mut chain = BufferChain::with_chunk_size(MIN_CHUNK_SIZE);
        chain.write_u8(1).unwrap();
        let blob = chain.reserve_bytes(1000).unwrap();
        assert_eq!(blob.len(), 1000);
        assert_eq!(chain.count(), 1001);
        assert_eq!(chain.chunks().unwrap().map(|c| c.len()).collect::<Vec<_>>(), vec![1, 1000]);
    }

    #[test]
    fn reserved_bytes_are_zeroed_and_patchable() {
        let pool = ChunkPool::new(MIN_CHUNK_SIZE, 4);
        {
            let mut dirty = BufferChain::with_pool(pool.clone());
            dirty.write_repeated(0xFF, MIN_CHUNK_SIZE).unwrap();
        }
        assert!(pool.pooled() > 0);

        let mut chain = BufferChain::with_pool(pool);
        chain.write_u8(1).unwrap();
        let length = chain.reserve_bytes(4).unwrap();
        chain.write_bytes(&[9; 40]).unwrap();
        assert_eq!(chain.to_vec_range(1, 4).unwrap(), vec![0, 0, 0, 0]);

        chain.patch_u32(&length, 40).unwrap();
        assert_eq!(chain.to_vec_range(0, 5).unwrap(), vec![1, 0, 0, 0, 40]);
    }

    #[test]
    fn patch_checks_width_and_owner() {
        let mut chain = BufferChain::new();
        let mut other = BufferChain::new();
        let blob = chain.reserve_bytes(2).unwrap();

        let err = chain.patch_u32(&blob, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);

        let err = other.patch_u16(&blob, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        chain.clear().unwrap();
        let err = chain.patch_u16(&blob, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn link_suffix_concatenates() {
        let mut left = chain_of(&[1, 2, 3]);
        let mut right = chain_of(&[4, 5]);
        left.link_suffix(&mut right).unwrap();

        assert_eq!(left.count(), 5);
        assert_eq!(left.to_vec().unwrap(), vec![1, 2, 3, 4, 5]);
        assert!(right.is_linked());

        // The old head is frozen, so new writes land after the suffix
        left.write_u8(6).unwrap();
        assert_eq!(left.to_vec().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn link_prefix_concatenates() {
        let mut body = chain_of(&[3, 4]);
        let mut prefix = chain_of(&[1, 2]);
        body.link_prefix(&mut prefix).unwrap();
        body.write_u8(5).unwrap();

        assert_eq!(body.count(), 5);
        assert_eq!(body.to_vec().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn linking_in_any_order_gives_the_same_content() {
        let a: Vec<u8> = (0..40).collect();
        let b: Vec<u8> = (40..45).collect();
        let c: Vec<u8> = (45..90).collect();

        // B, then A in front, then C after
        let mut chain = chain_of(&b);
        chain.link_prefix(&mut chain_of(&a)).unwrap();
        chain.link_suffix(&mut chain_of(&c)).unwrap();

        let mut expected = chain_of(&a);
        expected.write_bytes(&b).unwrap();
        expected.write_bytes(&c).unwrap();

        assert_eq!(chain.count(), 90);
        assert!(chain.content_equals(&expected).unwrap());
        assert_eq!(chain.to_vec().unwrap(), (0..90).collect::<Vec<u8>>());
    }

    #[test]
    fn blobs_survive_linking() {
        let mut chain = BufferChain::with_chunk_size(MIN_CHUNK_SIZE);
        let early = chain.reserve_bytes(2).unwrap();
        chain.write_bytes(&[0xAA; 30]).unwrap();

        chain.link_prefix(&mut chain_of(&[1, 2, 3])).unwrap();
        chain.link_suffix(&mut chain_of(&[4, 5, 6])).unwrap();
        chain.patch_u16(&early, 0xBEEF).unwrap();

        assert_eq!(chain.to_vec_range(3, 2).unwrap(), vec![0xBE, 0xEF]);
        assert_eq!(chain.count(), 38);
    }

    #[test]
    fn linked_chain_rejects_everything() {
        let mut chain = chain_of(&[1]);
        let mut suffix = chain_of(&[2]);
        let blob = suffix.reserve_bytes(1).unwrap();
        chain.link_suffix(&mut suffix).unwrap();

        assert_eq!(suffix.count(), 0);
        assert!(suffix.is_empty());
        assert_eq!(suffix.write_u8(0).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(suffix.to_vec().unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(suffix.patch_u8(&blob, 0).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(
            chain.link_suffix(&mut suffix).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
        assert!(matches!(suffix.clear(), Err(Error::ChainLinked)));
    }

    #[test]
    fn linking_empty_chains() {
        let mut chain = BufferChain::new();
        chain.link_suffix(&mut BufferChain::new()).unwrap();
        chain.link_prefix(&mut BufferChain::new()).unwrap();
        assert_eq!(chain.count(), 0);

        chain.link_suffix(&mut chain_of(&[1, 2])).unwrap();
        assert_eq!(chain.to_vec().unwrap(), vec![1, 2]);
        assert_eq!(chain.chunks().unwrap().count(), 1);
    }

    #[test]
    fn extraction_windows() {
        let mut chain = chain_of(&(0..20).collect::<Vec<u8>>());
        chain.link_suffix(&mut chain_of(&(20..50).collect::<Vec<u8>>())).unwrap();

        assert_eq!(chain.to_vec_range(14, 10).unwrap(), (14..24).collect::<Vec<u8>>());
        assert_eq!(chain.to_vec_range(50, 0).unwrap(), Vec::<u8>::new());
        assert_eq!(chain.to_vec_range(45, 6).unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(
            chain.to_vec_range(usize::MAX, 2).unwrap_err().kind(),
            ErrorKind::Range
        );
    }

    #[test]
    fn alignment() {
        let mut chain = chain_of(&[1, 2, 3, 4, 5]);
        chain.align(4).unwrap();
        assert_eq!(chain.count(), 8);
        chain.align(4).unwrap();
        assert_eq!(chain.count(), 8);
        chain.align_relative(4, 1).unwrap();
        assert_eq!(chain.count(), 9);
        assert_eq!(chain.align(0).unwrap_err().kind(), ErrorKind::Range);
    }

    #[test]
    fn blobs_cover_each_chunk() {
        let mut chain = chain_of(&[1; 10]);
        chain.link_suffix(&mut chain_of(&[2; 10])).unwrap();

        let blobs: Vec<Blob> = chain.blobs().unwrap().collect();
        assert_eq!(blobs.iter().map(|b| b.len()).sum::<usize>(), 20);
        for blob in blobs {
            chain.blob_mut(&blob).unwrap().fill(3);
        }
        assert_eq!(chain.to_vec().unwrap(), vec![3; 20]);
    }

    #[test]
    fn content_equals_ignores_chunking() {
        let bytes: Vec<u8> = (0..64).collect();
        let mut small = chain_of(&[]);
        for byte in &bytes {
            small.write_u8(*byte).unwrap();
        }
        let mut large = BufferChain::with_chunk_size(1024);
        large.write_bytes(&bytes).unwrap();

        assert!(small.content_equals(&large).unwrap());
        large.write_u8(0).unwrap();
        assert!(!small.content_equals(&large).unwrap());
    }

    #[test]
    fn pool_recycles_chunks() {
        let pool = ChunkPool::new(32, 2);
        let mut chain = BufferChain::with_pool(pool.clone());
        for _ in 0..10 {
            chain.write_bytes(&[0; 10]).unwrap();
        }
        assert_eq!(chain.chunks().unwrap().count(), 4);
        assert_eq!(pool.pooled(), 0);

        chain.clear().unwrap();
        assert_eq!(chain.count(), 0);
        assert!(pool.pooled() <= 2);

        drop(chain);
        assert_eq!(pool.pooled(), 2);
    }

    #[test]
    fn linked_pooled_chunks_go_back_to_their_pool() {
        let pool = ChunkPool::new(MIN_CHUNK_SIZE, 8);
        let mut pooled = BufferChain::with_pool(pool.clone());
        for _ in 0..4 {
            pooled.write_bytes(&[5; MIN_CHUNK_SIZE]).unwrap();
        }
        assert_eq!(pooled.chunks().unwrap().count(), 4);

        let mut plain = BufferChain::new();
        plain.write_u8(1).unwrap();
        plain.link_suffix(&mut pooled).unwrap();
        drop(pooled);
        assert_eq!(pool.pooled(), 0);

        drop(plain);
        assert_eq!(pool.pooled(), 4);
    }

    #[test]
    fn linking_siblings_leaves_chunk_records_in_place() {
        let pool = ChunkPool::new(MIN_CHUNK_SIZE, 8);
        let mut chain = BufferChain::with_pool(pool);
        chain.write_bytes(&[1; 40]).unwrap();
        let mut prefix = chain.sibling();
        prefix.write_bytes(&[0; 40]).unwrap();
        let mut suffix = chain.sibling();
        suffix.write_bytes(&[2; 40]).unwrap();

        let chunk_indices = |chain: &BufferChain| -> Vec<usize> {
            chain.blobs().unwrap().map(|blob| blob.chunk).collect()
        };
        let own = chunk_indices(&chain);
        let before = chunk_indices(&prefix);
        let after = chunk_indices(&suffix);

        chain.link_suffix(&mut suffix).unwrap();
        chain.link_prefix(&mut prefix).unwrap();

        let expected: Vec<usize> = before.iter().chain(&own).chain(&after).copied().collect();
        assert_eq!(chunk_indices(&chain), expected);

        let mut content = vec![0; 40];
        content.extend_from_slice(&[1; 40]);
        content.extend_from_slice(&[2; 40]);
        assert_eq!(chain.to_vec().unwrap(), content);
    }

    #[test]
    fn shared_records_are_busy_while_iterated() {
        let pool = ChunkPool::new(MIN_CHUNK_SIZE, 4);
        let mut chain = BufferChain::with_pool(pool.clone());
        chain.write_bytes(&[1, 2, 3]).unwrap();
        let mut other = BufferChain::with_pool(pool);

        let chunks = chain.chunks().unwrap();
        assert!(matches!(other.write_u8(4), Err(Error::ChainBusy)));
        assert_eq!(other.reserve_bytes(2).unwrap_err().kind(), ErrorKind::InvalidState);
        drop(chunks);

        other.write_u8(4).unwrap();
        other.link_prefix(&mut chain).unwrap();
        assert_eq!(other.to_vec().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn append_copies_small_content_and_links_the_rest() {
        let mut chain = BufferChain::with_chunk_size(MIN_CHUNK_SIZE);
        chain.write_bytes(&[1, 2]).unwrap();
        let mut small = chain.sibling();
        small.write_bytes(&[3, 4]).unwrap();
        chain.append(&mut small).unwrap();
        assert!(small.is_linked());
        assert_eq!(chain.chunks().unwrap().count(), 1);

        let mut large = chain_of(&[5; 40]);
        chain.append(&mut large).unwrap();
        assert_eq!(chain.count(), 44);
        assert_eq!(&chain.to_vec().unwrap()[..5], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn writes_agree_with_a_flat_vector() {
        for chunk_size in MIN_CHUNK_SIZE..64 {
            let mut chain = BufferChain::with_chunk_size(chunk_size);
            let mut model: Vec<u8> = vec![];
            let mut reserved = vec![];

            for step in 0..60usize {
                let byte = (step * 7 + chunk_size) as u8;
                match step % 5 {
                    0 => {
                        let bytes: Vec<u8> = (0..step % 23).map(|i| byte ^ i as u8).collect();
                        chain.write_bytes(&bytes).unwrap();
                        model.extend_from_slice(&bytes);
                    }
                    1 => {
                        chain.write_u8(byte).unwrap();
                        model.push(byte);
                    }
                    2 => {
                        let count = step * 3 % 70;
                        chain.write_repeated(byte, count).unwrap();
                        model.extend(std::iter::repeat(byte).take(count));
                    }
                    3 => {
                        reserved.push((chain.reserve_bytes(4).unwrap(), model.len(), byte));
                        model.extend_from_slice(&[0; 4]);
                    }
                    _ => {
                        chain.write_u16((u16::from(byte) << 8) | 0x5A).unwrap();
                        model.extend_from_slice(&[byte, 0x5A]);
                    }
                }
                assert_eq!(chain.count(), model.len(), "chunk size {}", chunk_size);
            }

            for (blob, at, byte) in reserved {
                let value = u32::from(byte) * 0x0101;
                chain.patch_u32(&blob, value).unwrap();
                model[at..at + 4].copy_from_slice(&value.to_be_bytes());
            }
            assert_eq!(chain.to_vec().unwrap(), model, "chunk size {}", chunk_size);
            assert_eq!(chain.to_vec_range(5, 50).unwrap(), &model[5..55]);

            // The same content split at an arbitrary point and linked back together
            let split = model.len() / 3 + chunk_size;
            let mut front = BufferChain::with_chunk_size(chunk_size);
            front.write_bytes(&model[..split]).unwrap();
            let mut back = front.sibling();
            back.write_bytes(&model[split..]).unwrap();
            front.link_suffix(&mut back).unwrap();
            assert!(front.content_equals(&chain).unwrap(), "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn io_write_and_copy_out() {
        use std::io::Write;

        let mut chain = BufferChain::with_chunk_size(MIN_CHUNK_SIZE);
        write!(chain, "{} bottles of {}", 99, "beer on the wall").unwrap();

        let mut sink = vec![];
        chain.write_content_to(&mut sink).unwrap();
        assert_eq!(sink, b"99 bottles of beer on the wall".to_vec());
    }
}
