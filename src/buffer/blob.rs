use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CHAIN_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a [`super::BufferChain`]
///
/// Blobs remember which chain reserved them so that they can't be used to patch some other
/// chain's chunks.
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct ChainId(u64);

impl ChainId {
    pub(super) fn fresh() -> ChainId {
        ChainId(NEXT_CHAIN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("chain{}", self.0))
    }
}

/// Window into the backing array of one chunk of a [`super::BufferChain`]
///
/// A blob is the result of reserving bytes. It can be filled in right away or kept around and
/// written once its value is known (eg. the length of an attribute whose body hasn't been
/// written yet). The window stays valid for as long as the chain that reserved it has not been
/// cleared or linked into another chain.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct Blob {
    pub(super) chain: ChainId,
    pub(super) chunk: usize,
    pub(super) start: usize,
    pub(super) len: usize,
}

impl Blob {
    /// Number of bytes in the window
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Chain which reserved this window
    pub fn chain(&self) -> ChainId {
        self.chain
    }
}
