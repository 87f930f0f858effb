//! Fixed-size block pool.

use std::alloc::Layout;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use crate::meta::{BLOCK_NONE, BlockId, Slot};
use crate::object::ObjectAllocator;
use crate::raw::{DefaultAllocator, RawAllocator};
use crate::{AllocError, CreateError};

const DEFAULT_BLOCKS_PER_CHUNK: usize = 64;

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Pool`].
///
/// ```
/// use stratum_alloc::{PoolBuilder, PageAllocator};
///
/// let mut pool = PoolBuilder::default()
///     .blocks_per_chunk(1024)
///     .max_chunks(4)
///     .build_in::<[u8; 48], _>(PageAllocator::new())?;
///
/// let id = pool.create([0; 48]).map_err(|e| e.error())?;
/// assert_eq!(pool.capacity(), 1024);
/// pool.release(id);
/// # Ok::<(), stratum_alloc::AllocError>(())
/// ```
#[derive(Clone, Debug)]
pub struct PoolBuilder {
    blocks_per_chunk: usize,
    max_chunks: Option<usize>,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            blocks_per_chunk: DEFAULT_BLOCKS_PER_CHUNK,
            max_chunks: None,
        }
    }
}

impl PoolBuilder {
    /// Blocks requested from the backing allocator at a time. Default: 64.
    pub fn blocks_per_chunk(mut self, blocks: usize) -> Self {
        self.blocks_per_chunk = blocks;
        self
    }

    /// Upper bound on chunks the pool may hold. Default: unlimited.
    pub fn max_chunks(mut self, chunks: usize) -> Self {
        self.max_chunks = Some(chunks);
        self
    }

    /// Build a pool on the global heap.
    pub fn build<T>(self) -> Result<Pool<T>, AllocError> {
        self.build_in(DefaultAllocator::new())
    }

    /// Build a pool on top of `backing`.
    ///
    /// No memory is requested until the first `create`.
    pub fn build_in<T, A: RawAllocator>(self, backing: A) -> Result<Pool<T, A>, AllocError> {
        if self.blocks_per_chunk == 0 {
            return Err(AllocError::ZeroBlocksPerChunk);
        }
        if self.blocks_per_chunk >= BLOCK_NONE as usize {
            return Err(AllocError::IndexOverflow);
        }

        let layout = Layout::array::<Slot<T>>(self.blocks_per_chunk)
            .map_err(|_| AllocError::InvalidLayout)?;

        Ok(Pool {
            backing,
            layout,
            chunks: Vec::new(),
            blocks_per_chunk: self.blocks_per_chunk as u32,
            max_chunks: self.max_chunks,
            bump: 0,
            free_head: BLOCK_NONE,
            len: 0,
            stats: PoolStats::default(),
            _marker: PhantomData,
        })
    }
}

// =============================================================================
// Pool
// =============================================================================

/// Lifetime counters for a [`Pool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful `create` calls.
    pub creates: u64,
    /// Blocks returned through `release` or `take`.
    pub releases: u64,
    /// Chunks obtained from the backing allocator.
    pub chunks_acquired: u64,
    /// Highest number of simultaneously live blocks.
    pub peak_live: usize,
}

/// Pool of fixed-size blocks over a backing [`RawAllocator`].
///
/// Memory is taken from the backing allocator one chunk of
/// `blocks_per_chunk` blocks at a time and is only given back by
/// [`reset`](Pool::reset) or drop. Released blocks go on a free list threaded
/// through the vacant blocks themselves and are reused before any fresh block
/// is carved.
///
/// `create` order:
/// 1. Pop the free list
/// 2. Bump-carve from the newest chunk
/// 3. Acquire a new chunk
///
/// Chunks never move, so a live value stays at the same address until it is
/// released.
///
/// The pool is not thread-safe. It may be sent to another thread when `T` and
/// the backing allocator can.
pub struct Pool<T, A: RawAllocator = DefaultAllocator> {
    backing: A,
    layout: Layout,

    // Chunk base pointers, oldest first
    chunks: Vec<NonNull<Slot<T>>>,
    blocks_per_chunk: u32,
    max_chunks: Option<usize>,

    // Blocks carved from the newest chunk
    bump: u32,
    free_head: u32,

    len: usize,
    stats: PoolStats,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: RawAllocator + Send> Send for Pool<T, A> {}

impl<T> Pool<T> {
    /// Creates a heap-backed pool with the default configuration.
    pub fn new() -> Result<Self, AllocError> {
        PoolBuilder::default().build()
    }
}

impl<T, A: RawAllocator> Pool<T, A> {
    /// Moves `value` into a block and returns its handle.
    ///
    /// # Errors
    ///
    /// Fails when a new chunk is needed and either the backing allocator is
    /// out of memory or `max_chunks` has been reached. The value is handed
    /// back inside the error.
    pub fn create(&mut self, value: T) -> Result<BlockId, CreateError<T>> {
        let idx = if self.free_head != BLOCK_NONE {
            self.pop_free()
        } else if self.has_bump() {
            self.carve()
        } else {
            if let Err(error) = self.grow() {
                return Err(CreateError::new(value, error));
            }
            self.carve()
        };

        // Safety: idx is carved and vacant
        unsafe { ptr::write(self.slot_ptr(idx), Slot::Occupied { value }) };

        self.len += 1;
        self.stats.creates += 1;
        if self.len > self.stats.peak_live {
            self.stats.peak_live = self.len;
        }

        Ok(BlockId(idx))
    }

    /// Drops the value at `id` and recycles the block.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live block of this pool.
    pub fn release(&mut self, id: BlockId) {
        if self.take(id).is_none() {
            panic!("release of a block that is not live");
        }
    }

    /// Moves the value at `id` out and recycles the block.
    ///
    /// Returns `None` if `id` is not live.
    pub fn take(&mut self, id: BlockId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }

        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        // Safety: contains() checked the block is carved
        let old = unsafe { ptr::replace(self.slot_ptr(id.0), vacant) };

        self.free_head = id.0;
        self.len -= 1;
        self.stats.releases += 1;

        match old {
            Slot::Occupied { value } => Some(value),
            Slot::Vacant { .. } => unreachable!("contains() saw an occupied block"),
        }
    }

    /// Returns true if `id` names a live block.
    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        // Safety: only carved blocks are read
        self.is_carved(id.0) && unsafe { (*self.slot_ptr(id.0)).is_occupied() }
    }

    /// Returns a reference to the value at `id`, or `None` if not live.
    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&T> {
        if !self.is_carved(id.0) {
            return None;
        }
        match unsafe { &*self.slot_ptr(id.0) } {
            Slot::Occupied { value } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Returns a mutable reference to the value at `id`, or `None` if not live.
    #[inline]
    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut T> {
        if !self.is_carved(id.0) {
            return None;
        }
        match unsafe { &mut *self.slot_ptr(id.0) } {
            Slot::Occupied { value } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// # Safety
    ///
    /// `id` must name a live block of this pool.
    #[inline]
    pub unsafe fn get_unchecked(&self, id: BlockId) -> &T {
        debug_assert!(self.contains(id), "get_unchecked on a block that is not live");
        match unsafe { &*self.slot_ptr(id.0) } {
            Slot::Occupied { value } => value,
            Slot::Vacant { .. } => unsafe { std::hint::unreachable_unchecked() },
        }
    }

    /// # Safety
    ///
    /// `id` must name a live block of this pool.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, id: BlockId) -> &mut T {
        debug_assert!(self.contains(id), "get_unchecked_mut on a block that is not live");
        match unsafe { &mut *self.slot_ptr(id.0) } {
            Slot::Occupied { value } => value,
            Slot::Vacant { .. } => unsafe { std::hint::unreachable_unchecked() },
        }
    }

    /// Returns a stable pointer to the value at `id`.
    ///
    /// The pointer stays valid until the block is released or the pool is
    /// reset or dropped.
    pub fn as_ptr(&mut self, id: BlockId) -> Option<NonNull<T>> {
        self.get_mut(id).map(NonNull::from)
    }

    /// Drops every live value and returns all chunks to the backing allocator.
    ///
    /// Every outstanding [`BlockId`] is invalidated. Handles from before the
    /// reset are rejected until blocks are carved again, after which they may
    /// name new values.
    pub fn reset(&mut self) {
        if self.len > 0 {
            tracing::warn!(live = self.len, "resetting pool with live blocks");
        }

        let chunks = self.chunks.len();
        self.release_all();
        self.backing.reset();

        tracing::debug!(chunks, "pool reset");
    }

    /// Number of live blocks.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no block is live.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total blocks across all acquired chunks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunks.len() * self.blocks_per_chunk as usize
    }

    /// Number of chunks currently held.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Blocks per chunk.
    #[inline]
    pub const fn blocks_per_chunk(&self) -> usize {
        self.blocks_per_chunk as usize
    }

    /// Lifetime counters.
    #[inline]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Returns the backing allocator.
    #[inline]
    pub const fn backing(&self) -> &A {
        &self.backing
    }

    // =========================================================================
    // Internal
    // =========================================================================

    #[inline]
    fn has_bump(&self) -> bool {
        !self.chunks.is_empty() && self.bump < self.blocks_per_chunk
    }

    /// Blocks below this number have been written at least once.
    #[inline]
    fn carved(&self) -> usize {
        match self.chunks.len() {
            0 => 0,
            n => (n - 1) * self.blocks_per_chunk as usize + self.bump as usize,
        }
    }

    #[inline]
    fn is_carved(&self, idx: u32) -> bool {
        (idx as usize) < self.carved()
    }

    // idx must be below chunks.len() * blocks_per_chunk
    #[inline]
    fn slot_ptr(&self, idx: u32) -> *mut Slot<T> {
        let chunk = (idx / self.blocks_per_chunk) as usize;
        let offset = (idx % self.blocks_per_chunk) as usize;
        unsafe { self.chunks[chunk].as_ptr().add(offset) }
    }

    #[inline]
    fn pop_free(&mut self) -> u32 {
        let idx = self.free_head;
        // Safety: free list only holds carved blocks
        self.free_head = match unsafe { &*self.slot_ptr(idx) } {
            Slot::Vacant { next_free } => *next_free,
            Slot::Occupied { .. } => unreachable!("occupied block on free list"),
        };
        idx
    }

    #[inline]
    fn carve(&mut self) -> u32 {
        debug_assert!(self.has_bump());
        let idx = (self.chunks.len() - 1) as u32 * self.blocks_per_chunk + self.bump;
        self.bump += 1;
        idx
    }

    #[cold]
    fn grow(&mut self) -> Result<(), AllocError> {
        if let Some(max_chunks) = self.max_chunks {
            if self.chunks.len() >= max_chunks {
                tracing::warn!(max_chunks, "pool chunk limit reached");
                return Err(AllocError::ChunkLimit { max_chunks });
            }
        }

        let blocks = (self.chunks.len() + 1) * self.blocks_per_chunk as usize;
        if blocks > BLOCK_NONE as usize {
            return Err(AllocError::IndexOverflow);
        }

        let ptr = self.backing.allocate(self.layout).inspect_err(|error| {
            tracing::warn!(bytes = self.layout.size(), %error, "failed to acquire pool chunk");
        })?;

        self.chunks.push(ptr.cast());
        self.bump = 0;
        self.stats.chunks_acquired += 1;

        tracing::debug!(
            chunk = self.chunks.len() - 1,
            bytes = self.layout.size(),
            "acquired pool chunk"
        );
        Ok(())
    }

    fn release_all(&mut self) {
        if mem::needs_drop::<T>() && self.len > 0 {
            for idx in 0..self.carved() as u32 {
                let slot = self.slot_ptr(idx);
                // Safety: carved blocks are initialised
                unsafe {
                    if (*slot).is_occupied() {
                        ptr::drop_in_place(slot);
                    }
                }
            }
        }

        for chunk in self.chunks.drain(..) {
            unsafe { self.backing.deallocate(chunk.cast(), self.layout) };
        }

        self.bump = 0;
        self.free_head = BLOCK_NONE;
        self.len = 0;
    }
}

impl<T, A: RawAllocator> Drop for Pool<T, A> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<T, A: RawAllocator> ObjectAllocator<T> for Pool<T, A> {
    type Handle = BlockId;

    #[inline]
    fn create(&mut self, value: T) -> Result<BlockId, CreateError<T>> {
        Pool::create(self, value)
    }

    #[inline]
    fn release(&mut self, handle: BlockId) {
        Pool::release(self, handle);
    }

    fn reset(&mut self) {
        Pool::reset(self);
    }
}

impl<T, A: RawAllocator> std::fmt::Debug for Pool<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("chunks", &self.chunks.len())
            .field("blocks_per_chunk", &self.blocks_per_chunk)
            .finish_non_exhaustive()
    }
}
