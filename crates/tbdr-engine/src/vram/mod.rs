//! Video-memory heap for texture storage.
//!
//! The arena is split into fixed-size pages tracked by a byte map. Textures
//! own page-aligned blocks; when no free run is long enough the heap slides
//! live blocks toward page 0 and retries.

mod heap;

pub use heap::{Resident, VramBlock, VramHeap};
