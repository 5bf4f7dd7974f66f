//! `TokenAllocator1D` — the linear buffer pool (spec.md §4.3).

use std::collections::{BTreeMap, HashMap};

use crate::token::{TokenArena, TokenId};

/// Fixed tuning constant for the fuzzy size-match search: a free buffer is
/// only considered if its cached size is within `[requested / RANGE,
/// requested * RANGE]`. Not exposed as a constructor argument — spec.md
/// §4.3 calls it "a fixed tuning constant", and the design notes (§9) warn
/// against loosening allocator guards as an unreviewed behavior change.
const RANGE: u64 = 16;

/// Per-storage-id bookkeeping the allocator keeps for itself, independent
/// of any one node's [`StorageToken`](../token/struct.StorageToken.html).
/// Because a reused buffer is shared across every node whose request hit
/// it, the high-water-mark size and device type live here rather than on
/// any single token — the per-node token only remembers the `storage_id`
/// it was assigned.
struct Entry {
	max_bytes: u64,
	device_type: i32,
}

/// Manages linear byte buffers: a size-indexed free list with fuzzy
/// size-match reuse, falling back to fresh allocation on a miss.
///
/// `data` is keyed by `storage_id` rather than indexed positionally — the
/// dispatch layer (`src/alloc/mod.rs`) shares one `StorageIdCounter` between
/// this allocator and `TokenAllocator2D`, so a mixed-scope function leaves
/// gaps in the ids this allocator ever sees (a `"texture"` allocation
/// advances the counter without ever touching `data`). A `Vec` indexed by
/// `id as usize` would go out of bounds the first time that happened;
/// keying by id, exactly as `TokenAllocator2D::blocks` does, tolerates gaps.
#[derive(Default)]
pub struct TokenAllocator1D {
	data: HashMap<i64, Entry>,
	/// `max_bytes -> [storage_id]`, the free list. Size-ordered so the
	/// fuzzy search can walk up and down from the requested size.
	free_list: BTreeMap<u64, Vec<i64>>,
}

impl TokenAllocator1D {

	pub fn new() -> TokenAllocator1D {

		TokenAllocator1D { data: HashMap::new(), free_list: BTreeMap::new() }
	}

	/// Size computation per spec.md §4.3: product of shape dimensions
	/// times `ceil((bits * lanes) / 8)`.
	pub fn size_of(arena: &TokenArena, token: TokenId) -> crate::error::Result<u64> {

		arena.get(token).ttype.size_bytes()
	}

	/// Allocates a brand-new storage id for `token`, unconditionally.
	pub fn allocate(&mut self, arena: &TokenArena, token: TokenId, size: u64, counter: &super::StorageIdCounter) -> i64 {

		let id = counter.next();

		self.data.insert(id, Entry { max_bytes: size, device_type: arena.get(token).device_type });

		let mut t = arena.get_mut(token);
		t.storage_id = id;
		t.max_bytes = size;

		id
	}

	/// Attempts fuzzy-match reuse for `token`; on a hit, updates the
	/// matched entry's high-water mark and the token's own bookkeeping.
	/// Returns `None` ("no reuse possible") on a miss, so the caller falls
	/// back to [`allocate`](#method.allocate).
	pub fn request(&mut self, arena: &TokenArena, token: TokenId, size: u64) -> Option<i64> {

		let device_type = arena.get(token).device_type;

		let id = self.find_reuse(size, device_type)?;

		{
			let entry = self.data.get_mut(&id).expect("free-list id must have a data entry");
			entry.max_bytes = entry.max_bytes.max(size);

			let mut t = arena.get_mut(token);
			t.storage_id = id;
			t.max_bytes = entry.max_bytes;
			// `ref_counter` already carries the requester's own count —
			// each node keeps its own `StorageToken` object, only the
			// integer `storage_id` is shared across reuse, so there is
			// nothing to copy here (see DESIGN.md).
		}

		self.remove_from_free_list(id);

		Some(id)
	}

	fn find_reuse(&self, size: u64, device_type: i32) -> Option<i64> {

		let lower = size / RANGE;
		let upper = size.saturating_mul(RANGE);

		for (_, ids) in self.free_list.range(size..=upper) {
			if let Some(&id) = ids.iter().find(|&&id| self.data[&id].device_type == device_type) {
				return Some(id);
			}
		}

		for (_, ids) in self.free_list.range(lower..size).rev() {
			if let Some(&id) = ids.iter().find(|&&id| self.data[&id].device_type == device_type) {
				return Some(id);
			}
		}

		None
	}

	fn remove_from_free_list(&mut self, id: i64) {

		let max_bytes = self.data[&id].max_bytes;

		if let Some(ids) = self.free_list.get_mut(&max_bytes) {
			ids.retain(|&existing| existing != id);
			if ids.is_empty() {
				self.free_list.remove(&max_bytes);
			}
		}
	}

	/// Releases `token`'s storage id back to the free list, iff its
	/// `ref_counter` has reached zero. Requires `storage_id >= 0` and
	/// `ref_counter >= 0`.
	pub fn release(&mut self, arena: &TokenArena, token: TokenId) {

		let t = arena.get(token);

		debug_assert!(t.storage_id >= 0, "release of an unassigned token");
		debug_assert!(t.ref_counter >= 0, "release of a token with negative ref_counter");

		if t.ref_counter != 0 {
			return;
		}

		let id = t.storage_id;
		let max_bytes = self.data[&id].max_bytes;
		drop(t);

		self.free_list.entry(max_bytes).or_insert_with(Vec::new).push(id);
	}

	/// Total bytes committed across every distinct storage id this
	/// allocator has ever handed out (not just currently live ones).
	pub fn total_alloc_bytes(&self) -> u64 {

		self.data.values().map(|e| e.max_bytes).sum()
	}

	pub fn total_alloc_blocks(&self) -> usize {

		self.data.len()
	}
}
