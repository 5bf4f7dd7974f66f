//! `TokenAllocator2D` — the image-buffer pool (spec.md §4.4).

use std::collections::HashMap;

use crate::ir::DataType;
use crate::planner::scope::{flatten, FlatImageShape};
use crate::token::{TokenArena, TokenId};

/// Per-block state: the block's current extent plus the dtype and device
/// it serves, keyed by `storage_id`.
struct Block {
	x: i64,
	y: i64,
	dtype: DataType,
	device_type: i32,
}

/// Manages 2D image buffers keyed by `(width, height, dtype)`, choosing
/// on reuse the free block that minimizes expansion waste.
#[derive(Default)]
pub struct TokenAllocator2D {
	blocks: HashMap<i64, Block>,
	free: Vec<i64>,
}

impl TokenAllocator2D {

	pub fn new() -> TokenAllocator2D {

		TokenAllocator2D { blocks: HashMap::new(), free: Vec::new() }
	}

	/// Flattens `token`'s tensor shape under `scope` into a 2D image
	/// request, per spec.md §6.
	pub fn flatten_request(arena: &TokenArena, token: TokenId) -> crate::error::Result<FlatImageShape> {

		let t = arena.get(token);
		let dims = t.ttype.shape.concrete_dims()?;
		Ok(flatten(&dims, &t.storage_scope))
	}

	pub fn allocate(&mut self, arena: &TokenArena, token: TokenId, request: FlatImageShape, counter: &super::StorageIdCounter) -> i64 {

		let id = counter.next();
		let t = arena.get(token);

		self.blocks.insert(id, Block {
			x: request.width,
			y: request.height,
			dtype: t.ttype.dtype,
			device_type: t.device_type,
		});

		drop(t);

		let mut t = arena.get_mut(token);
		t.storage_id = id;

		id
	}

	/// Attempts reuse for a `(w, h)` request of dtype `dtype`. Returns
	/// `None` on "no reuse possible".
	///
	/// Prefers the free block minimizing `added` (the extra texels the
	/// block would need to grow by); ties at `added == 0` are broken by
	/// minimizing `wasted` (unused texels in the grown block). The best
	/// candidate is accepted only if `added <= w * h` — reuse never grows
	/// a block by more than the size of the tensor that's moving in.
	pub fn request(&mut self, arena: &TokenArena, token: TokenId, request: FlatImageShape) -> Option<i64> {

		let dtype = arena.get(token).ttype.dtype;
		let requested_size = request.width * request.height;

		let mut best: Option<(i64, i64, i64)> = None; // (storage_id, added, wasted)

		for &id in &self.free {
			let block = &self.blocks[&id];
			if block.dtype != dtype {
				continue;
			}

			let new_x = block.x.max(request.width);
			let new_y = block.y.max(request.height);
			let expanded = new_x * new_y;
			let added = expanded - (block.x * block.y);
			let wasted = expanded - requested_size;

			let better = match best {
				None => true,
				Some((_, best_added, best_wasted)) => {
					added < best_added || (added == best_added && wasted < best_wasted)
				},
			};

			if better {
				best = Some((id, added, wasted));
			}
		}

		let (id, added, _) = best?;

		if added > requested_size {
			return None;
		}

		{
			let block = self.blocks.get_mut(&id).expect("free-list id must have a block");
			block.x = block.x.max(request.width);
			block.y = block.y.max(request.height);
		}

		self.free.retain(|&existing| existing != id);

		let mut t = arena.get_mut(token);
		t.storage_id = id;

		Some(id)
	}

	pub fn release(&mut self, arena: &TokenArena, token: TokenId) {

		let t = arena.get(token);

		debug_assert!(t.storage_id >= 0, "release of an unassigned token");
		debug_assert!(t.ref_counter >= 0, "release of a token with negative ref_counter");

		if t.ref_counter == 0 {
			self.free.push(t.storage_id);
		}
	}

	pub fn total_alloc_blocks(&self) -> usize {

		self.blocks.len()
	}
}
