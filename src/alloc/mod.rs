//! The two-level storage allocator (spec.md §4.3–4.5): a thin dispatch
//! façade over the 1D linear-buffer pool and the 2D image-buffer pool,
//! sharing one monotonically increasing storage-id counter.

pub use self::image::TokenAllocator2D;
pub use self::linear::TokenAllocator1D;

mod image;
mod linear;

use std::cell::Cell;

use crate::error::Result;
use crate::planner::scope::is_texture_scope;
use crate::token::{TokenArena, TokenId};

/// The storage-id counter shared by both sub-allocators. Single-threaded
/// (spec.md §5), so a bare `Cell` is enough — no atomics needed.
#[derive(Default)]
pub struct StorageIdCounter(Cell<i64>);

impl StorageIdCounter {

	pub fn new() -> StorageIdCounter {

		StorageIdCounter(Cell::new(0))
	}

	pub fn next(&self) -> i64 {

		let id = self.0.get();
		self.0.set(id + 1);
		id
	}
}

/// Routes each request to the 1D or 2D sub-allocator based on the
/// token's storage scope (spec.md §4.5): a scope string containing
/// `"texture"` goes to the 2D allocator, everything else to the 1D
/// allocator.
#[derive(Default)]
pub struct TokenAllocator {
	counter: StorageIdCounter,
	linear: TokenAllocator1D,
	image: TokenAllocator2D,
}

impl TokenAllocator {

	pub fn new() -> TokenAllocator {

		TokenAllocator {
			counter: StorageIdCounter::new(),
			linear: TokenAllocator1D::new(),
			image: TokenAllocator2D::new(),
		}
	}

	/// `Allocate`: creates a brand-new storage id for `token`, skipping
	/// any reuse search.
	pub fn allocate(&mut self, arena: &TokenArena, token: TokenId) -> Result<i64> {

		let scope = arena.get(token).storage_scope.clone();

		if is_texture_scope(&scope) {
			let request = TokenAllocator2D::flatten_request(arena, token)?;
			Ok(self.image.allocate(arena, token, request, &self.counter))
		} else {
			let size = TokenAllocator1D::size_of(arena, token)?;
			Ok(self.linear.allocate(arena, token, size, &self.counter))
		}
	}

	/// `Request`: tries sub-allocator reuse first, falling back to
	/// `Allocate` on a miss. Always returns a valid storage id — the
	/// caller never has to handle "no buffer available".
	///
	/// Only global-scoped tokens go through the 1D allocator's reuse
	/// path; any other non-texture scope is opaque to 1D reuse and is
	/// allocated fresh every time (spec.md §4.2, §3). The 2D allocator
	/// always attempts reuse regardless of scope suffix.
	pub fn request(&mut self, arena: &TokenArena, token: TokenId) -> Result<i64> {

		let scope = arena.get(token).storage_scope.clone();

		if is_texture_scope(&scope) {
			let request = TokenAllocator2D::flatten_request(arena, token)?;

			if let Some(id) = self.image.request(arena, token, request) {
				return Ok(id);
			}

			Ok(self.image.allocate(arena, token, request, &self.counter))
		} else {
			let size = TokenAllocator1D::size_of(arena, token)?;

			if scope == "global" {
				if let Some(id) = self.linear.request(arena, token, size) {
					return Ok(id);
				}
			}

			Ok(self.linear.allocate(arena, token, size, &self.counter))
		}
	}

	/// Releases `token`'s storage id to the appropriate sub-allocator's
	/// free list, iff its `ref_counter` has reached zero.
	pub fn release(&mut self, arena: &TokenArena, token: TokenId) {

		if is_texture_scope(&arena.get(token).storage_scope) {
			self.image.release(arena, token);
		} else {
			self.linear.release(arena, token);
		}
	}

	/// Total bytes committed by the 1D allocator across every distinct
	/// storage id it has ever handed out.
	pub fn total_alloc_bytes(&self) -> u64 {

		self.linear.total_alloc_bytes()
	}

	pub fn total_alloc_blocks(&self) -> usize {

		self.linear.total_alloc_blocks() + self.image.total_alloc_blocks()
	}
}
