use std::cell::{Ref, RefCell, RefMut};
use crate::ir::TensorType;

/// A stable handle into a [`TokenArena`]. Cheap to copy; this is what
/// flows through the prototype and assignment maps instead of the token
/// data itself.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TokenId(usize);

impl TokenId {

	/// Reconstructs a handle from its raw index, for callers that walk
	/// every slot of a [`TokenArena`] by position (serialization's
	/// device-consistency sweep).
	pub fn from_index(index: usize) -> TokenId {

		TokenId(index)
	}
}

/// The planner's unit of reservation — one per tensor a node produces.
///
/// Mirrors spec.md §3's field table exactly. `storage_id == -1` means
/// "not yet allocated"; every surviving token after the Assignment Pass
/// has `storage_id >= 0`.
#[derive(Clone, Debug)]
pub struct StorageToken {
	/// Back-reference to the producing tensor type, for shape/dtype.
	pub ttype: TensorType,
	/// `0` means "unannotated".
	pub device_type: i32,
	/// `"global"`, or a string containing `"texture"` with an optional
	/// `":weight"`/`":nhwc"` suffix.
	pub storage_scope: String,
	/// Remaining consumers. Reaching zero after a consume makes the
	/// buffer eligible for release.
	pub ref_counter: i32,
	/// High-water-mark byte size across every prototype this token (1D
	/// buffers only) has served.
	pub max_bytes: u64,
	/// Assigned on first allocation; `-1` means unassigned.
	pub storage_id: i64,
	texture: bool,
}

impl StorageToken {

	fn new(ttype: TensorType, device_type: i32, storage_scope: String) -> StorageToken {

		let texture = storage_scope.contains("texture");

		StorageToken {
			ttype: ttype,
			device_type: device_type,
			storage_scope: storage_scope,
			ref_counter: 0,
			max_bytes: 0,
			storage_id: -1,
			texture: texture,
		}
	}

	/// Precomputed once at creation (design note §9): avoids re-scanning
	/// `storage_scope` on every allocator dispatch.
	pub fn is_texture(&self) -> bool {

		self.texture
	}

	pub fn is_global(&self) -> bool {

		self.storage_scope == "global"
	}

	pub fn is_assigned(&self) -> bool {

		self.storage_id >= 0
	}
}

/// Owns every [`StorageToken`] created during planning.
///
/// Tokens are appended only and never destroyed individually; the whole
/// arena is dropped together when planning completes (spec.md §5). A
/// `RefCell` per slot gives both passes mutable access to a token through
/// its stable `TokenId` without threading `&mut` references through the
/// recursive tree walk.
#[derive(Default)]
pub struct TokenArena {
	tokens: Vec<RefCell<StorageToken>>,
}

impl TokenArena {

	pub fn new() -> TokenArena {

		TokenArena { tokens: Vec::new() }
	}

	pub fn alloc(&mut self, ttype: TensorType, device_type: i32, storage_scope: String) -> TokenId {

		let id = TokenId(self.tokens.len());
		self.tokens.push(RefCell::new(StorageToken::new(ttype, device_type, storage_scope)));
		id
	}

	pub fn get(&self, id: TokenId) -> Ref<StorageToken> {

		self.tokens[id.0].borrow()
	}

	pub fn get_mut(&self, id: TokenId) -> RefMut<StorageToken> {

		self.tokens[id.0].borrow_mut()
	}

	pub fn len(&self) -> usize {

		self.tokens.len()
	}

	/// Adds `delta` to a token's `ref_counter` and returns the new value.
	pub fn adjust_ref(&self, id: TokenId, delta: i32) -> i32 {

		let mut token = self.get_mut(id);
		token.ref_counter += delta;
		token.ref_counter
	}
}
