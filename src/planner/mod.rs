//! The planner: two sequential passes over a function body plus a
//! two-level allocator (spec.md §2). [`plan`] is the single entry point;
//! everything else in this module is its internal machinery.

pub mod scope;

mod assignment;
mod liveness;

use std::collections::HashMap;

use crate::alloc::TokenAllocator;
use crate::error::Result;
use crate::hooks::{DeviceHook, NullHooks, StorageScopeHook};
use crate::ir::{ExprArena, ExprId, Function};
use crate::serialize::PlanResult;
use crate::target::{storage_info_hook_key, TargetMap};
use crate::token::{TokenArena, TokenId};

/// `expr_node -> [StorageToken]`, built by the Liveness Pass and mutated
/// in place by the Assignment Pass (each token's `storage_id` goes from
/// unassigned to assigned; nothing is ever replaced or removed).
pub type ProtoMap = HashMap<ExprId, Vec<TokenId>>;

/// Runs the full planner over `function`: Liveness Pass, then Assignment
/// Pass, then serialization, per spec.md §2's control flow.
///
/// `device_hook` supplies the per-node device-type annotations (spec.md
/// §4.1's "Device map"). The storage-scope hook is resolved internally,
/// by looking up the key spec.md §6 builds from `target_map`
/// (`"relay.backend" + ".<kind>"[+ ".<attr>"]*+ "._CollectStorageInfo"`)
/// in the global hook registry ([`hooks::register_storage_scope_hook`]);
/// an unregistered key falls back to the documented default (every token
/// gets `"global"`).
pub fn plan(arena: &ExprArena, function: &Function, target_map: &TargetMap, device_hook: &dyn DeviceHook) -> Result<PlanResult> {

	log::debug!("planning function with {} parameter(s), {} arena node(s)", function.params.len(), arena.len());

	let device_map = device_hook.device_map(arena, function);

	let hook_key = storage_info_hook_key(target_map);
	let scope_map = match super::hooks::lookup_storage_scope_hook(&hook_key) {
		Some(hook) => hook.storage_scope_map(arena, function, &device_map, target_map),
		None => {
			log::trace!("no storage-scope hook registered under {:?}; defaulting every token to \"global\"", hook_key);
			NullHooks.storage_scope_map(arena, function, &device_map, target_map)
		},
	};

	let mut tokens = TokenArena::new();
	let proto = liveness::run(arena, function, &mut tokens, &device_map, &scope_map)?;

	let mut allocator = TokenAllocator::new();
	assignment::run(arena, function, &tokens, &proto, &mut allocator)?;

	log::debug!(
		"planning complete: {} token(s), {} distinct storage id(s)",
		tokens.len(),
		allocator.total_alloc_blocks(),
	);

	super::serialize::build(arena, function, &tokens, &proto)
}
