//! External query hooks (spec.md §4.1 "External queries during this
//! pass" and §6 "Input collaborators"). The Liveness Pass consults these
//! once, before traversal, and the core never computes their answers
//! itself — it only applies the documented defaults when a hook (or a
//! per-node entry) is absent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::ir::{ExprArena, ExprId, Function};
use crate::target::TargetMap;

/// `expr_node -> device_type`. A missing entry means "unannotated" (`0`).
pub type DeviceMap = HashMap<ExprId, i32>;

/// `expr_node -> [scope_string]`, one string per produced tensor. A
/// missing entry means every token of that node gets `"global"`.
pub type ScopeMap = HashMap<ExprId, Vec<String>>;

/// Supplies per-node device-type annotations for a function.
pub trait DeviceHook {

	fn device_map(&self, arena: &ExprArena, function: &Function) -> DeviceMap;
}

/// Supplies per-node storage-scope annotations for a function, given the
/// device map and the target map the backend compiled against.
pub trait StorageScopeHook {

	fn storage_scope_map(
		&self,
		arena: &ExprArena,
		function: &Function,
		device_map: &DeviceMap,
		target_map: &TargetMap,
	) -> ScopeMap;
}

/// A hook with no opinions: empty device map, empty scope map. This is
/// the "absent hook" default spec.md §6 describes, spelled out as a real
/// implementation so callers who have nothing backend-specific to say can
/// still call `Plan` directly.
pub struct NullHooks;

impl DeviceHook for NullHooks {

	fn device_map(&self, _arena: &ExprArena, _function: &Function) -> DeviceMap {

		DeviceMap::new()
	}
}

impl StorageScopeHook for NullHooks {

	fn storage_scope_map(
		&self,
		_arena: &ExprArena,
		_function: &Function,
		_device_map: &DeviceMap,
		_target_map: &TargetMap,
	) -> ScopeMap {

		ScopeMap::new()
	}
}

lazy_static! {
	/// The storage-scope hook registry, keyed by the string spec.md §6
	/// builds from a target map (see [`target::storage_info_hook_key`]).
	/// A `target_map` that resolves to no registered key falls back to
	/// `NullHooks`'s empty scope map (every token defaults to
	/// `"global"`), matching "Absent hook => empty mapping".
	static ref STORAGE_SCOPE_HOOKS: Mutex<HashMap<String, Arc<dyn StorageScopeHook + Send + Sync>>> =
		Mutex::new(HashMap::new());
}

/// Registers a storage-scope hook under `key` (overwriting any previous
/// registration under the same key), the way a backend would register
/// its `"relay.backend.<kind>._CollectStorageInfo"` implementation.
pub fn register_storage_scope_hook<K, H>(key: K, hook: H)
	where K: Into<String>, H: StorageScopeHook + Send + Sync + 'static
{
	let mut hooks = STORAGE_SCOPE_HOOKS.lock().expect("storage-scope hook registry poisoned");
	hooks.insert(key.into(), Arc::new(hook));
}

/// Looks up a registered storage-scope hook by key. Returns `None` if no
/// backend registered one under this exact key.
pub fn lookup_storage_scope_hook(key: &str) -> Option<Arc<dyn StorageScopeHook + Send + Sync>> {

	let hooks = STORAGE_SCOPE_HOOKS.lock().expect("storage-scope hook registry poisoned");
	hooks.get(key).cloned()
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ir::{Expr, ExprArena, Function, Type, TensorType, DataType};
	use crate::target::{storage_info_hook_key, Target, TargetMap};

	struct AllTexture;

	impl StorageScopeHook for AllTexture {

		fn storage_scope_map(
			&self,
			arena: &ExprArena,
			function: &Function,
			_device_map: &DeviceMap,
			_target_map: &TargetMap,
		) -> ScopeMap {

			let mut map = ScopeMap::new();
			map.insert(function.body, vec!["texture".into()]);
			let _ = arena;
			map
		}
	}

	#[test]
	fn registers_and_resolves_by_key() {
		let mut targets = TargetMap::new();
		targets.insert(0, Target::new("opencl"));
		let key = storage_info_hook_key(&targets);

		register_storage_scope_hook(key.clone(), AllTexture);
		assert!(lookup_storage_scope_hook(&key).is_some());
		assert!(lookup_storage_scope_hook("relay.backend.unregistered._CollectStorageInfo").is_none());

		let mut arena = ExprArena::new();
		let ty = Type::Tensor(TensorType::new(vec![1i64], DataType::new(32, 1)));
		let body = arena.alloc(Expr::Constant { ty });
		let function = Function::new(vec![], body);

		let hook = lookup_storage_scope_hook(&key).unwrap();
		let scopes = hook.storage_scope_map(&arena, &function, &DeviceMap::new(), &targets);
		assert_eq!(scopes.get(&body).unwrap(), &vec!["texture".to_string()]);
	}
}
