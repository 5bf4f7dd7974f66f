use linear_map::LinearMap;

/// A compilation target: the device kind plus an optional device
/// attribute, the way spec.md §6 describes the storage-scope hook's
/// registration key being built.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Target {
	pub kind: String,
	pub device_attr: Option<String>,
}

impl Target {

	pub fn new<S: Into<String>>(kind: S) -> Target {

		Target { kind: kind.into(), device_attr: None }
	}

	pub fn with_device_attr<S: Into<String>>(mut self, attr: S) -> Target {

		self.device_attr = Some(attr.into());
		self
	}
}

/// `device_type -> Target`, in ascending device-id order. Small by
/// construction (one entry per device a backend targets), so — like the
/// teacher's `copies: LinearMap<Context, Memory>` in `SharedTensor` — a
/// linear map is the right tool: no hashing overhead for a handful of
/// entries, and insertion order plus `iter()` naturally walks ascending
/// once devices are registered low-to-high.
pub type TargetMap = LinearMap<i32, Target>;

/// Builds the registry key the storage-scope hook is looked up under:
/// `"relay.backend" + ".<kind>"[+ ".<device_attr>"]*` per target, in
/// ascending device-id order, followed by `"._CollectStorageInfo"`.
pub fn storage_info_hook_key(target_map: &TargetMap) -> String {

	let mut entries: Vec<(&i32, &Target)> = target_map.iter().collect();
	entries.sort_by_key(|&(id, _)| *id);

	let mut key = String::from("relay.backend");

	for (_, target) in entries {
		key.push('.');
		key.push_str(&target.kind);

		if let Some(ref attr) = target.device_attr {
			key.push('.');
			key.push_str(attr);
		}
	}

	key.push_str("._CollectStorageInfo");
	key
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn builds_key_in_ascending_device_order() {
		let mut targets = TargetMap::new();
		targets.insert(1, Target::new("opencl").with_device_attr("mali"));
		targets.insert(0, Target::new("llvm"));

		assert_eq!(
			storage_info_hook_key(&targets),
			"relay.backend.llvm.opencl.mali._CollectStorageInfo"
		);
	}
}
