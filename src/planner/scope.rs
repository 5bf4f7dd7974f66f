//! The flattening convention (spec.md §6): collapsing an N-D shape into a
//! `(width, height, channel)` triple for the 2D image allocator, the way
//! a scope string's suffix says to.

/// The axis separator a scope string selects, per spec.md §6's table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Separator {
	/// `r - 2`: the default for `"texture"` and any other bare
	/// `texture:*` scope this crate doesn't special-case.
	Default,
	/// `1`: `"texture:weight"`.
	Weight,
	/// `2`: `"texture:nhwc"`.
	Nhwc,
}

fn separator_for(scope: &str) -> Separator {

	if scope.ends_with(":weight") {
		Separator::Weight
	} else if scope.ends_with(":nhwc") {
		Separator::Nhwc
	} else {
		Separator::Default
	}
}

/// A flattened 2D image request: `width * height` texels, each carrying
/// `channel` scalar lanes of the producing tensor's dtype.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FlatImageShape {
	pub width: i64,
	pub height: i64,
	pub channel: i64,
}

/// Collapses `dims` (already validated concrete, non-negative) under
/// `scope`'s flattening rule.
///
/// The last dimension is always the channel axis, carried through as a
/// tag for the image dtype; per the worked example in spec.md §8 (scenario
/// 5), it is *also* folded into the geometric `width` product — a texel
/// row packs the channel lanes contiguously, so the allocator still has to
/// reserve `width * channel` texels' worth of row storage.
pub fn flatten(dims: &[i64], scope: &str) -> FlatImageShape {

	let rank = dims.len();
	let channel = if rank > 0 { dims[rank - 1] } else { 1 };

	let sep = match separator_for(scope) {
		Separator::Weight => 1usize.min(rank),
		Separator::Nhwc => 2usize.min(rank),
		Separator::Default => rank.saturating_sub(2),
	};

	let height = product(&dims[0..sep]);
	let width = product(&dims[sep..rank]);

	FlatImageShape { width: width, height: height, channel: channel }
}

fn product(dims: &[i64]) -> i64 {

	if dims.is_empty() {
		1
	} else {
		dims.iter().product()
	}
}

/// Whether a scope string routes to the 2D image allocator (spec.md §4.5:
/// "a scope string contains the substring `texture`").
pub fn is_texture_scope(scope: &str) -> bool {

	scope.contains("texture")
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn default_separator_scenario_5_first_shape() {
		let flat = flatten(&[1, 64, 64, 4], "texture");
		assert_eq!(flat, FlatImageShape { width: 256, height: 64, channel: 4 });
	}

	#[test]
	fn default_separator_scenario_5_second_shape() {
		let flat = flatten(&[1, 32, 128, 4], "texture");
		assert_eq!(flat, FlatImageShape { width: 512, height: 32, channel: 4 });
	}

	#[test]
	fn weight_separator_puts_leading_dim_in_height() {
		let flat = flatten(&[16, 3, 3, 32], "texture:weight");
		assert_eq!(flat.height, 16);
		assert_eq!(flat.width, 3 * 3 * 32);
		assert_eq!(flat.channel, 32);
	}

	#[test]
	fn nhwc_separator_matches_default_at_rank_4() {
		let default = flatten(&[1, 64, 64, 4], "texture");
		let nhwc = flatten(&[1, 64, 64, 4], "texture:nhwc");
		assert_eq!(default, nhwc);
	}

	#[test]
	fn recognizes_texture_substrings() {
		assert!(is_texture_scope("texture"));
		assert!(is_texture_scope("texture:weight"));
		assert!(is_texture_scope("texture:nhwc"));
		assert!(!is_texture_scope("global"));
	}
}
