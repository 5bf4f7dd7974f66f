//! Serialization (spec.md §4.6): after assignment, produce a mapping
//! from each tensor-producing expression node to a triple of equal-length
//! arrays — `storage_ids`, `device_types`, `storage_scopes` — and enforce
//! the all-or-none device-annotation invariant (spec.md §3) one last
//! time before handing the plan to the codegen consumer.
//!
//! This module also carries two export formats the distilled spec is
//! silent on but a real downstream consumer needs (see `SPEC_FULL.md`
//! §B): a JSON dump for debugging/snapshotting, and a compact
//! little-endian binary dump of the integer arrays for a native
//! consumer, using `byteorder` the way the teacher crate declares (if,
//! in its retained module tree, never exercises) it for exactly this
//! kind of fixed-width layout work.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{ErrorKind, Result};
use crate::ir::{Expr, ExprArena, ExprId, Function};
use crate::planner::ProtoMap;
use crate::token::{TokenArena, TokenId};

/// One node's serialized plan: parallel arrays, one entry per tensor the
/// node produces.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodePlan {
	pub storage_ids: Vec<i64>,
	pub device_types: Vec<i32>,
	pub storage_scopes: Vec<String>,
}

/// The planner's final output: one [`NodePlan`] per tensor-producing
/// node. Pure-aliasing nodes (`Tuple`, `TupleGetItem`, `Let`, a
/// `Let`-bound `Var`, leaves) carry no entry of their own — their tensors
/// are the same tokens their underlying producer already reported. Only a
/// function-parameter `Var` carries an independent token.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PlanResult {
	nodes: HashMap<String, NodePlan>,
}

impl PlanResult {

	pub fn get(&self, node: ExprId) -> Option<&NodePlan> {

		self.nodes.get(&node.describe())
	}

	pub fn len(&self) -> usize {

		self.nodes.len()
	}

	pub fn to_json(&self) -> serde_json::Result<String> {

		serde_json::to_string_pretty(self)
	}

	/// Writes `storage_ids` then `device_types` for every node, each
	/// array little-endian, each preceded by its `u32` length — a small
	/// fixed-width wire format a native codegen consumer can read without
	/// a parser.
	pub fn write_le<W: Write>(&self, mut w: W) -> io::Result<()> {

		let mut keys: Vec<&String> = self.nodes.keys().collect();
		keys.sort();

		w.write_u32::<LittleEndian>(keys.len() as u32)?;

		for key in keys {
			let entry = &self.nodes[key];

			w.write_u32::<LittleEndian>(entry.storage_ids.len() as u32)?;

			for &id in &entry.storage_ids {
				w.write_i64::<LittleEndian>(id)?;
			}

			for &dt in &entry.device_types {
				w.write_i32::<LittleEndian>(dt)?;
			}
		}

		Ok(())
	}
}

/// Whether `node` carries an independent token of its own rather than
/// aliasing another node's. `Constant` and `Call` always do; `Var` only
/// does when `node` is a function parameter — a `Let`-bound `Var` aliases
/// its bound value's tokens (`src/planner/liveness.rs`'s `proto.insert(*var,
/// value_tokens)`) and must not be serialized a second time under its own
/// entry (spec.md §4.6: "excluding pure aliasing nodes").
fn is_producer(expr: &Expr, node: ExprId, params: &HashSet<ExprId>) -> bool {

	match expr {
		Expr::Constant { .. } | Expr::Call { .. } => true,
		Expr::Var { .. } => params.contains(&node),
		_ => false,
	}
}

/// Builds the final [`PlanResult`] from a completed assignment, checking
/// the all-or-none device-annotation invariant across every token the
/// arena holds.
pub fn build(arena: &ExprArena, function: &Function, tokens: &TokenArena, proto: &ProtoMap) -> Result<PlanResult> {

	enforce_device_consistency(tokens)?;

	let params: HashSet<ExprId> = function.params.iter().copied().collect();
	let mut nodes = HashMap::new();

	for (&node, token_ids) in proto {
		if !is_producer(arena.get(node), node, &params) {
			continue;
		}

		let mut plan = NodePlan::default();

		for &token in token_ids {
			let t = tokens.get(token);
			plan.storage_ids.push(t.storage_id);
			plan.device_types.push(t.device_type);
			plan.storage_scopes.push(t.storage_scope.clone());
		}

		nodes.insert(node.describe(), plan);
	}

	Ok(PlanResult { nodes: nodes })
}

fn enforce_device_consistency(tokens: &TokenArena) -> Result<()> {

	let mut annotated = 0usize;
	let mut unannotated = 0usize;

	for i in 0..tokens.len() {
		let token = tokens.get(TokenId::from_index(i));

		if token.device_type != 0 {
			annotated += 1;
		} else {
			unannotated += 1;
		}
	}

	if annotated > 0 && unannotated > 0 {
		return Err(ErrorKind::MixedDeviceAnnotation { annotated: annotated, unannotated: unannotated }.into());
	}

	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ir::{DataType, TensorType};

	#[test]
	fn rejects_mixed_device_annotation() {
		let mut tokens = TokenArena::new();
		let ttype = TensorType::new(vec![1i64], DataType::new(32, 1));
		tokens.alloc(ttype.clone(), 0, "global".into());
		tokens.alloc(ttype, 1, "global".into());

		let err = enforce_device_consistency(&tokens).unwrap_err();
		assert_eq!(*err.kind(), ErrorKind::MixedDeviceAnnotation { annotated: 1, unannotated: 1 });
	}

	#[test]
	fn accepts_all_unannotated() {
		let mut tokens = TokenArena::new();
		let ttype = TensorType::new(vec![1i64], DataType::new(32, 1));
		tokens.alloc(ttype.clone(), 0, "global".into());
		tokens.alloc(ttype, 0, "global".into());

		assert!(enforce_device_consistency(&tokens).is_ok());
	}
}
