extern crate proptest;
extern crate tensorplan;

use proptest::prelude::*;
use tensorplan::hooks::NullHooks;
use tensorplan::ir::{DataType, Expr, ExprArena, Function, TensorType, Type};
use tensorplan::target::TargetMap;

/// Builds a linear chain of `len` unary calls over a fixed-size tensor and
/// returns the function's final node id.
fn build_chain(len: usize) -> (ExprArena, Function) {

	let ty = Type::Tensor(TensorType::new(vec![32i64], DataType::new(32, 1)));
	let mut arena = ExprArena::new();

	let mut current = arena.alloc(Expr::Var { ty: ty.clone() });
	let param = current;

	for i in 0..len {
		current = arena.alloc(Expr::Call { op: format!("op{}", i), args: vec![current], ty: ty.clone() });
	}

	(arena, Function::new(vec![param], current))
}

proptest! {
	// Determinism: planning the same function body twice yields the same
	// storage-id assignment every time (spec.md §5's single-threaded,
	// deterministic contract).
	#[test]
	fn planning_a_chain_is_deterministic(len in 1usize..24) {
		let (arena, function) = build_chain(len);

		let first = tensorplan::plan(&arena, &function, &TargetMap::new(), &NullHooks).unwrap();
		let second = tensorplan::plan(&arena, &function, &TargetMap::new(), &NullHooks).unwrap();

		prop_assert_eq!(first.len(), second.len());

		let first_id = first.get(function.body).unwrap().storage_ids[0];
		let second_id = second.get(function.body).unwrap().storage_ids[0];
		prop_assert_eq!(first_id, second_id);
	}

	// A linear chain of single-consumer nodes of uniform size never needs
	// more than two simultaneously-live buffers (the current node plus the
	// one about to be freed): the planner's reuse discipline must keep
	// distinct storage ids bounded regardless of chain length.
	#[test]
	fn chain_reuse_is_bounded_regardless_of_length(len in 2usize..32) {
		let (arena, function) = build_chain(len);
		let result = tensorplan::plan(&arena, &function, &TargetMap::new(), &NullHooks).unwrap();

		let mut ids = std::collections::HashSet::new();

		for &node in &collect_call_nodes(&arena, function.body) {
			ids.insert(result.get(node).unwrap().storage_ids[0]);
		}

		prop_assert!(ids.len() <= 2, "chain of length {} used {} distinct ids", len, ids.len());
	}
}

fn collect_call_nodes(arena: &ExprArena, node: tensorplan::ir::ExprId) -> Vec<tensorplan::ir::ExprId> {

	match arena.get(node) {
		Expr::Call { args, .. } => {
			let mut nodes = Vec::new();

			for &arg in args {
				nodes.extend(collect_call_nodes(arena, arg));
			}

			nodes.push(node);
			nodes
		},
		_ => Vec::new(),
	}
}
