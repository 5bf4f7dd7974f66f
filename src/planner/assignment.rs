//! The Assignment Pass (spec.md §4.2): walks the tree a second time in
//! the same order as the Liveness Pass, consulting prototypes; for each
//! producer requests a buffer from the allocator, then releases argument
//! buffers whose reference count has reached zero.

use std::collections::HashSet;

use crate::alloc::TokenAllocator;
use crate::error::{ErrorKind, Result};
use crate::ir::{Expr, ExprArena, ExprId, Function};
use crate::token::{TokenArena, TokenId};

use super::ProtoMap;

/// Runs the Assignment Pass. Mutates `proto`'s tokens in place (through
/// `tokens`, the same arena the Liveness Pass allocated into) and
/// `allocator`'s free lists and storage-id counter.
pub fn run(
	arena: &ExprArena,
	function: &Function,
	tokens: &TokenArena,
	proto: &ProtoMap,
	allocator: &mut TokenAllocator,
) -> Result<()> {

	let mut visited: HashSet<ExprId> = HashSet::new();

	for &param in &function.params {
		allocate_fresh(tokens, allocator, proto, param)?;
		visited.insert(param);
	}

	visit(arena, function.body, tokens, proto, allocator, &mut visited)?;

	Ok(())
}

/// `Function parameter, constant`: allocate a fresh buffer for each
/// token (no reuse), and pin it with an extra `ref_counter` increment so
/// it is never released.
fn allocate_fresh(tokens: &TokenArena, allocator: &mut TokenAllocator, proto: &ProtoMap, node: ExprId) -> Result<()> {

	let token_ids = proto.get(&node).cloned().unwrap_or_default();

	for token in token_ids {
		if tokens.get(token).is_assigned() {
			return Err(ErrorKind::TokenAlreadyAssigned { node: node.describe() }.into());
		}

		allocator.allocate(tokens, token)?;
		tokens.adjust_ref(token, 1);
	}

	Ok(())
}

fn visit(
	arena: &ExprArena,
	node: ExprId,
	tokens: &TokenArena,
	proto: &ProtoMap,
	allocator: &mut TokenAllocator,
	visited: &mut HashSet<ExprId>,
) -> Result<Vec<TokenId>> {

	if visited.contains(&node) {
		return Ok(proto.get(&node).cloned().unwrap_or_default());
	}

	let result = match arena.get(node) {
		Expr::Constant { .. } => {
			allocate_fresh(tokens, allocator, proto, node)?;
			proto.get(&node).cloned().unwrap_or_default()
		},

		Expr::Var { .. } => proto.get(&node).cloned().unwrap_or_default(),

		Expr::Call { args, .. } => {
			for &arg in args {
				visit(arena, arg, tokens, proto, allocator, visited)?;
			}

			let call_tokens = proto.get(&node).cloned().unwrap_or_default();

			for &token in &call_tokens {
				if tokens.get(token).is_assigned() {
					return Err(ErrorKind::TokenAlreadyAssigned { node: node.describe() }.into());
				}

				allocator.request(tokens, token)?;
			}

			// Orphaned outputs (zero consumers, not a function output)
			// may be freed the instant they're produced.
			for &token in &call_tokens {
				allocator.release(tokens, token);
			}

			for &arg in args {
				for token in proto.get(&arg).cloned().unwrap_or_default() {
					let remaining = tokens.adjust_ref(token, -1);

					if remaining == 0 {
						allocator.release(tokens, token);
					}
				}
			}

			call_tokens
		},

		Expr::Tuple { fields } => {
			for &field in fields {
				visit(arena, field, tokens, proto, allocator, visited)?;
			}

			proto.get(&node).cloned().unwrap_or_default()
		},

		Expr::TupleGetItem { tuple, .. } => {
			visit(arena, *tuple, tokens, proto, allocator, visited)?;
			proto.get(&node).cloned().unwrap_or_default()
		},

		Expr::Let { value, body, .. } => {
			visit(arena, *value, tokens, proto, allocator, visited)?;
			visit(arena, *body, tokens, proto, allocator, visited)?
		},

		Expr::If { .. } => unreachable!("the Liveness Pass already rejects conditionals"),

		Expr::GlobalVar { .. } | Expr::OpRef { .. } | Expr::FunctionRef { .. } => Vec::new(),
	};

	visited.insert(node);
	Ok(result)
}
