//! The Liveness Pass (spec.md §4.1): walks the expression tree once,
//! creates prototype storage tokens for every producer, and counts
//! references (consumer count, plus one for each function output).

use crate::ir::{Expr, ExprArena, ExprId, Function, Type};
use crate::error::{ErrorKind, Result};
use crate::hooks::{DeviceMap, ScopeMap};
use crate::token::{TokenArena, TokenId};

use super::ProtoMap;

/// Runs the Liveness Pass over `function`'s body, returning the prototype
/// map every token it created. `tokens` is the arena tokens are allocated
/// into — it keeps growing across both passes and is handed, unchanged
/// in identity, to the Assignment Pass.
pub fn run(
	arena: &ExprArena,
	function: &Function,
	tokens: &mut TokenArena,
	device_map: &DeviceMap,
	scope_map: &ScopeMap,
) -> Result<ProtoMap> {

	let mut proto = ProtoMap::new();

	for &param in &function.params {
		let ty = arena.get(param).ty().expect("function parameter must carry a resolved type");
		let created = create_tokens(tokens, param, ty, device_map, scope_map)?;
		proto.insert(param, created);
	}

	let body_tokens = visit(arena, function.body, tokens, device_map, scope_map, &mut proto)?;

	for &token in &body_tokens {
		// Outputs-are-kept rule: pin every surviving output so it is
		// never considered for reuse and survives to serialization.
		tokens.adjust_ref(token, 1);
	}

	Ok(proto)
}

fn visit(
	arena: &ExprArena,
	node: ExprId,
	tokens: &mut TokenArena,
	device_map: &DeviceMap,
	scope_map: &ScopeMap,
	proto: &mut ProtoMap,
) -> Result<Vec<TokenId>> {

	if let Some(existing) = proto.get(&node) {
		return Ok(existing.clone());
	}

	let result = match arena.get(node) {
		Expr::Constant { ty } => create_tokens(tokens, node, ty, device_map, scope_map)?,

		Expr::Var { .. } => {
			// A generic visit only ever reaches a `Var` through a
			// reference — the binding occurrence (function parameter or
			// `Let`) always seeds the prototype map directly, below.
			return Err(ErrorKind::Other.into());
		},

		Expr::Call { args, ty, .. } => {
			let result_tokens = create_tokens(tokens, node, ty, device_map, scope_map)?;

			for &arg in args {
				let arg_tokens = visit(arena, arg, tokens, device_map, scope_map, proto)?;

				for token in arg_tokens {
					tokens.adjust_ref(token, 1);
				}
			}

			result_tokens
		},

		Expr::Tuple { fields } => {
			let mut concatenated = Vec::new();

			for &field in fields {
				concatenated.extend(visit(arena, field, tokens, device_map, scope_map, proto)?);
			}

			concatenated
		},

		Expr::TupleGetItem { tuple, index } => {
			let tuple_tokens = visit(arena, *tuple, tokens, device_map, scope_map, proto)?;

			let index = *index;

			match tuple_tokens.get(index) {
				Some(&token) => vec![token],
				None => {
					return Err(ErrorKind::TupleIndexOutOfRange { index: index, len: tuple_tokens.len() }.into());
				},
			}
		},

		Expr::Let { var, value, body } => {
			let value_tokens = visit(arena, *value, tokens, device_map, scope_map, proto)?;
			proto.insert(*var, value_tokens);

			visit(arena, *body, tokens, device_map, scope_map, proto)?
		},

		Expr::If { .. } => {
			return Err(ErrorKind::UnsupportedExpression { node_kind: "conditional" }.into());
		},

		Expr::GlobalVar { .. } | Expr::OpRef { .. } | Expr::FunctionRef { .. } => Vec::new(),
	};

	proto.insert(node, result.clone());
	Ok(result)
}

/// Creates a fresh token per tensor in `ty`, consulting the device-map
/// and storage-scope hooks for `node`. Guards against re-creating tokens
/// for a node the prototype map already has an entry for — a node's
/// producer tokens must be created exactly once.
fn create_tokens(
	tokens: &mut TokenArena,
	node: ExprId,
	ty: &Type,
	device_map: &DeviceMap,
	scope_map: &ScopeMap,
) -> Result<Vec<TokenId>> {

	let device_type = device_map.get(&node).copied().unwrap_or(0);
	let count = ty.tensor_count();

	let scopes: Vec<String> = match scope_map.get(&node) {
		Some(scopes) if scopes.len() == count => scopes.clone(),
		Some(scopes) => {
			return Err(ErrorKind::ScopeArityMismatch { expected: count, found: scopes.len() }.into());
		},
		None => vec!["global".to_string(); count],
	};

	let mut created = Vec::with_capacity(count);

	for i in 0..count {
		let tensor_type = ty.tensor_at(i).expect("tensor_at within tensor_count bounds").clone();
		created.push(tokens.alloc(tensor_type, device_type, scopes[i].clone()));
	}

	Ok(created)
}
