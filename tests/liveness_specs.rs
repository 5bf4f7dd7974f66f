extern crate tensorplan;

mod release_ordering_spec {
	use tensorplan::hooks::NullHooks;
	use tensorplan::ir::{DataType, Expr, ExprArena, Function, TensorType, Type};
	use tensorplan::target::TargetMap;

	fn scalar_ty() -> Type {

		Type::Tensor(TensorType::new(vec![64i64], DataType::new(32, 1)))
	}

	#[test]
	fn it_frees_an_orphaned_intermediate_output_before_its_sibling_consumes_its_own_arg() {
		// x -> a -> (consumed only by `joined`)
		//      b -> (consumed only by `joined`)
		// `joined`'s own output is never consumed further: it is an
		// orphaned node with zero outstanding refs the instant it is
		// produced, and must become reusable immediately rather than only
		// after the whole function returns.
		let mut arena = ExprArena::new();

		let x = arena.alloc(Expr::Var { ty: scalar_ty() });
		let a = arena.alloc(Expr::Call { op: "square".into(), args: vec![x], ty: scalar_ty() });
		let b = arena.alloc(Expr::Call { op: "square".into(), args: vec![x], ty: scalar_ty() });
		let joined = arena.alloc(Expr::Call { op: "add".into(), args: vec![a, b], ty: scalar_ty() });
		let wrapper = arena.alloc(Expr::Call { op: "identity".into(), args: vec![joined], ty: scalar_ty() });

		let function = Function::new(vec![x], wrapper);

		let result = tensorplan::plan(&arena, &function, &TargetMap::new(), &NullHooks).unwrap();

		// `joined` must have freed its storage before `wrapper` runs, so
		// `wrapper`'s own buffer is free to reuse one of `a`, `b`, or
		// `joined`'s ids rather than forcing a brand-new one.
		let used_ids: std::collections::HashSet<i64> = [a, b, joined, wrapper].iter()
			.map(|&n| result.get(n).unwrap().storage_ids[0])
			.collect();

		assert!(used_ids.len() < 4, "expected at least one id to be reused, got {:?}", used_ids);
	}
}

mod storage_scope_hook_spec {
	use tensorplan::hooks::{register_storage_scope_hook, DeviceMap, NullHooks, ScopeMap, StorageScopeHook};
	use tensorplan::ir::{DataType, Expr, ExprArena, Function, TensorType, Type};
	use tensorplan::target::{storage_info_hook_key, Target, TargetMap};

	struct AllTexture;

	impl StorageScopeHook for AllTexture {

		fn storage_scope_map(
			&self,
			_arena: &ExprArena,
			function: &Function,
			_device_map: &DeviceMap,
			_target_map: &TargetMap,
		) -> ScopeMap {

			let mut map = ScopeMap::new();
			map.insert(function.body, vec!["texture".to_string()]);
			map
		}
	}

	#[test]
	fn it_resolves_the_registered_hook_for_the_function_s_target_map() {
		let mut targets = TargetMap::new();
		targets.insert(0, Target::new("opencl_image_test"));
		let key = storage_info_hook_key(&targets);
		register_storage_scope_hook(key, AllTexture);

		let mut arena = ExprArena::new();
		let ty = Type::Tensor(TensorType::new(vec![1i64, 32, 32, 4], DataType::new(8, 1)));
		let x = arena.alloc(Expr::Var { ty });
		let function = Function::new(vec![x], x);

		let result = tensorplan::plan(&arena, &function, &targets, &NullHooks).unwrap();
		let scope = &result.get(x).unwrap().storage_scopes[0];
		assert_eq!(scope, "texture");
	}

	#[test]
	fn it_falls_back_to_global_scope_when_no_hook_is_registered_for_the_target_map() {
		let mut targets = TargetMap::new();
		targets.insert(0, Target::new("no_such_backend_registered_anywhere"));

		let mut arena = ExprArena::new();
		let ty = Type::Tensor(TensorType::new(vec![4i64], DataType::new(32, 1)));
		let x = arena.alloc(Expr::Var { ty });
		let function = Function::new(vec![x], x);

		let result = tensorplan::plan(&arena, &function, &targets, &NullHooks).unwrap();
		assert_eq!(result.get(x).unwrap().storage_scopes[0], "global");
	}
}
