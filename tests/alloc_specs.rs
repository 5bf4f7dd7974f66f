extern crate tensorplan;

mod dispatch_spec {
	use tensorplan::alloc::TokenAllocator;
	use tensorplan::ir::{DataType, TensorType};
	use tensorplan::token::TokenArena;

	#[test]
	fn it_routes_texture_scoped_tokens_to_the_image_allocator_and_others_to_linear() {
		let mut arena = TokenArena::new();
		let mut allocator = TokenAllocator::new();

		let linear_ty = TensorType::new(vec![256i64], DataType::new(32, 1));
		let image_ty = TensorType::new(vec![1i64, 64, 64, 4], DataType::new(8, 1));

		let linear_tok = arena.alloc(linear_ty, 0, "global".into());
		let image_tok = arena.alloc(image_ty, 0, "texture".into());

		allocator.allocate(&arena, linear_tok).unwrap();
		allocator.allocate(&arena, image_tok).unwrap();

		// One committed block on each side of the dispatch.
		assert_eq!(allocator.total_alloc_blocks(), 2);
		assert!(allocator.total_alloc_bytes() >= 1024);
	}

	#[test]
	fn it_reuses_a_released_global_buffer_for_a_same_sized_request() {
		let mut arena = TokenArena::new();
		let mut allocator = TokenAllocator::new();

		let ty = TensorType::new(vec![512i64], DataType::new(8, 1));
		let first = arena.alloc(ty.clone(), 0, "global".into());
		allocator.allocate(&arena, first).unwrap();
		arena.get_mut(first).ref_counter = 0;
		allocator.release(&arena, first);

		let second = arena.alloc(ty, 0, "global".into());
		let reused_id = allocator.request(&arena, second).unwrap();

		assert_eq!(reused_id, arena.get(first).storage_id);
		assert_eq!(allocator.total_alloc_blocks(), 1);
	}

	#[test]
	fn it_never_reuses_across_an_unrecognized_non_global_scope() {
		let mut arena = TokenArena::new();
		let mut allocator = TokenAllocator::new();

		let ty = TensorType::new(vec![512i64], DataType::new(8, 1));
		let first = arena.alloc(ty.clone(), 0, "staging".into());
		allocator.allocate(&arena, first).unwrap();
		arena.get_mut(first).ref_counter = 0;
		allocator.release(&arena, first);

		let second = arena.alloc(ty, 0, "staging".into());
		let id = allocator.request(&arena, second).unwrap();

		assert_ne!(id, arena.get(first).storage_id);
		assert_eq!(allocator.total_alloc_blocks(), 2);
	}

	#[test]
	fn it_interleaves_global_and_texture_allocations_without_panicking() {
		// Both sub-allocators share one `StorageIdCounter`: a texture
		// allocation takes id 0, so the first global allocation gets id 1,
		// not 0. A 1D pool that assumed `storage_id == data.len()` at push
		// time would write this global token's bookkeeping at the wrong
		// position and panic out of bounds the moment it was released or
		// reused (see DESIGN.md, "Maintainer review round").
		let mut arena = TokenArena::new();
		let mut allocator = TokenAllocator::new();

		let image_ty = TensorType::new(vec![1i64, 32, 32, 4], DataType::new(8, 1));
		let image_tok = arena.alloc(image_ty, 0, "texture".into());
		allocator.allocate(&arena, image_tok).unwrap();

		let global_ty = TensorType::new(vec![256i64], DataType::new(8, 1));
		let first_global = arena.alloc(global_ty.clone(), 0, "global".into());
		allocator.allocate(&arena, first_global).unwrap();

		arena.get_mut(first_global).ref_counter = 0;
		allocator.release(&arena, first_global);

		let second_global = arena.alloc(global_ty, 0, "global".into());
		let reused = allocator.request(&arena, second_global).unwrap();

		assert_eq!(reused, arena.get(first_global).storage_id);
		assert_eq!(allocator.total_alloc_blocks(), 2);
	}
}
