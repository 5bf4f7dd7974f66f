use crate::error::{ErrorKind, Result};

/// One dimension of a tensor shape.
///
/// A dimension is `Concrete` once shape inference has resolved it to an
/// actual extent. `Symbolic` stands in for anything the planner refuses to
/// reason about — an unresolved type variable, a named axis, and so on —
/// and always fails planning with [`ErrorKind::SymbolicShape`].
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Dim {
	Concrete(i64),
	Symbolic(String),
}

impl From<i64> for Dim {

	fn from(value: i64) -> Dim {

		Dim::Concrete(value)
	}
}

/// A tensor's static shape: an ordered list of dimensions.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shape(pub Vec<Dim>);

impl Shape {

	pub fn rank(&self) -> usize {

		self.0.len()
	}

	fn display(&self) -> String {

		let parts: Vec<String> = self.0.iter().map(|d| match d {
			Dim::Concrete(n) => n.to_string(),
			Dim::Symbolic(name) => name.clone(),
		}).collect();

		format!("[{}]", parts.join(", "))
	}

	/// Resolves every dimension to a concrete, non-negative `i64`, or fails
	/// with [`ErrorKind::SymbolicShape`] / [`ErrorKind::NegativeShape`].
	pub fn concrete_dims(&self) -> Result<Vec<i64>> {

		let mut dims = Vec::with_capacity(self.0.len());

		for dim in &self.0 {

			match dim {
				Dim::Concrete(n) if *n < 0 => {
					return Err(ErrorKind::NegativeShape { dimension: *n }.into());
				},
				Dim::Concrete(n) => dims.push(*n),
				Dim::Symbolic(_) => {
					return Err(ErrorKind::SymbolicShape { shape: self.display() }.into());
				},
			}
		}

		Ok(dims)
	}

	/// The total element count (product of dimensions; rank 0 is 1 element).
	pub fn num_elements(&self) -> Result<i64> {

		let dims = self.concrete_dims()?;

		let mut total: i64 = 1;

		for d in dims {
			total = total.checked_mul(d).ok_or(ErrorKind::Other)?;
		}

		Ok(total)
	}
}

impl From<Vec<i64>> for Shape {

	fn from(dims: Vec<i64>) -> Shape {

		Shape(dims.into_iter().map(Dim::Concrete).collect())
	}
}

/// `{bits, lanes}` — the planner's view of a dtype. `bits` is the scalar
/// element's bit width (e.g. 32 for `float32`); `lanes` is the vector
/// width (1 for scalar dtypes).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataType {
	pub bits: u32,
	pub lanes: u32,
}

impl DataType {

	pub fn new(bits: u32, lanes: u32) -> DataType {

		DataType { bits: bits, lanes: lanes }
	}

	/// `ceil((bits * lanes) / 8)` — the byte width of one element.
	pub fn bytes(&self) -> u64 {

		let total_bits = self.bits as u64 * self.lanes as u64;

		(total_bits + 7) / 8
	}
}

/// A tensor's resolved type: shape plus dtype.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TensorType {
	pub shape: Shape,
	pub dtype: DataType,
}

impl TensorType {

	pub fn new<S: Into<Shape>>(shape: S, dtype: DataType) -> TensorType {

		TensorType { shape: shape.into(), dtype: dtype }
	}

	/// The byte size of this tensor, per spec.md §6 ("bytes = ceil((bits *
	/// lanes) / 8), multiplied by the product of shape dimensions").
	pub fn size_bytes(&self) -> Result<u64> {

		let elements = self.shape.num_elements()? as u64;

		Ok(elements * self.dtype.bytes())
	}
}

/// A node's resolved type: either a single tensor or a tuple of tensors.
///
/// The core recognizes only these two shapes of type; nested tuples are
/// not part of this data model (the expression IR flattens them via
/// `Tuple`/`TupleGetItem`, see [`super::expr::Expr`]).
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Type {
	Tensor(TensorType),
	Tuple(Vec<TensorType>),
}

impl Type {

	/// The number of tensors this type produces (1 for `Tensor`, *k* for a
	/// tuple of *k* tensors).
	pub fn tensor_count(&self) -> usize {

		match self {
			Type::Tensor(_) => 1,
			Type::Tuple(fields) => fields.len(),
		}
	}

	/// The tensor type of the `index`-th produced tensor.
	pub fn tensor_at(&self, index: usize) -> Option<&TensorType> {

		match self {
			Type::Tensor(t) if index == 0 => Some(t),
			Type::Tensor(_) => None,
			Type::Tuple(fields) => fields.get(index),
		}
	}
}

impl From<TensorType> for Type {

	fn from(t: TensorType) -> Type {

		Type::Tensor(t)
	}
}
