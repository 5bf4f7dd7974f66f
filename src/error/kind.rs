use std::fmt;
use super::Error;

/// The kind of error the planner failed with.
///
/// Each variant carries the fields needed to render a message naming the
/// offending node or value, per the error table the planner's contract
/// specifies. All of these are fatal: the planner does not retry or
/// recover once one is raised.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
	/// A conditional (or other unsupported control-flow node) was found in
	/// the function body.
	UnsupportedExpression { node_kind: &'static str },
	/// A tensor dimension is not a concrete, resolved integer.
	SymbolicShape { shape: String },
	/// A tensor dimension resolved to a negative integer.
	NegativeShape { dimension: i64 },
	/// The storage-scope hook returned an array whose length does not
	/// match the node's tuple arity.
	ScopeArityMismatch { expected: usize, found: usize },
	/// Some but not all surviving tokens carry a non-zero `device_type`.
	MixedDeviceAnnotation { annotated: usize, unannotated: usize },
	/// A tuple-indexing node's index is `>=` the tuple's field count.
	TupleIndexOutOfRange { index: usize, len: usize },
	/// A node was visited twice by the Assignment Pass while already
	/// carrying a `storage_id`.
	TokenAlreadyAssigned { node: String },
	/// An error surfaced by an external collaborator (device API, target
	/// registry, ...), identified by its name.
	Framework { name: &'static str },
	/// Any error not part of this list.
	Other,
	/// A marker variant that tells the compiler that users of this enum
	/// cannot match it exhaustively ([related RFC](https://github.com/rust-lang/rust/issues/32770)).
	#[doc(hidden)]
	_NonExhaustive,
}

impl ErrorKind {

	/// A short, static label for this kind, independent of its payload.
	pub fn label(&self) -> &'static str {

		use self::ErrorKind::*;

		match *self {
			UnsupportedExpression { .. } => "unsupported expression",
			SymbolicShape { .. } => "symbolic shape",
			NegativeShape { .. } => "negative shape",
			ScopeArityMismatch { .. } => "storage-scope arity mismatch",
			MixedDeviceAnnotation { .. } => "mixed device annotation",
			TupleIndexOutOfRange { .. } => "tuple index out of range",
			TokenAlreadyAssigned { .. } => "token already assigned",
			Framework { name } => name,
			Other => "other error",
			_NonExhaustive => unreachable!(),
		}
	}
}

impl fmt::Display for ErrorKind {

	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {

		use self::ErrorKind::*;

		match *self {
			UnsupportedExpression { node_kind } => {
				write!(fmt, "unsupported expression: {} nodes are not recognized by the planner", node_kind)
			},
			SymbolicShape { ref shape } => {
				write!(fmt, "symbolic shape: dimension in {} is not a concrete integer", shape)
			},
			NegativeShape { dimension } => {
				write!(fmt, "negative shape: dimension {} is negative", dimension)
			},
			ScopeArityMismatch { expected, found } => {
				write!(fmt, "storage-scope arity mismatch: expected {} scopes, found {}", expected, found)
			},
			MixedDeviceAnnotation { annotated, unannotated } => {
				write!(fmt, "mixed device annotation: {} tokens annotated, {} unannotated", annotated, unannotated)
			},
			TupleIndexOutOfRange { index, len } => {
				write!(fmt, "tuple index out of range: index {} against {} fields", index, len)
			},
			TokenAlreadyAssigned { ref node } => {
				write!(fmt, "token already assigned: node {} appears twice in the prototype map", node)
			},
			Framework { name } => write!(fmt, "{}", name),
			Other => write!(fmt, "other error"),
			_NonExhaustive => unreachable!(),
		}
	}
}

impl From<ErrorKind> for Error {

	/// Creates a new error from a known kind of error.
	fn from(kind: ErrorKind) -> Error {

		Error::_new(kind, None)
	}
}
