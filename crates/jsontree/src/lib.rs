//! # jsontree
//!
//! A mutable JSON value tree with explicit ownership.
//!
//! All nodes live in an [`Arena`] and are addressed by generation-checked [`NodeId`] handles.
//! Trees are built with constructors and mutators or by the parser, and written back out by
//! the printer in pretty, compact, buffered or preallocated form.
//!
//! ```
//! use jsontree::Arena;
//!
//! let mut arena = Arena::new();
//! let root = arena.parse(r#"{"a":[1,2,3],"b":null}"#)?;
//! let a = arena.object_item(root, "a").expect("Member exists");
//! assert_eq!(arena.array_size(a), 3);
//!
//! let copy = arena.create_object()?;
//! let numbers = arena.create_int_array(&[1, 2, 3])?;
//! arena.add_item_to_object(copy, "a", numbers);
//! arena.add_null_to_object(copy, "b");
//! assert!(arena.compare(root, copy, true));
//! assert_eq!(arena.print_compact(copy)?, r#"{"a":[1,2,3],"b":null}"#);
//! # Ok::<(), jsontree::Error>(())
//! ```
mod arena;
mod compare;
mod error;
pub mod hooks;
#[cfg(feature = "serde_json")]
mod impls;
mod mutate;
mod node;
mod number;
mod parser;
mod print;
mod value;

pub use arena::Arena;
pub use error::{Error, ParseError, ParseErrorKind};
pub use hooks::{init_hooks, Hooks};
pub use node::{Kind, NodeId, Text};
pub use number::Number;
pub use parser::{minify, minify_str, minify_vec, ParseOptions};
pub use print::{JsonAdapter, PrintOptions};
pub use value::Items;

/// Default maximum nesting of arrays and objects accepted by the parser and by `serde_json`
/// conversions.
pub const NESTING_LIMIT: usize = 1000;
/// Maximum number of reference edges followed along one path when duplicating, printing or
/// comparing. Circular structures stop here.
pub const CIRCULAR_LIMIT: usize = 10_000;
