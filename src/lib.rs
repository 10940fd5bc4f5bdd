//! Validated change records for typed, JSON-like values.
//!
//! A [`Change`] describes one create, read, update, replace or delete of a value
//! with a declared [`Ty`]. Constructors check both sides against the type and
//! never hand out a change that breaks it.
//!
//! ```
//! use json_change::{Action, Change, Path, PathSet, Ty, Value};
//! use serde_json::json;
//!
//! let ty = Ty::object([("name", Ty::String)]);
//! let forced = PathSet::from_paths([Path::root().attr("name")]);
//! let change = Change::replace(
//!     ty,
//!     Value::from(json!({"name": "a"})),
//!     Value::from(json!({"name": "b"})),
//!     forced,
//! ).unwrap();
//! assert_eq!(change.action(), Action::Replace);
//! assert!(change.forced_replace().unwrap().contains(&Path::root().attr("name")));
//! ```
pub mod change;
pub mod cli;
pub mod conformance;
pub mod error;
pub mod path;
pub mod path_de;
pub mod ty;
pub mod value;

pub use change::{Action, Change, ChangeKind};
pub use conformance::{test_conformance, ConformanceError};
pub use error::{ChangeError, Side};
pub use path::{Path, PathError, PathSet, PathStep};
pub use ty::{Field, Ty, TypeParseError};
pub use value::Value;
