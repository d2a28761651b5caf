//! ingen-data - The dynamic data model evaluated by templates.
//!
//! Everything a template can touch is an [`Item`]: a tagged value over
//! `{String, Int, Bool, Void, Dict, List, Procedure}`. Containers live in
//! a [`DataStore`] and are referred to by index handles, so copying an
//! item is always cheap and never duplicates a dictionary or list.
//! Dictionaries chain to an optional parent, forming the lexical scopes
//! the evaluator looks identifiers up in.
//!
//! Binary and unary operators dispatch through a per-tag
//! [`OpInterface`](ops::OpInterface) table; the dot operator, indexing
//! and assignment are handled structurally by the evaluator.

pub mod attr;
pub mod item;
pub mod ops;
pub mod store;

pub use attr::AttrList;
pub use item::{Item, Origin, Procedure, SourceRef, TabState, Tag, Value};
pub use ops::{interface, BinaryFn, CastFn, Op, OpInterface, UnaryFn};
pub use store::{AttrListId, DataStore, Dict, DictId, ListId};
