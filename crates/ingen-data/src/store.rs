//! Arena storage for dictionaries, lists and attribute lists.
//!
//! Containers are owned by the store and addressed by typed handles.
//! Parent links between dictionaries are plain handles too, which makes
//! the scope chain a tree of non-owning references: a child scope can
//! never outlive the store, and dropping an item handle never frees a
//! container somebody else still points at.

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::attr::AttrList;
use crate::item::{Item, Origin};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Handle to a dictionary in a [`DataStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DictId(pub u32);

/// Handle to a list in a [`DataStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListId(pub u32);

/// Handle to an attribute list in a [`DataStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttrListId(pub u32);

/// A dictionary: unique string keys mapping to items, with an optional
/// parent forming a lexical scope chain.
///
/// Iteration order is insertion order, so template loops over
/// dictionaries-of-lists are deterministic.
#[derive(Debug, Default)]
pub struct Dict {
    pub parent: Option<DictId>,
    entries: FxIndexMap<String, Item>,
}

impl Dict {
    /// Entry for `key` in this dictionary only (no parent walk).
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.entries.get(key)
    }

    /// Inserts `item` under `key`, replacing any prior entry.
    pub fn insert(&mut self, key: impl Into<String>, item: Item) {
        self.entries.insert(key.into(), item);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Item)> {
        self.entries.iter()
    }
}

/// Owner of every container the generator creates, from the inspect
/// parse through template evaluation.
#[derive(Debug, Default)]
pub struct DataStore {
    dicts: Vec<Dict>,
    lists: Vec<Vec<Item>>,
    attrs: Vec<AttrList>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new, empty dictionary.
    pub fn new_dict(&mut self, parent: Option<DictId>) -> DictId {
        let id = DictId(self.dicts.len() as u32);
        self.dicts.push(Dict {
            parent,
            entries: FxIndexMap::default(),
        });
        id
    }

    /// Allocates a new, empty list.
    pub fn new_list(&mut self) -> ListId {
        let id = ListId(self.lists.len() as u32);
        self.lists.push(Vec::new());
        id
    }

    /// Allocates a new, unresolved attribute list.
    pub fn new_attr_list(&mut self) -> AttrListId {
        let id = AttrListId(self.attrs.len() as u32);
        self.attrs.push(AttrList::default());
        id
    }

    #[inline]
    pub fn dict(&self, id: DictId) -> &Dict {
        &self.dicts[id.0 as usize]
    }

    #[inline]
    pub fn dict_mut(&mut self, id: DictId) -> &mut Dict {
        &mut self.dicts[id.0 as usize]
    }

    #[inline]
    pub fn list(&self, id: ListId) -> &Vec<Item> {
        &self.lists[id.0 as usize]
    }

    #[inline]
    pub fn list_mut(&mut self, id: ListId) -> &mut Vec<Item> {
        &mut self.lists[id.0 as usize]
    }

    #[inline]
    pub fn attr_list(&self, id: AttrListId) -> &AttrList {
        &self.attrs[id.0 as usize]
    }

    #[inline]
    pub fn attr_list_mut(&mut self, id: AttrListId) -> &mut AttrList {
        &mut self.attrs[id.0 as usize]
    }

    /// Inserts `item` into `dict` under `key`, replacing (and thereby
    /// releasing) any prior entry.
    pub fn insert(&mut self, dict: DictId, key: impl Into<String>, item: Item) {
        self.dict_mut(dict).insert(key, item);
    }

    /// Looks `key` up in `dict`, walking the parent chain until found.
    ///
    /// The returned copy carries an [`Origin`] cursor naming the
    /// dictionary it was actually found in, which is what makes it an
    /// L-value for assignment and `++`/`--`.
    pub fn lookup(&self, dict: DictId, key: &str) -> Option<Item> {
        let mut current = dict;
        loop {
            if let Some(found) = self.dict(current).get(key) {
                let mut item = found.clone();
                item.origin = Some(Origin {
                    dict: current,
                    key: key.to_string(),
                });
                return Some(item);
            }
            current = self.dict(current).parent?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Value;

    #[test]
    fn test_insert_then_lookup() {
        let mut store = DataStore::new();
        let dict = store.new_dict(None);
        store.insert(dict, "x", Item::int(42));

        let found = store.lookup(dict, "x").expect("x should be present");
        assert_eq!(found.as_int(), 42);
        assert_eq!(
            found.origin,
            Some(Origin {
                dict,
                key: "x".to_string()
            })
        );
    }

    #[test]
    fn test_lookup_missing() {
        let mut store = DataStore::new();
        let dict = store.new_dict(None);
        assert!(store.lookup(dict, "nope").is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut store = DataStore::new();
        let dict = store.new_dict(None);
        store.insert(dict, "x", Item::int(1));
        store.insert(dict, "x", Item::str("two"));

        let found = store.lookup(dict, "x").unwrap();
        assert_eq!(found.as_str(), "two");
        assert_eq!(store.dict(dict).len(), 1);
    }

    #[test]
    fn test_parent_chain_lookup() {
        let mut store = DataStore::new();
        let global = store.new_dict(None);
        let middle = store.new_dict(Some(global));
        let inner = store.new_dict(Some(middle));

        store.insert(global, "g", Item::int(1));
        store.insert(middle, "m", Item::int(2));

        let g = store.lookup(inner, "g").unwrap();
        assert_eq!(g.as_int(), 1);
        // The origin names the dictionary the entry actually lives in.
        assert_eq!(g.origin.unwrap().dict, global);

        let m = store.lookup(inner, "m").unwrap();
        assert_eq!(m.origin.unwrap().dict, middle);
    }

    #[test]
    fn test_shadowing() {
        let mut store = DataStore::new();
        let outer = store.new_dict(None);
        let inner = store.new_dict(Some(outer));
        store.insert(outer, "x", Item::int(1));
        store.insert(inner, "x", Item::int(2));

        assert_eq!(store.lookup(inner, "x").unwrap().as_int(), 2);
        assert_eq!(store.lookup(outer, "x").unwrap().as_int(), 1);
    }

    #[test]
    fn test_dict_iteration_order() {
        let mut store = DataStore::new();
        let dict = store.new_dict(None);
        store.insert(dict, "b", Item::int(1));
        store.insert(dict, "a", Item::int(2));
        store.insert(dict, "c", Item::int(3));

        let keys: Vec<&str> = store.dict(dict).iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_lists() {
        let mut store = DataStore::new();
        let list = store.new_list();
        store.list_mut(list).push(Item::int(10));
        store.list_mut(list).push(Item::int(20));

        assert_eq!(store.list(list).len(), 2);
        assert_eq!(store.list(list)[1].as_int(), 20);
    }

    #[test]
    fn test_container_items_share_storage() {
        let mut store = DataStore::new();
        let dict = store.new_dict(None);
        let list = store.new_list();
        store.insert(dict, "items", Item::list(list));

        // Looking the list up and pushing through the handle mutates the
        // one shared list.
        let found = store.lookup(dict, "items").unwrap();
        match found.value {
            Value::List(id) => store.list_mut(id).push(Item::int(1)),
            _ => panic!("expected a list"),
        }
        assert_eq!(store.list(list).len(), 1);
    }
}
