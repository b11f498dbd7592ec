/*!
Binding stores threaded through matching and replacement.

Matching extends a `Chain`, a persistent singly linked list: extending
returns a new chain that shares its tail with the old one, so a failed
branch simply drops its extension and every earlier chain stays valid.
Replacement reads many keys from one finished match, so the chain is
frozen once into a hash map.
*/
use crate::matcher::Matcher;
use crate::syntax::{Pos, Region, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Captures that are not tied to one pattern token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Capture {
    /// the statement or declaration container around a match
    Container,
    /// elements of a container before the matched window
    Head,
    /// elements of a container after the matched window
    Tail,
    /// loop clauses elided by `for ... {`
    Loop(Pos),
    /// a field list elided by `(...)`
    FieldList(Pos),
    /// source range the replacement takes over
    Site,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    /// metavariable by name
    Meta(String),
    /// run skipped by the `...` at this pattern position
    Dots(Pos),
    /// subject position matched by this pattern position
    Pos(Pos),
    /// doc comment of the pattern node starting at this position
    Attr(Pos),
    Capture(Capture),
    /// resolved name of a matched import, by import path
    Import(String),
}

#[derive(Clone, Debug)]
pub enum Binding {
    Meta {
        value: Value,
        /// replays the captured value against later occurrences
        matcher: Rc<Matcher>,
        region: Region,
    },
    Run {
        items: Vec<Value>,
        region: Region,
    },
    Pos(Pos),
    Captured {
        value: Value,
        region: Region,
    },
    Region(Region),
    Import {
        name: String,
    },
}

/// Read access shared by both stores. A typed lookup that finds a
/// binding of another variant reports nothing.
pub trait Bindings {
    fn get(&self, key: &Key) -> Option<&Binding>;

    fn meta(&self, name: &str) -> Option<(&Value, &Rc<Matcher>, Region)> {
        match self.get(&Key::Meta(name.to_string()))? {
            Binding::Meta {
                value,
                matcher,
                region,
            } => Some((value, matcher, *region)),
            _ => None,
        }
    }
    fn run(&self, key: &Key) -> Option<(&[Value], Region)> {
        match self.get(key)? {
            Binding::Run { items, region } => Some((items, *region)),
            _ => None,
        }
    }
    fn pos(&self, key: &Key) -> Option<Pos> {
        match self.get(key)? {
            Binding::Pos(p) => Some(*p),
            _ => None,
        }
    }
    fn captured(&self, key: &Key) -> Option<(&Value, Region)> {
        match self.get(key)? {
            Binding::Captured { value, region } => Some((value, *region)),
            _ => None,
        }
    }
    fn region(&self, key: &Key) -> Option<Region> {
        match self.get(key)? {
            Binding::Region(r) => Some(*r),
            _ => None,
        }
    }
    fn import(&self, path: &str) -> Option<&str> {
        match self.get(&Key::Import(path.to_string()))? {
            Binding::Import { name } => Some(name),
            _ => None,
        }
    }
}

struct Link {
    key: Key,
    binding: Binding,
    next: Chain,
}

/// Append-only binding chain. Cloning is O(1).
#[derive(Clone, Default)]
pub struct Chain(Option<Rc<Link>>);

impl Chain {
    pub fn new() -> Self {
        Self(None)
    }

    /// A new chain with one more binding. `self` is left as it was.
    #[must_use]
    pub fn extend(&self, key: Key, binding: Binding) -> Chain {
        Chain(Some(Rc::new(Link {
            key,
            binding,
            next: self.clone(),
        })))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// newest binding first
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Binding)> + '_ {
        let mut cur = self.0.as_deref();
        std::iter::from_fn(move || {
            let link = cur?;
            cur = link.next.0.as_deref();
            Some((&link.key, &link.binding))
        })
    }

    pub fn freeze(&self) -> Frozen {
        let mut map = FxHashMap::default();
        for (key, binding) in self.iter() {
            // the newest binding of a key wins
            map.entry(key.clone()).or_insert_with(|| binding.clone());
        }
        Frozen { map }
    }
}

impl Bindings for Chain {
    fn get(&self, key: &Key) -> Option<&Binding> {
        self.iter().find(|(k, _)| *k == key).map(|(_, b)| b)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|(k, _)| k)).finish()
    }
}

/// Indexed bindings of one finished match.
#[derive(Clone, Default, Debug)]
pub struct Frozen {
    map: FxHashMap<Key, Binding>,
}

impl Frozen {
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Bindings for Frozen {
    fn get(&self, key: &Key) -> Option<&Binding> {
        self.map.get(key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extend_is_persistent() {
        let base = Chain::new().extend(Key::Pos(Pos::new(1)), Binding::Pos(Pos::new(10)));
        let left = base.extend(Key::Pos(Pos::new(2)), Binding::Pos(Pos::new(20)));
        let right = base.extend(Key::Pos(Pos::new(2)), Binding::Pos(Pos::new(30)));
        assert_eq!(base.len(), 1);
        assert_eq!(base.pos(&Key::Pos(Pos::new(2))), None);
        assert_eq!(left.pos(&Key::Pos(Pos::new(2))), Some(Pos::new(20)));
        assert_eq!(right.pos(&Key::Pos(Pos::new(2))), Some(Pos::new(30)));
        assert_eq!(right.pos(&Key::Pos(Pos::new(1))), Some(Pos::new(10)));
    }

    #[test]
    fn test_wrong_variant_is_not_found() {
        let key = Key::Dots(Pos::new(4));
        let chain = Chain::new().extend(key.clone(), Binding::Pos(Pos::new(4)));
        assert!(chain.run(&key).is_none());
        assert!(chain.captured(&key).is_none());
        assert!(chain.meta("x").is_none());
        assert_eq!(chain.pos(&key), Some(Pos::new(4)));
    }

    #[test]
    fn test_freeze_prefers_newest() {
        let key = Key::Capture(Capture::Site);
        let r1 = Region::new(Pos::new(0), Pos::new(1));
        let r2 = Region::new(Pos::new(5), Pos::new(9));
        let chain = Chain::new()
            .extend(key.clone(), Binding::Region(r1))
            .extend(key.clone(), Binding::Region(r2))
            .extend(Key::Import("fmt".into()), Binding::Import { name: "fmt".into() });
        let frozen = chain.freeze();
        assert_eq!(frozen.len(), 2);
        assert_eq!(frozen.region(&key), Some(r2));
        assert_eq!(frozen.import("fmt"), Some("fmt"));
        assert_eq!(chain.region(&key), Some(r2));
    }
}
