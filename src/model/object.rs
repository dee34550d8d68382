//! Handles to host objects
//!
//! A host value is placed behind an `Arc` once, when it becomes an
//! evaluation root. Objects reached from it by member or index steps are
//! addressed by their path from that root and borrowed again on each use, so
//! navigation never copies host data.

use super::reflect::{Member, Reflect};
use super::value::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Member(Box<str>),
    Index(Value),
}

/// Reference to a host object inside a shared root
#[derive(Clone)]
pub struct ObjectRef {
    root: Arc<dyn Reflect>,
    path: Arc<[Step]>,
}

impl ObjectRef {
    /// Handle to a whole root object
    pub fn new(root: Arc<dyn Reflect>) -> Self {
        Self {
            root,
            path: Arc::from(Vec::new()),
        }
    }

    /// Borrow the addressed object
    ///
    /// Host data is immutable while shared, so a path that resolved once
    /// keeps resolving; `None` is only reachable through a host type whose
    /// lookups are not deterministic.
    pub fn get(&self) -> Option<&dyn Reflect> {
        let mut current: &dyn Reflect = self.root.as_ref();
        for step in self.path.iter() {
            let next = match step {
                Step::Member(name) => current.member(name),
                Step::Index(key) => current.index(key),
            };
            match next? {
                Member::Object(object) => current = object,
                Member::Value(_) => return None,
            }
        }
        Some(current)
    }

    /// Number of steps between the root and this object
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Resolve `self.name`
    pub fn member(&self, name: &str) -> Option<Value> {
        match self.get()?.member(name)? {
            Member::Value(value) => Some(value),
            Member::Object(_) => Some(Value::Object(self.child(Step::Member(name.into())))),
        }
    }

    /// Resolve `self[key]`
    pub fn index(&self, key: &Value) -> Option<Value> {
        match self.get()?.index(key)? {
            Member::Value(value) => Some(value),
            Member::Object(_) => Some(Value::Object(self.child(Step::Index(key.clone())))),
        }
    }

    /// Name of the addressed object's type
    pub fn type_name(&self) -> &str {
        self.get().map_or("nil", |object| object.type_name())
    }

    fn child(&self, step: Step) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend(self.path.iter().cloned());
        path.push(step);
        Self {
            root: Arc::clone(&self.root),
            path: path.into(),
        }
    }
}

impl From<Arc<dyn Reflect>> for ObjectRef {
    fn from(root: Arc<dyn Reflect>) -> Self {
        Self::new(root)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.root, &other.root) && self.path == other.path {
            return true;
        }
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => a.deep_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(object) => object.fmt_value(f),
            None => f.write_str("<nil>"),
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}: {self})", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToValue;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_children_share_the_root() {
        let data: HashMap<String, Vec<Vec<i64>>> =
            HashMap::from([("grid".to_string(), vec![vec![1, 2], vec![3, 4]])]);
        let root = ObjectRef::new(Arc::new(data));

        let Some(Value::Object(grid)) = root.member("grid") else {
            panic!("grid should be an object");
        };
        let Some(Value::Object(row)) = grid.index(&Value::Integer(1)) else {
            panic!("row should be an object");
        };
        assert!(Arc::ptr_eq(&row.root, &root.root));
        assert_eq!(row.depth(), 2);
        assert_eq!(row.index(&Value::Integer(0)), Some(Value::Integer(3)));
        assert_eq!(row.to_string(), "[3 4]");
        assert_eq!(row.type_name(), "sequence");
    }

    #[test]
    fn test_equality_follows_structure() {
        let shared = Arc::new(vec![vec![1], vec![1]]);
        let root = ObjectRef::new(shared.clone());
        let first = root.index(&Value::Integer(0));
        let second = root.index(&Value::Integer(1));
        assert_eq!(first, second);
        assert_eq!(first, Some(vec![1].to_value()));
        assert_ne!(root.index(&Value::Integer(0)), Some(vec![2].to_value()));
        assert_eq!(root.index(&Value::Integer(5)), None);
    }
}
