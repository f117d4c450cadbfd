//! Ordered, key-deduplicated collection of synthesized objects

use crate::{CoreError, Result};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use topology_api::nbdb::{Acl, LogicalRouter, LogicalSwitch, LogicalSwitchPort, NbObject, ObjectKey};

/// Desired northbound objects, ordered by key
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectSet {
    objects: BTreeMap<ObjectKey, NbObject>,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object. Inserting an identical object again is a no-op;
    /// a different object under the same key is a conflict and leaves the
    /// set untouched.
    pub fn insert(&mut self, object: impl Into<NbObject>) -> Result<()> {
        let object = object.into();
        match self.objects.get(&object.key()) {
            Some(existing) if *existing == object => Ok(()),
            Some(existing) => Err(CoreError::ObjectConflict(format!(
                "{} ({} and {})",
                object.name(),
                existing.table(),
                object.table()
            ))),
            None => {
                self.objects.insert(object.key(), object);
                Ok(())
            }
        }
    }

    pub fn extend(&mut self, other: ObjectSet) -> Result<()> {
        for object in other.objects.into_values() {
            self.insert(object)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&NbObject> {
        self.objects.get(key)
    }

    /// Look an object up by name
    pub fn by_name(&self, name: &str) -> Option<&NbObject> {
        self.get(&ObjectKey::for_name(name))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NbObject> {
        self.objects.values()
    }

    pub fn switch(&self, name: &str) -> Option<&LogicalSwitch> {
        match self.by_name(name)? {
            NbObject::LogicalSwitch(switch) => Some(switch),
            _ => None,
        }
    }

    pub fn switch_port(&self, name: &str) -> Option<&LogicalSwitchPort> {
        match self.by_name(name)? {
            NbObject::LogicalSwitchPort(port) => Some(port),
            _ => None,
        }
    }

    pub fn switches(&self) -> impl Iterator<Item = &LogicalSwitch> {
        self.iter().filter_map(|o| match o {
            NbObject::LogicalSwitch(switch) => Some(switch),
            _ => None,
        })
    }

    pub fn switch_ports(&self) -> impl Iterator<Item = &LogicalSwitchPort> {
        self.iter().filter_map(|o| match o {
            NbObject::LogicalSwitchPort(port) => Some(port),
            _ => None,
        })
    }

    pub fn routers(&self) -> impl Iterator<Item = &LogicalRouter> {
        self.iter().filter_map(|o| match o {
            NbObject::LogicalRouter(router) => Some(router),
            _ => None,
        })
    }

    pub fn acls(&self) -> impl Iterator<Item = &Acl> {
        self.iter().filter_map(|o| match o {
            NbObject::Acl(acl) => Some(acl),
            _ => None,
        })
    }

    /// What it takes to go from `previous` to this set
    pub fn diff(&self, previous: &ObjectSet) -> ObjectDelta {
        let mut delta = ObjectDelta::default();
        for (key, object) in &self.objects {
            match previous.objects.get(key) {
                None => delta.added.push(key.clone()),
                Some(old) if old != object => delta.changed.push(key.clone()),
                Some(_) => {}
            }
        }
        delta.removed = previous
            .objects
            .keys()
            .filter(|key| !self.objects.contains_key(*key))
            .cloned()
            .collect();
        delta
    }
}

impl Serialize for ObjectSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.objects.values())
    }
}

/// Keys to create, update and delete to reach a desired set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ObjectDelta {
    pub added: Vec<ObjectKey>,
    pub changed: Vec<ObjectKey>,
    pub removed: Vec<ObjectKey>,
}

impl ObjectDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(name: &str, address: &str) -> NbObject {
        LogicalSwitchPort {
            name: name.to_string(),
            addresses: vec![address.to_string()],
            ..Default::default()
        }
        .into()
    }

    fn objects_of(objects: Vec<NbObject>) -> ObjectSet {
        let mut set = ObjectSet::new();
        for object in objects {
            set.insert(object).unwrap();
        }
        set
    }

    #[test]
    fn test_identical_insert_is_noop() {
        let mut set = ObjectSet::new();
        set.insert(port("a", "x")).unwrap();
        set.insert(port("a", "x")).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_conflicting_insert_is_rejected() {
        let mut set = ObjectSet::new();
        set.insert(port("a", "x")).unwrap();
        assert!(matches!(
            set.insert(port("a", "y")),
            Err(CoreError::ObjectConflict(_))
        ));
        assert_eq!(set.switch_port("a").unwrap().addresses, vec!["x".to_string()]);

        let switch = LogicalSwitch {
            name: "a".to_string(),
            ..Default::default()
        };
        assert!(matches!(set.insert(switch), Err(CoreError::ObjectConflict(_))));
        assert!(set.switch("a").is_none());
    }

    #[test]
    fn test_extend_rejects_conflicts() {
        let mut set = objects_of(vec![port("a", "x")]);
        set.extend(objects_of(vec![port("b", "x")])).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.extend(objects_of(vec![port("b", "y")])).is_err());
    }

    #[test]
    fn test_iteration_is_ordered_by_key() {
        let set = objects_of(vec![port("b", "x"), port("a", "x"), port("c", "x")]);
        let names: Vec<&str> = set.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_diff() {
        let previous = objects_of(vec![port("a", "x"), port("b", "x")]);
        let current = objects_of(vec![port("b", "y"), port("c", "x")]);
        let delta = current.diff(&previous);
        assert_eq!(delta.added, vec![ObjectKey::for_name("c")]);
        assert_eq!(delta.changed, vec![ObjectKey::for_name("b")]);
        assert_eq!(delta.removed, vec![ObjectKey::for_name("a")]);
        assert!(current.diff(&current).is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let set = objects_of(vec![port("a", "x")]);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json[0]["table"], "Logical_Switch_Port");
        assert_eq!(json[0]["name"], "a");
    }
}
