use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

/// Frames are shared: closures keep their defining chain alive and see
/// later mutations to it. The chain is acyclic, so reference counting is
/// enough.
pub type ScopeRef = Rc<RefCell<Scope>>;

pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<ScopeRef>,
}

impl Scope {
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: None,
        }))
    }

    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// A name may be defined at most once per frame.
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), String> {
        if self.vars.contains_key(name) {
            return Err(format!(
                "trying to initialize \"{name}\" for the second time"
            ));
        }
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    /// Writes the nearest enclosing definition, walking outward.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), String> {
        if let Some(slot) = self.vars.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(format!("trying to set uninitialized variable \"{name}\"")),
        }
    }

    pub fn get(&self, name: &str) -> Result<Value, String> {
        if let Some(value) = self.vars.get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => Err(format!("trying to get uninitialized variable \"{name}\"")),
        }
    }

    pub fn parent(&self) -> Option<ScopeRef> {
        self.parent.clone()
    }

    /// This frame's bindings, name-sorted.
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .vars
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
