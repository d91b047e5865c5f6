use std::rc::{Rc, Weak};

use ahash::{AHashMap, AHashSet};
use thiserror::Error;

use crate::callable::Callable;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

// Frame count that triggers the first sweep, afterwards the threshold follows what survived
const SWEEP_THRESHOLD: usize = 1024;
const SWEEP_GROW_FACTOR: usize = 2;

/// Handle of a frame inside [`Scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EnvError {
    #[error("Variable '{0}' already declared")]
    AlreadyDeclared(String),

    #[error("Undefined variable: '{0}'")]
    Undefined(String),

    #[error("Cannot reassign constant: '{0}'")]
    ReassignConstant(String),

    #[error("Cannot delete constant: '{0}'")]
    DeleteConstant(String),
}

#[derive(Debug, Default)]
pub(crate) struct Environment {
    enclosing: Option<ScopeId>,
    values: AHashMap<String, Value>,
    constants: AHashSet<String>,

    // Set once a function value closes over this frame or one of its descendants
    captured: bool,

    // Cleared when the block that pushed the frame is done with it
    active: bool,
}

impl Environment {
    fn with(enclosing: Option<ScopeId>) -> Self {
        Environment {
            enclosing,
            active: true,
            ..Default::default()
        }
    }
}

// Frames live in an arena and point at their parent by index, closures hold a `ScopeId`
// instead of a reference counted frame. Frames that were never captured go back to the free
// list as soon as their block is done, captured ones wait for `sweep`.
#[derive(Debug)]
pub(crate) struct Scopes {
    frames: Vec<Option<Environment>>,
    free: Vec<usize>,
    live: usize,
    next_sweep: usize,

    // Every function value created so far, a closure only held by the running evaluation
    // still keeps its frames
    functions: Vec<Weak<dyn Callable>>,
    next_prune: usize,
}

impl Scopes {
    pub(crate) fn new() -> Self {
        Scopes {
            frames: vec![Some(Environment::with(None))],
            free: Vec::new(),
            live: 1,
            next_sweep: SWEEP_THRESHOLD,
            functions: Vec::new(),
            next_prune: SWEEP_THRESHOLD,
        }
    }

    pub(crate) fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub(crate) fn push(&mut self, enclosing: ScopeId) -> ScopeId {
        if self.live >= self.next_sweep {
            self.sweep();
        }

        let env = Environment::with(Some(enclosing));
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.frames[slot] = Some(env);
                ScopeId(slot)
            }
            None => {
                self.frames.push(Some(env));
                ScopeId(self.frames.len() - 1)
            }
        }
    }

    /// Ends the block that pushed the frame. The frame is dropped right away unless a
    /// closure may still refer to it.
    pub(crate) fn release(&mut self, id: ScopeId) {
        if id == self.global() {
            return;
        }

        let captured = match self.frame_mut(id) {
            Some(env) => {
                env.active = false;
                env.captured
            }
            None => return,
        };

        if !captured {
            self.free_frame(id.0);
        }
    }

    /// Marks the frame and every ancestor of it as possibly referenced by a closure.
    pub(crate) fn capture(&mut self, id: ScopeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.frame_mut(id) {
                Some(env) if !env.captured => {
                    env.captured = true;
                    current = env.enclosing;
                }
                _ => break,
            }
        }
    }

    pub(crate) fn track(&mut self, function: &Rc<dyn Callable>) {
        if self.functions.len() >= self.next_prune {
            self.functions.retain(|function| function.strong_count() > 0);
            self.next_prune = (self.functions.len() * SWEEP_GROW_FACTOR).max(SWEEP_THRESHOLD);
        }
        self.functions.push(Rc::downgrade(function));
    }

    /// Drops the released frames that no live function value can reach anymore.
    ///
    /// Closures are stored in the very frames they close over, so reference counts alone
    /// never reach zero. Shared values are counted the way trial deletion does it: a value
    /// with more strong references than the frames and containers hold is referenced from
    /// the running evaluation and counts as a root, next to the active frames. Function
    /// values found nowhere in the frames are roots as well.
    pub(crate) fn sweep(&mut self) {
        self.functions.retain(|function| function.strong_count() > 0);

        let mut census = Census::default();
        for env in self.frames.iter().flatten() {
            for value in env.values.values() {
                census.count(value);
            }
        }
        if census.blocked {
            return;
        }

        let mut marker = Marker::new(self);
        for (slot, env) in self.frames.iter().enumerate() {
            if matches!(env, Some(env) if env.active) {
                marker.frame(ScopeId(slot));
            }
        }
        for node in census.nodes.values() {
            // the census holds one reference of its own
            if strong_count(&node.value) > node.internal + 1 {
                marker.value(&node.value);
            }
        }
        for function in &self.functions {
            if let Some(function) = function.upgrade() {
                let ptr = Rc::as_ptr(&function) as *const ();
                if !census.nodes.contains_key(&ptr) {
                    marker.value(&Value::Callable(function));
                }
            }
        }
        if marker.blocked {
            return;
        }

        let unreachable: Vec<usize> = marker
            .marked
            .iter()
            .enumerate()
            .filter(|(slot, marked)| !**marked && self.frames[*slot].is_some())
            .map(|(slot, _)| slot)
            .collect();
        drop(census);

        for slot in &unreachable {
            self.free_frame(*slot);
        }
        self.next_sweep = (self.live * SWEEP_GROW_FACTOR).max(SWEEP_THRESHOLD);
        tracing::debug!(freed = unreachable.len(), live = self.live, "swept frames");
    }

    pub(crate) fn define(
        &mut self,
        id: ScopeId,
        key: &str,
        value: Value,
        constant: bool,
    ) -> Result<(), EnvError> {
        let env = self
            .frame_mut(id)
            .ok_or_else(|| EnvError::Undefined(String::from(key)))?;

        if env.values.contains_key(key) {
            return Err(EnvError::AlreadyDeclared(String::from(key)));
        }

        env.values.insert(String::from(key), value);
        if constant {
            env.constants.insert(String::from(key));
        }
        Ok(())
    }

    pub(crate) fn get(&self, id: ScopeId, key: &str) -> Result<Value, EnvError> {
        let (_, env) = self.resolve(id, key)?;
        env.values
            .get(key)
            .cloned()
            .ok_or_else(|| EnvError::Undefined(String::from(key)))
    }

    pub(crate) fn assign(&mut self, id: ScopeId, key: &str, value: Value) -> Result<(), EnvError> {
        let (owner, env) = self.resolve(id, key)?;
        if env.constants.contains(key) {
            return Err(EnvError::ReassignConstant(String::from(key)));
        }

        if let Some(slot) = self
            .frame_mut(owner)
            .and_then(|env| env.values.get_mut(key))
        {
            *slot = value;
        }
        Ok(())
    }

    /// Removes the nearest binding of `key`, constants can't be removed.
    pub(crate) fn delete(&mut self, id: ScopeId, key: &str) -> Result<(), EnvError> {
        let (owner, env) = self.resolve(id, key)?;
        if env.constants.contains(key) {
            return Err(EnvError::DeleteConstant(String::from(key)));
        }

        if let Some(env) = self.frame_mut(owner) {
            env.values.remove(key);
        }
        Ok(())
    }

    // Walks the chain from `id` outwards and returns the frame holding `key`
    fn resolve(&self, id: ScopeId, key: &str) -> Result<(ScopeId, &Environment), EnvError> {
        let mut current = Some(id);
        while let Some(id) = current {
            let env = match self.frame(id) {
                Some(env) => env,
                None => break,
            };

            if env.values.contains_key(key) {
                return Ok((id, env));
            }
            current = env.enclosing;
        }

        Err(EnvError::Undefined(String::from(key)))
    }

    fn free_frame(&mut self, slot: usize) {
        if let Some(env) = self.frames.get_mut(slot).and_then(Option::take) {
            self.free.push(slot);
            self.live -= 1;
            // bindings may hold the last reference to other closures, drop them after the
            // arena is consistent again
            drop(env);
        }
    }

    fn frame(&self, id: ScopeId) -> Option<&Environment> {
        self.frames.get(id.0).and_then(Option::as_ref)
    }

    fn frame_mut(&mut self, id: ScopeId) -> Option<&mut Environment> {
        self.frames.get_mut(id.0).and_then(Option::as_mut)
    }

    #[cfg(test)]
    pub(crate) fn live_frames(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_some()).count()
    }
}

// Address and strong count of the allocation behind a shared value
fn shared(value: &Value) -> Option<(*const (), usize)> {
    match value {
        Value::Array(items) => Some((Rc::as_ptr(items) as *const (), Rc::strong_count(items))),
        Value::Object(record) => Some((Rc::as_ptr(record) as *const (), Rc::strong_count(record))),
        Value::Callable(callable) => Some((
            Rc::as_ptr(callable) as *const (),
            Rc::strong_count(callable),
        )),
        _ => None,
    }
}

fn strong_count(value: &Value) -> usize {
    shared(value).map_or(0, |(_, count)| count)
}

struct Node {
    // keeps the allocation alive and addressable for the marking phase
    value: Value,
    // references held by frames and by other counted containers
    internal: usize,
}

// Every shared value reachable from any frame, with the references found to it
#[derive(Default)]
struct Census {
    nodes: AHashMap<*const (), Node>,

    // A container was mutably borrowed, its contents can't be inspected
    blocked: bool,
}

impl Census {
    fn count(&mut self, value: &Value) {
        let ptr = match shared(value) {
            Some((ptr, _)) => ptr,
            None => return,
        };

        if let Some(node) = self.nodes.get_mut(&ptr) {
            node.internal += 1;
            return;
        }
        self.nodes.insert(
            ptr,
            Node {
                value: value.clone(),
                internal: 1,
            },
        );

        ensure_sufficient_stack(|| match value {
            Value::Array(items) => match items.try_borrow() {
                Ok(items) => items.iter().for_each(|item| self.count(item)),
                Err(_) => self.blocked = true,
            },
            Value::Object(record) => match record.try_borrow() {
                Ok(record) => record.iter().for_each(|(_, item)| self.count(item)),
                Err(_) => self.blocked = true,
            },
            _ => {}
        });
    }
}

// Reachability from the roots, following closures to their frames and frames outwards
struct Marker<'a> {
    scopes: &'a Scopes,
    marked: Vec<bool>,
    seen: AHashSet<*const ()>,
    blocked: bool,
}

impl<'a> Marker<'a> {
    fn new(scopes: &'a Scopes) -> Self {
        Marker {
            scopes,
            marked: vec![false; scopes.frames.len()],
            seen: AHashSet::new(),
            blocked: false,
        }
    }

    fn frame(&mut self, id: ScopeId) {
        let scopes = self.scopes;
        let mut current = Some(id);
        while let Some(id) = current {
            match self.marked.get_mut(id.0) {
                Some(marked) if !*marked => *marked = true,
                _ => break,
            }

            let env = match scopes.frame(id) {
                Some(env) => env,
                None => break,
            };
            for value in env.values.values() {
                self.value(value);
            }
            current = env.enclosing;
        }
    }

    fn value(&mut self, value: &Value) {
        match shared(value) {
            Some((ptr, _)) if self.seen.insert(ptr) => {}
            _ => return,
        }

        ensure_sufficient_stack(|| match value {
            Value::Array(items) => match items.try_borrow() {
                Ok(items) => items.iter().for_each(|item| self.value(item)),
                Err(_) => self.blocked = true,
            },
            Value::Object(record) => match record.try_borrow() {
                Ok(record) => record.iter().for_each(|(_, item)| self.value(item)),
                Err(_) => self.blocked = true,
            },
            Value::Callable(callable) => {
                if let Some(closure) = callable.closure() {
                    self.frame(closure);
                }
            }
            _ => {}
        });
    }
}
