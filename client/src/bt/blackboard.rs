use crate::registry::EntityHandle;
use glam::Vec3;
use std::collections::HashMap;

/// A typed blackboard variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Text(String),
    Entity(Option<EntityHandle>),
    Point(Vec3),
    Points(Vec<Vec3>),
}

/// Per-tree shared variables. Reading a missing or differently-typed key
/// yields `None`, which nodes turn into `Failure`.
#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    values: HashMap<&'static str, Value>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: Value) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set_bool(&mut self, key: &'static str, value: bool) {
        self.set(key, Value::Bool(value));
    }

    pub fn set_int(&mut self, key: &'static str, value: i32) {
        self.set(key, Value::Int(value));
    }

    pub fn set_float(&mut self, key: &'static str, value: f32) {
        self.set(key, Value::Float(value));
    }

    pub fn set_text(&mut self, key: &'static str, value: impl Into<String>) {
        self.set(key, Value::Text(value.into()));
    }

    pub fn set_entity(&mut self, key: &'static str, value: Option<EntityHandle>) {
        self.set(key, Value::Entity(value));
    }

    pub fn set_point(&mut self, key: &'static str, value: Vec3) {
        self.set(key, Value::Point(value));
    }

    pub fn set_points(&mut self, key: &'static str, value: Vec<Vec3>) {
        self.set(key, Value::Points(value));
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(Value::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.get(key) {
            Some(Value::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// The handle stored under `key`; an explicitly empty slot reads as `None`.
    pub fn get_entity(&self, key: &str) -> Option<EntityHandle> {
        match self.get(key) {
            Some(Value::Entity(v)) => *v,
            _ => None,
        }
    }

    pub fn get_point(&self, key: &str) -> Option<Vec3> {
        match self.get(key) {
            Some(Value::Point(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_points(&self, key: &str) -> Option<&[Vec3]> {
        match self.get(key) {
            Some(Value::Points(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Removes and returns a text value, leaving other types in place.
    pub fn take_text(&mut self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(Value::Text(_)) => match self.values.remove(key) {
                Some(Value::Text(text)) => Some(text),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn take_points(&mut self, key: &str) -> Option<Vec<Vec3>> {
        match self.values.get(key) {
            Some(Value::Points(_)) => match self.values.remove(key) {
                Some(Value::Points(points)) => Some(points),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
