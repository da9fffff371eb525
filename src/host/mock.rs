//! In-memory reference-counting engine used to test the host boundary
//!
//! Every value lives in a slot with an explicit refcount, so tests can assert
//! that the helpers release exactly what they allocate.

use std::cell::{Cell, RefCell};
use rustc_hash::FxHashMap;
use crate::host::HostEngine;

/// Index of a value slot; the mock's version of an engine value handle
pub type Slot = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum MockValue {
    Undefined,
    Str(String),
    Integer(i64),
    Float(f64),
    Function(&'static str),
    Object,
    Error(&'static str),
}

#[derive(Debug)]
struct SlotData {
    value: MockValue,
    refs: usize,
    // Property values this object owns a reference to
    properties: FxHashMap<String, Slot>,
}

pub struct MockEngine {
    slots: RefCell<Vec<SlotData>>,
    global: Slot,
    fail_set_on: RefCell<Option<String>>,
    fail_has: Cell<bool>,
}

impl MockEngine {
    pub fn new() -> Self {
        let engine = Self {
            slots: RefCell::new(Vec::new()),
            global: 0,
            fail_set_on: RefCell::new(None),
            fail_has: Cell::new(false),
        };
        // The engine keeps one base reference to the global object
        let global = engine.alloc(MockValue::Object);
        debug_assert_eq!(global, engine.global);
        engine
    }

    fn alloc(&self, value: MockValue) -> Slot {
        let mut slots = self.slots.borrow_mut();
        slots.push(SlotData {
            value,
            refs: 1,
            properties: FxHashMap::default(),
        });
        slots.len() - 1
    }

    fn retain(&self, slot: Slot) {
        let mut slots = self.slots.borrow_mut();
        assert!(slots[slot].refs > 0, "retain of a dead slot {}", slot);
        slots[slot].refs += 1;
    }

    fn string_text(&self, slot: Slot) -> String {
        match &self.slots.borrow()[slot].value {
            MockValue::Str(text) => text.clone(),
            other => panic!("slot {} is not a string: {:?}", slot, other),
        }
    }

    /// Make `object_set` fail for this property name
    pub fn fail_set_on(&self, name: &str) {
        *self.fail_set_on.borrow_mut() = Some(name.to_string());
    }

    /// Make `object_has` report an error
    pub fn fail_has(&self, fail: bool) {
        self.fail_has.set(fail);
    }

    /// Allocate a fresh plain object
    pub fn object_value(&self) -> Slot {
        self.alloc(MockValue::Object)
    }

    pub fn global_slot(&self) -> Slot {
        self.global
    }

    pub fn refs(&self, slot: Slot) -> usize {
        self.slots.borrow()[slot].refs
    }

    pub fn value(&self, slot: Slot) -> MockValue {
        self.slots.borrow()[slot].value.clone()
    }

    /// Number of slots still holding at least one reference
    pub fn live_count(&self) -> usize {
        self.slots.borrow().iter().filter(|s| s.refs > 0).count()
    }

    pub fn property_of(&self, object: Slot, name: &str) -> Option<Slot> {
        self.slots.borrow()[object].properties.get(name).copied()
    }
}

impl HostEngine for MockEngine {
    type Raw = Slot;
    type Callback = &'static str;

    fn undefined(&self) -> Slot {
        self.alloc(MockValue::Undefined)
    }

    fn string_value(&self, text: &str) -> Slot {
        self.alloc(MockValue::Str(text.to_string()))
    }

    fn integer_value(&self, value: i64) -> Slot {
        self.alloc(MockValue::Integer(value))
    }

    fn float_value(&self, value: f64) -> Slot {
        self.alloc(MockValue::Float(value))
    }

    fn function_value(&self, callback: &'static str) -> Slot {
        self.alloc(MockValue::Function(callback))
    }

    fn global_object(&self) -> Slot {
        self.retain(self.global);
        self.global
    }

    fn object_set(&self, target: &Slot, name: &Slot, value: &Slot) -> Result<(), Slot> {
        let name_text = self.string_text(*name);
        if self.fail_set_on.borrow().as_deref() == Some(name_text.as_str()) {
            return Err(self.alloc(MockValue::Error("set failed")));
        }

        self.retain(*value);
        let replaced = {
            let mut slots = self.slots.borrow_mut();
            assert_eq!(slots[*target].value, MockValue::Object, "set on a non-object");
            slots[*target].properties.insert(name_text, *value)
        };
        if let Some(old) = replaced {
            self.release(old);
        }
        Ok(())
    }

    fn object_get(&self, target: &Slot, name: &Slot) -> Slot {
        let name_text = self.string_text(*name);
        match self.property_of(*target, &name_text) {
            Some(slot) => {
                self.retain(slot);
                slot
            }
            None => self.undefined(),
        }
    }

    fn object_has(&self, target: &Slot, name: &Slot) -> Result<bool, Slot> {
        if self.fail_has.get() {
            return Err(self.alloc(MockValue::Error("has failed")));
        }
        let name_text = self.string_text(*name);
        Ok(self.property_of(*target, &name_text).is_some())
    }

    fn release(&self, raw: Slot) {
        // Iterative so that releasing an object's properties never re-borrows
        // the slot table recursively
        let mut pending = vec![raw];
        while let Some(slot) = pending.pop() {
            let mut slots = self.slots.borrow_mut();
            let data = &mut slots[slot];
            assert!(data.refs > 0, "double release of slot {}", slot);
            data.refs -= 1;
            if data.refs == 0 {
                let properties = std::mem::take(&mut data.properties);
                drop(slots);
                pending.extend(properties.into_values());
            }
        }
    }
}
