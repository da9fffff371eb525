mod properties;

#[cfg(test)]
pub(crate) mod mock;

pub use properties::{
    get_property_str, has_property_str, register_global, set_properties, set_property_str,
    PropertyEntry, RegisterOutcome,
};

use std::fmt;

/// Interface to a scripting engine's reference-counted value API
///
/// `Raw` is the engine's value handle. Every method that returns a `Raw`
/// returns a new owned reference which must eventually be passed to
/// [`HostEngine::release`]; wrapping it in a [`Handle`] does that
/// automatically on every exit path.
pub trait HostEngine {
    /// The engine's value handle type
    type Raw;

    /// Payload installed behind a native function value
    type Callback;

    fn undefined(&self) -> Self::Raw;
    fn string_value(&self, text: &str) -> Self::Raw;
    fn integer_value(&self, value: i64) -> Self::Raw;
    fn float_value(&self, value: f64) -> Self::Raw;
    fn function_value(&self, callback: Self::Callback) -> Self::Raw;

    /// The engine's global namespace object
    fn global_object(&self) -> Self::Raw;

    /// Install `value` under `name` on `target`. The engine takes its own
    /// reference to `value`; the caller keeps ownership of the handle it
    /// passed. `Err` carries the engine's error value, a new owned reference.
    fn object_set(
        &self,
        target: &Self::Raw,
        name: &Self::Raw,
        value: &Self::Raw,
    ) -> Result<(), Self::Raw>;

    /// Read the property `name` from `target`. The returned value may itself
    /// be the engine's error value; it is forwarded unchanged.
    fn object_get(&self, target: &Self::Raw, name: &Self::Raw) -> Self::Raw;

    /// Check whether `target` has the property `name`
    fn object_has(&self, target: &Self::Raw, name: &Self::Raw) -> Result<bool, Self::Raw>;

    /// Drop one reference to a value
    fn release(&self, raw: Self::Raw);
}

/// An owned reference to an engine value, released on drop
///
/// Replaces call-site release discipline: a handle that goes out of scope
/// releases its value no matter which path the caller took.
pub struct Handle<'e, E: HostEngine> {
    engine: &'e E,
    raw: Option<E::Raw>,
}

impl<'e, E: HostEngine> Handle<'e, E> {
    /// Take ownership of a raw engine reference
    pub fn new(engine: &'e E, raw: E::Raw) -> Self {
        Self {
            engine,
            raw: Some(raw),
        }
    }

    /// Borrow the underlying engine value
    pub fn raw(&self) -> &E::Raw {
        match &self.raw {
            Some(raw) => raw,
            // Populated until into_raw or drop consumes the handle
            None => unreachable!("handle already consumed"),
        }
    }

    /// Transfer ownership of the underlying value to the caller; the handle
    /// will not release it
    pub fn into_raw(mut self) -> E::Raw {
        match self.raw.take() {
            Some(raw) => raw,
            None => unreachable!("handle already consumed"),
        }
    }
}

impl<E: HostEngine> Drop for Handle<'_, E> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.engine.release(raw);
        }
    }
}

impl<E: HostEngine> fmt::Debug for Handle<'_, E>
where
    E::Raw: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("raw", &self.raw).finish()
    }
}
