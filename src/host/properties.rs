use crate::host::{Handle, HostEngine};

/// A (name, value) pair for bulk property installation
pub struct PropertyEntry<'e, E: HostEngine> {
    pub name: String,
    pub value: Handle<'e, E>,
}

impl<'e, E: HostEngine> PropertyEntry<'e, E> {
    pub fn new(name: &str, value: Handle<'e, E>) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// Result of a bulk property installation
///
/// `registered` counts the entries installed before the first failure; on
/// failure `error` holds the engine's error value. The values of entries that
/// were never reached have already been released when this is returned, so
/// there is no separate cleanup step.
pub struct RegisterOutcome<'e, E: HostEngine> {
    pub registered: usize,
    pub error: Option<Handle<'e, E>>,
}

impl<'e, E: HostEngine> RegisterOutcome<'e, E> {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Bind a native function under `name` on the global object
///
/// On failure the returned handle carries the engine's error value. All
/// intermediate references are released on both paths.
pub fn register_global<'e, E: HostEngine>(
    engine: &'e E,
    name: &str,
    callback: E::Callback,
) -> Result<(), Handle<'e, E>> {
    let global = Handle::new(engine, engine.global_object());
    let name_value = Handle::new(engine, engine.string_value(name));
    let function = Handle::new(engine, engine.function_value(callback));

    match engine.object_set(global.raw(), name_value.raw(), function.raw()) {
        Ok(()) => Ok(()),
        Err(error) => Err(Handle::new(engine, error)),
    }
}

/// Install a list of (name, value) pairs on `target` in order, stopping at
/// the first failure
///
/// Ownership of every entry's value transfers into this call: installed
/// values are kept alive by the target object, and the rest are released
/// before returning.
pub fn set_properties<'e, E: HostEngine>(
    engine: &'e E,
    target: &Handle<'e, E>,
    entries: Vec<PropertyEntry<'e, E>>,
) -> RegisterOutcome<'e, E> {
    let total = entries.len();

    for (index, entry) in entries.into_iter().enumerate() {
        let name_value = Handle::new(engine, engine.string_value(&entry.name));
        if let Err(error) = engine.object_set(target.raw(), name_value.raw(), entry.value.raw()) {
            // Dropping the rest of the iterator releases the unregistered tail
            return RegisterOutcome {
                registered: index,
                error: Some(Handle::new(engine, error)),
            };
        }
    }

    RegisterOutcome {
        registered: total,
        error: None,
    }
}

/// Set a single property by UTF-8 name
pub fn set_property_str<'e, E: HostEngine>(
    engine: &'e E,
    target: &Handle<'e, E>,
    name: &str,
    value: &Handle<'e, E>,
) -> Result<(), Handle<'e, E>> {
    let name_value = Handle::new(engine, engine.string_value(name));
    engine
        .object_set(target.raw(), name_value.raw(), value.raw())
        .map_err(|error| Handle::new(engine, error))
}

/// Get a property value by UTF-8 name
///
/// Whatever the engine returns is forwarded, including its error value.
pub fn get_property_str<'e, E: HostEngine>(
    engine: &'e E,
    target: &Handle<'e, E>,
    name: &str,
) -> Handle<'e, E> {
    let name_value = Handle::new(engine, engine.string_value(name));
    Handle::new(engine, engine.object_get(target.raw(), name_value.raw()))
}

/// Check whether a property exists by UTF-8 name
///
/// An error from the underlying check is reported as "does not exist",
/// never propagated.
pub fn has_property_str<E: HostEngine>(engine: &E, target: &Handle<'_, E>, name: &str) -> bool {
    let name_value = Handle::new(engine, engine.string_value(name));
    match engine.object_has(target.raw(), name_value.raw()) {
        Ok(has) => has,
        Err(error) => {
            engine.release(error);
            false
        }
    }
}
