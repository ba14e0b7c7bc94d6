use minirpc_common::protocol::error::{MinirpcError, Result};
use minirpc_common::{validate_function_name, FunctionId, RpcPayload};

/// A registered procedure: takes the decoded call payload and returns a result
/// payload, or `None` to signal failure to the caller.
pub type Handler = Box<dyn Fn(&RpcPayload) -> Option<RpcPayload> + Send + Sync + 'static>;

/// One registered function. `id` and `name` never change once assigned.
pub struct FunctionEntry {
    id: FunctionId,
    name: String,
    handler: Handler,
}

impl FunctionEntry {
    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Name → (id, handler) directory for a server.
///
/// Entries are kept in insertion order and `entries[i].id == i + 1` always
/// holds. Lookups are linear scans.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<FunctionEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registers `handler` under `name` and returns the function's id.
    ///
    /// Re-registering an existing name replaces its handler in place and
    /// returns the id it already had.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `name` is empty, longer than 1000 bytes, or not printable ASCII
    /// - `InvalidHandler` if `handler` is `None`
    /// - `InvalidArgument` if a new name would need an id beyond `u16::MAX`
    pub fn register(&mut self, name: &str, handler: Option<Handler>) -> Result<FunctionId> {
        validate_function_name(name)?;
        let handler = handler.ok_or(MinirpcError::InvalidHandler)?;

        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            tracing::info!("Replacing handler for '{}' (id {})", name, entry.id);
            entry.handler = handler;
            return Ok(entry.id);
        }

        let id = FunctionId::try_from(self.entries.len() + 1).map_err(|_| {
            MinirpcError::InvalidArgument(format!(
                "registry is full ({} functions), cannot register '{}'",
                self.entries.len(),
                name
            ))
        })?;

        self.entries.push(FunctionEntry {
            id,
            name: name.to_string(),
            handler,
        });
        tracing::info!("Registered '{}' as id {}", name, id);

        Ok(id)
    }

    /// Returns the id registered for `name`, or 0 if there is none.
    ///
    /// Takes raw bytes because names arrive off the wire unvalidated.
    pub fn lookup_by_name(&self, name: impl AsRef<[u8]>) -> FunctionId {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|e| e.name.as_bytes() == name)
            .map_or(0, |e| e.id)
    }

    /// Returns the handler for `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownId` if `id` is outside `1..=len()`.
    pub fn lookup_by_id(&self, id: FunctionId) -> Result<&Handler> {
        (id as usize)
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .map(|e| &e.handler)
            .ok_or(MinirpcError::UnknownId(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: i64) -> Option<Handler> {
        Some(Box::new(move |_: &RpcPayload| Some(RpcPayload::new(value))))
    }

    fn invoke(registry: &Registry, id: FunctionId) -> Option<RpcPayload> {
        let handler = registry.lookup_by_id(id).unwrap();
        handler(&RpcPayload::new(0))
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut registry = Registry::new();
        assert_eq!(registry.register("add2", constant(1)).unwrap(), 1);
        assert_eq!(registry.register("minus2", constant(2)).unwrap(), 2);
        assert_eq!(registry.register("times2", constant(3)).unwrap(), 3);

        let ids: Vec<_> = registry.entries().map(|e| e.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_reregistration_keeps_id_and_replaces_handler() {
        let mut registry = Registry::new();
        registry.register("first", constant(0)).unwrap();
        let id = registry.register("echo", constant(1)).unwrap();

        let again = registry.register("echo", constant(2)).unwrap();
        assert_eq!(again, id);
        assert_eq!(registry.len(), 2);
        assert_eq!(invoke(&registry, id), Some(RpcPayload::new(2)));
    }

    #[test]
    fn test_lookup_by_name() {
        let mut registry = Registry::new();
        registry.register("add2", constant(1)).unwrap();

        assert_eq!(registry.lookup_by_name("add2"), 1);
        assert_eq!(registry.lookup_by_name("add2"), 1);
        assert_eq!(registry.lookup_by_name("missing"), 0);
        assert_eq!(registry.lookup_by_name(b"add"), 0);
        assert_eq!(registry.lookup_by_name([0xffu8, 0xfe]), 0);
    }

    #[test]
    fn test_lookup_by_id_out_of_range() {
        let mut registry = Registry::new();
        registry.register("add2", constant(1)).unwrap();

        assert!(matches!(registry.lookup_by_id(0), Err(MinirpcError::UnknownId(0))));
        assert!(matches!(registry.lookup_by_id(2), Err(MinirpcError::UnknownId(2))));
        assert!(registry.lookup_by_id(1).is_ok());
    }

    #[test]
    fn test_rejects_invalid_names() {
        let mut registry = Registry::new();
        assert!(matches!(registry.register("", constant(1)), Err(MinirpcError::InvalidName(_))));
        assert!(matches!(
            registry.register(&"x".repeat(1001), constant(1)),
            Err(MinirpcError::InvalidName(_))
        ));
        assert!(matches!(registry.register("a\u{1}", constant(1)), Err(MinirpcError::InvalidName(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_accepts_longest_name() {
        let mut registry = Registry::new();
        let name = "~".repeat(1000);
        assert_eq!(registry.register(&name, constant(1)).unwrap(), 1);
        assert_eq!(registry.lookup_by_name(&name), 1);
    }

    #[test]
    fn test_rejects_missing_handler() {
        let mut registry = Registry::new();
        assert!(matches!(registry.register("add2", None), Err(MinirpcError::InvalidHandler)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_reregistration_keeps_old_handler() {
        let mut registry = Registry::new();
        let id = registry.register("echo", constant(1)).unwrap();
        assert!(registry.register("echo", None).is_err());
        assert_eq!(invoke(&registry, id), Some(RpcPayload::new(1)));
    }
}
