//! Specialized collection types
//!
//! Portals, walls and scene objects live in slot maps so the rest of the
//! engine can hold plain, copyable, non-owning handles to them. A stale
//! handle simply fails to resolve.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a portal in the portal table
    pub struct PortalId;

    /// Handle to an object in the scene
    pub struct ObjectId;

    /// Handle to a portal wall in the scene
    pub struct WallId;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut objects: HandleMap<ObjectId, &str> = HandleMap::with_key();
        let first = objects.insert("crate");
        objects.remove(first);
        let second = objects.insert("pawn");

        assert!(objects.get(first).is_none());
        assert_eq!(objects.get(second), Some(&"pawn"));
    }
}
