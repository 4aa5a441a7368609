//! Tagged reference type: bare id or fully expanded entity.
//!
//! Reference fields on API responses are either a bare id or the expanded
//! entity, decided once at the data-access boundary. Downstream code and
//! clients match on the tag instead of probing the shape ad hoc.

use serde::Serialize;

/// A reference field that is either an id or the resolved entity.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntityRef<Id, T> {
    /// Unresolved reference carrying only the id.
    Reference(Id),
    /// Reference resolved to the full entity.
    Expanded(T),
}

impl<Id, T> EntityRef<Id, T> {
    /// Returns the expanded entity, if this reference was resolved.
    #[must_use]
    pub const fn expanded(&self) -> Option<&T> {
        match self {
            Self::Reference(_) => None,
            Self::Expanded(entity) => Some(entity),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ListingId;

    #[test]
    fn reference_serializes_with_tag() {
        let r: EntityRef<ListingId, String> = EntityRef::Reference(ListingId::new());
        let json = serde_json::to_string(&r).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"kind\":\"reference\""));
    }

    #[test]
    fn expanded_exposes_entity() {
        let r: EntityRef<ListingId, String> = EntityRef::Expanded("listing".to_string());
        assert_eq!(r.expanded().map(String::as_str), Some("listing"));

        let bare: EntityRef<ListingId, String> = EntityRef::Reference(ListingId::new());
        assert!(bare.expanded().is_none());
    }
}
