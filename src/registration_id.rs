use std::fmt;
use uuid::Uuid;

/// Identifier of one consumer registration inside a subscriber's registry.
///
/// A fresh id is generated for every successful `subscribe()` call, so two
/// consumers sharing a group never collide and each can be removed on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Generate a new unique registration id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Borrow the underlying uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_unique() {
        // ---
        let ids: HashSet<RegistrationId> = (0..64).map(|_| RegistrationId::generate()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn test_display_is_hyphenated_uuid() {
        // ---
        let id = RegistrationId::generate();
        let s = id.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(s, id.as_uuid().to_string());
    }
}
