//! Validation functions for backend requests.

use std::collections::HashSet;

use crate::condition::Action;
use crate::condition::ConditionalAction;
use crate::constants::MAX_ATOMIC_WRITE_SIZE;
use crate::constants::MAX_KEY_SIZE;
use crate::constants::MAX_VALUE_SIZE;
use crate::error::BackendError;
use crate::item::Item;
use crate::key::Key;

/// Validate a key against fixed size limits.
pub fn validate_key(key: &Key) -> Result<(), BackendError> {
    if key.is_empty() {
        return Err(BackendError::EmptyKey);
    }
    let len = key.len();
    if len > MAX_KEY_SIZE as usize {
        return Err(BackendError::KeyTooLarge {
            size: len as u32,
            max: MAX_KEY_SIZE,
        });
    }
    Ok(())
}

/// Validate an item's key and value sizes.
pub fn validate_item(item: &Item) -> Result<(), BackendError> {
    validate_key(&item.key)?;
    let len = item.value.len();
    if len > MAX_VALUE_SIZE as usize {
        return Err(BackendError::ValueTooLarge {
            size: len as u32,
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

/// Validate an atomic write before any condition is evaluated.
///
/// A batch must hold between 1 and [`MAX_ATOMIC_WRITE_SIZE`] actions and may
/// name each key at most once.
pub fn validate_atomic_write(actions: &[ConditionalAction]) -> Result<(), BackendError> {
    if actions.is_empty() {
        return Err(BackendError::EmptyBatch);
    }
    if actions.len() > MAX_ATOMIC_WRITE_SIZE as usize {
        return Err(BackendError::BatchTooLarge {
            size: actions.len() as u32,
            max: MAX_ATOMIC_WRITE_SIZE,
        });
    }

    let mut seen = HashSet::with_capacity(actions.len());
    for action in actions {
        validate_key(&action.key)?;
        if let Action::Put(item) = &action.action {
            let len = item.value.len();
            if len > MAX_VALUE_SIZE as usize {
                return Err(BackendError::ValueTooLarge {
                    size: len as u32,
                    max: MAX_VALUE_SIZE,
                });
            }
        }
        if !seen.insert(&action.key) {
            return Err(BackendError::DuplicateKey {
                key: action.key.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key;

    fn delete(name: &str) -> ConditionalAction {
        ConditionalAction::delete(key(["t", name]))
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(validate_key(&Key::default()), Err(BackendError::EmptyKey));
    }

    #[test]
    fn oversized_key_rejected() {
        let big = Key::from_bytes(vec![b'a'; MAX_KEY_SIZE as usize + 1]);
        assert!(matches!(validate_key(&big), Err(BackendError::KeyTooLarge { .. })));
    }

    #[test]
    fn key_at_limit_accepted() {
        let k = Key::from_bytes(vec![b'a'; MAX_KEY_SIZE as usize]);
        assert!(validate_key(&k).is_ok());
    }

    #[test]
    fn oversized_value_rejected() {
        let item = Item::new(Key::from("/k"), vec![0u8; MAX_VALUE_SIZE as usize + 1]);
        assert!(matches!(validate_item(&item), Err(BackendError::ValueTooLarge { .. })));
    }

    #[test]
    fn empty_batch_rejected() {
        assert_eq!(validate_atomic_write(&[]), Err(BackendError::EmptyBatch));
    }

    #[test]
    fn batch_at_limit_accepted() {
        let actions: Vec<_> = (0..MAX_ATOMIC_WRITE_SIZE).map(|i| delete(&i.to_string())).collect();
        assert!(validate_atomic_write(&actions).is_ok());
    }

    #[test]
    fn batch_over_limit_rejected() {
        let actions: Vec<_> = (0..=MAX_ATOMIC_WRITE_SIZE).map(|i| delete(&i.to_string())).collect();
        assert!(matches!(
            validate_atomic_write(&actions),
            Err(BackendError::BatchTooLarge { size, .. }) if size == MAX_ATOMIC_WRITE_SIZE + 1
        ));
    }

    #[test]
    fn duplicate_key_rejected() {
        let actions = vec![delete("a"), delete("b"), delete("a")];
        assert_eq!(
            validate_atomic_write(&actions),
            Err(BackendError::DuplicateKey { key: "/t/a".into() })
        );
    }
}
