use dashmap::DashMap;

use crate::core::Key;

/// Symbolic tags over binding ids, kept in registration order.
#[derive(Debug, Default)]
pub(crate) struct TagRegistry {
  tags: DashMap<String, Vec<Key>>,
}

impl TagRegistry {
  pub(crate) fn tag<I>(&self, tag: &str, ids: I)
  where
    I: IntoIterator<Item = Key>,
  {
    let mut entry = self.tags.entry(tag.to_owned()).or_default();
    for id in ids {
      if !entry.contains(&id) {
        tracing::trace!(tag, id = %id, "tagged");
        entry.push(id);
      }
    }
  }

  pub(crate) fn ids(&self, tag: &str) -> Vec<Key> {
    self
      .tags
      .get(tag)
      .map(|ids| ids.value().clone())
      .unwrap_or_default()
  }

  pub(crate) fn untag(&self, tag: &str, id: &Key) -> bool {
    self
      .tags
      .get_mut(tag)
      .map(|mut ids| {
        let before = ids.len();
        ids.retain(|tagged| tagged != id);
        before != ids.len()
      })
      .unwrap_or(false)
  }
}
