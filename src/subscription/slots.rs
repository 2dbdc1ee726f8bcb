use smallvec::SmallVec;

/// Attachments that come and go while their owner stays alive: the outlets
/// of a subject, or the inner subscriptions of `flat_map`.
///
/// Ids are handed out in increasing order and never reused, so the slots stay
/// sorted by id and lookups are binary searches.
pub(crate) struct Slots<U> {
  next_id: usize,
  slots: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for Slots<U> {
  fn default() -> Self { Slots { next_id: 0, slots: SmallVec::new() } }
}

impl<U> Slots<U> {
  pub(crate) fn attach(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.slots.push((id, item));
    id
  }

  pub(crate) fn detach(&mut self, id: usize) -> Option<U> {
    let pos = self.position(id)?;
    Some(self.slots.remove(pos).1)
  }

  pub(crate) fn get_mut(&mut self, id: usize) -> Option<&mut U> {
    let pos = self.position(id)?;
    Some(&mut self.slots[pos].1)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.slots.len() }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.slots.is_empty() }

  pub(crate) fn iter(&self) -> impl Iterator<Item = &U> + '_ { self.slots.iter().map(|(_, item)| item) }

  /// Empties the container. Ids already handed out stay retired.
  pub(crate) fn take_all(&mut self) -> impl Iterator<Item = U> {
    std::mem::take(&mut self.slots).into_iter().map(|(_, item)| item)
  }

  fn position(&self, id: usize) -> Option<usize> {
    self.slots.binary_search_by_key(&id, |(slot, _)| *slot).ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detached_ids_are_not_reused() {
    let mut slots = Slots::default();
    let a = slots.attach("a");
    let b = slots.attach("b");
    assert_eq!(slots.detach(a), Some("a"));
    let c = slots.attach("c");
    assert!(c > b);
    assert_eq!(slots.detach(a), None);
    assert_eq!(slots.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
  }

  #[test]
  fn lookup_after_middle_detach() {
    let mut slots = Slots::default();
    let ids: Vec<_> = (0..5).map(|v| slots.attach(v)).collect();
    slots.detach(ids[2]);
    if let Some(slot) = slots.get_mut(ids[3]) {
      *slot = 30;
    }
    assert!(slots.get_mut(ids[2]).is_none());
    assert_eq!(slots.iter().copied().collect::<Vec<_>>(), vec![0, 1, 30, 4]);
  }

  #[test]
  fn take_all_empties_but_keeps_counting() {
    let mut slots = Slots::default();
    slots.attach(1);
    slots.attach(2);
    assert_eq!(slots.take_all().collect::<Vec<_>>(), vec![1, 2]);
    assert!(slots.is_empty());
    assert_eq!(slots.attach(3), 2);
    assert_eq!(slots.len(), 1);
  }
}
