use crate::Entry;

/// The inline ("visible") prefix and collapsed ("hidden") suffix of the store's entries.
///
/// Derived on demand from the current entries; never cache one across mutations, because hidden
/// indices shift whenever an entry before them is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowView<'a> {
    visible: &'a [Entry],
    hidden: &'a [Entry],
    visible_limit: usize,
}

impl<'a> OverflowView<'a> {
    pub fn split(entries: &'a [Entry], visible_limit: usize) -> Self {
        let (visible, hidden) = entries.split_at(visible_limit.min(entries.len()));
        Self {
            visible,
            hidden,
            visible_limit,
        }
    }

    pub fn visible(&self) -> &'a [Entry] {
        self.visible
    }

    pub fn hidden(&self) -> &'a [Entry] {
        self.hidden
    }

    pub fn has_overflow(&self) -> bool {
        !self.hidden.is_empty()
    }

    /// Label for the overflow trigger, e.g. `+3`.
    pub fn overflow_label(&self) -> Option<String> {
        self.has_overflow()
            .then(|| format!("+{}", self.hidden.len()))
    }

    /// Map a position in [`hidden`](Self::hidden) back to the store index it was derived from.
    pub fn store_index_of_hidden(&self, hidden_index: usize) -> Option<usize> {
        (hidden_index < self.hidden.len()).then_some(self.visible_limit + hidden_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChipStore;
    use pretty_assertions::assert_eq;

    fn strs(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(Entry::as_str).collect()
    }

    #[test]
    fn splits_at_visible_limit() {
        let mut store = ChipStore::default();
        store.submit("a@x.com b@x.com c@x.com").expect("tokens");

        let view = OverflowView::split(store.entries(), 2);
        assert_eq!(strs(view.visible()), vec!["a@x.com", "b@x.com"]);
        assert_eq!(strs(view.hidden()), vec!["c@x.com"]);
        assert_eq!(view.overflow_label().as_deref(), Some("+1"));
        assert_eq!(view.store_index_of_hidden(0), Some(2));
        assert_eq!(view.store_index_of_hidden(1), None);
    }

    #[test]
    fn short_lists_have_no_overflow() {
        let mut store = ChipStore::default();
        store.submit("a@x.com").expect("tokens");

        let view = OverflowView::split(store.entries(), 2);
        assert_eq!(strs(view.visible()), vec!["a@x.com"]);
        assert!(view.hidden().is_empty());
        assert_eq!(view.overflow_label(), None);
        assert_eq!(view.store_index_of_hidden(0), None);
    }

    #[test]
    fn zero_limit_hides_everything() {
        let mut store = ChipStore::default();
        store.submit("a@x.com b@x.com").expect("tokens");

        let view = OverflowView::split(store.entries(), 0);
        assert!(view.visible().is_empty());
        assert_eq!(view.store_index_of_hidden(1), Some(1));
    }

    #[test]
    fn hidden_mapping_stays_in_range_after_every_removal() {
        for remove in 0..6 {
            let mut store = ChipStore::default();
            store
                .submit("a@x.com b@x.com c@x.com d@x.com e@x.com f@x.com")
                .expect("tokens");
            store.remove_at(remove).expect("remove");

            let view = OverflowView::split(store.entries(), 2);
            for hidden_index in 0..view.hidden().len() {
                let index = view
                    .store_index_of_hidden(hidden_index)
                    .expect("mapped index");
                assert_eq!(
                    store.entries()[index].as_str(),
                    view.hidden()[hidden_index].as_str()
                );
            }
            assert_eq!(view.store_index_of_hidden(view.hidden().len()), None);
        }
    }
}
