use std::collections::{HashSet, VecDeque};

use super::card::RecommendationCard;

/// Ordered cards plus the ids already swiped this session. No two queued
/// cards share an id, and an id enters `seen` before its card leaves.
#[derive(Debug, Default)]
pub struct FeedQueue {
    original: Vec<RecommendationCard>,
    queue: VecDeque<RecommendationCard>,
    seen: HashSet<String>,
}

impl FeedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a fresh list, dropping in-list repeats.
    pub fn load(&mut self, cards: Vec<RecommendationCard>) {
        let mut ids = HashSet::new();
        self.original = cards
            .into_iter()
            .filter(|card| ids.insert(card.id.clone()))
            .collect();
        self.seen.clear();
        self.queue = self.original.iter().cloned().collect();
    }

    /// Remove the head card, marking it seen first.
    pub fn swipe(&mut self) -> Option<RecommendationCard> {
        let id = self.queue.front()?.id.clone();
        self.seen.insert(id);
        self.queue.pop_front()
    }

    /// Append cards that are neither seen nor queued. Returns how many landed.
    pub fn merge(&mut self, cards: Vec<RecommendationCard>) -> usize {
        let mut queued: HashSet<String> = self.queue.iter().map(|card| card.id.clone()).collect();
        let before = self.queue.len();
        for card in cards {
            if self.seen.contains(&card.id) || !queued.insert(card.id.clone()) {
                continue;
            }
            self.queue.push_back(card);
        }
        self.queue.len() - before
    }

    /// Back to the list as first loaded, with nothing seen.
    pub fn reset(&mut self) {
        self.seen.clear();
        self.queue = self.original.iter().cloned().collect();
    }

    pub fn head(&self) -> Option<&RecommendationCard> {
        self.queue.front()
    }

    pub fn cards(&self) -> Vec<RecommendationCard> {
        self.queue.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str) -> RecommendationCard {
        RecommendationCard {
            id: id.into(),
            action: id.into(),
            title: id.to_uppercase(),
            description: String::new(),
            icon: String::new(),
            source: None,
            deep_link: None,
            fallback_url: None,
            category: None,
            content_type: None,
            priority: 0,
        }
    }

    fn ids(queue: &FeedQueue) -> Vec<String> {
        queue.cards().into_iter().map(|c| c.id).collect()
    }

    fn assert_unique(queue: &FeedQueue) {
        let ids = ids(queue);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "duplicate ids in {ids:?}");
    }

    #[test]
    fn swipe_then_merge_appends_only_new_cards() {
        let mut queue = FeedQueue::new();
        queue.load(vec![card("a"), card("b")]);

        assert_eq!(queue.swipe().map(|c| c.id), Some("a".to_string()));
        assert!(queue.has_seen("a"));
        assert_eq!(ids(&queue), ["b"]);

        assert_eq!(queue.merge(vec![card("b"), card("c")]), 1);
        assert_eq!(ids(&queue), ["b", "c"]);
    }

    #[test]
    fn load_and_merge_drop_repeats_within_a_batch() {
        let mut queue = FeedQueue::new();
        queue.load(vec![card("a"), card("a"), card("b")]);
        assert_eq!(ids(&queue), ["a", "b"]);

        assert_eq!(queue.merge(vec![card("c"), card("c")]), 1);
        assert_unique(&queue);
    }

    #[test]
    fn interleaved_swipes_and_merges_never_duplicate() {
        let mut queue = FeedQueue::new();
        queue.load(vec![card("a"), card("b"), card("c")]);

        let batches = [
            vec!["a", "b", "d"],
            vec!["d", "e"],
            vec!["a", "e", "f", "f"],
            vec!["b", "c", "g"],
        ];
        for batch in batches {
            queue.swipe();
            queue.merge(batch.into_iter().map(card).collect());
            assert_unique(&queue);
            for id in ids(&queue) {
                assert!(!queue.has_seen(&id), "{id} is both seen and queued");
            }
        }
    }

    #[test]
    fn reset_restores_original_and_clears_seen() {
        let mut queue = FeedQueue::new();
        queue.load(vec![card("a"), card("b")]);
        queue.swipe();
        queue.swipe();
        queue.merge(vec![card("c")]);
        assert_eq!(queue.seen_count(), 2);

        queue.reset();
        assert_eq!(ids(&queue), ["a", "b"]);
        assert_eq!(queue.seen_count(), 0);
    }

    #[test]
    fn swiping_an_empty_queue_is_a_no_op() {
        let mut queue = FeedQueue::new();
        assert!(queue.swipe().is_none());
        assert_eq!(queue.seen_count(), 0);
    }
}
