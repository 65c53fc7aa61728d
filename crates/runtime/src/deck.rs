//! Shared demand-card deck with explicit compensation hooks.
//!
//! Deck mutations live outside the relational transaction, so the executor
//! compensates on rollback instead of relying on cross-store atomicity: a
//! discarded card is returned to the dealt set and a freshly dealt
//! replacement is returned to the top of the draw pile, restoring the deck to
//! its pre-attempt state.

use std::collections::VecDeque;
use std::sync::Mutex;

use rail_core::DemandCard;

/// Deck operations used by the executor and its compensation path.
pub trait DeckService: Send + Sync {
    /// Deals the top card of the draw pile, reshuffling the discard pile in
    /// when the draw pile is empty. `None` only when the deck is fully dealt.
    fn draw_card(&self) -> Option<DemandCard>;

    /// Moves a dealt card to the top of the discard pile.
    fn discard_card(&self, card_id: u32);

    /// A dealt card by id, if it is currently out with a player.
    fn get_card(&self, card_id: u32) -> Option<DemandCard>;

    /// Compensation: undoes a draw by returning a dealt card to the top of
    /// the draw pile.
    fn return_dealt_card_to_top(&self, card_id: u32);

    /// Compensation: undoes a discard by moving the card back to the dealt
    /// set.
    fn return_discarded_to_dealt(&self, card_id: u32);
}

#[derive(Default)]
struct DeckInner {
    draw: VecDeque<DemandCard>,
    discard: Vec<DemandCard>,
    dealt: Vec<DemandCard>,
}

/// In-memory demand deck shared across concurrently running bot turns.
#[derive(Default)]
pub struct DemandDeck {
    inner: Mutex<DeckInner>,
}

impl DemandDeck {
    /// A deck with every card in the draw pile.
    pub fn new(cards: Vec<DemandCard>) -> Self {
        Self {
            inner: Mutex::new(DeckInner {
                draw: cards.into(),
                ..DeckInner::default()
            }),
        }
    }

    /// A deck where `dealt` cards are already out with players (their hands)
    /// and the rest form the draw pile.
    pub fn with_dealt(dealt: Vec<DemandCard>, draw: Vec<DemandCard>) -> Self {
        Self {
            inner: Mutex::new(DeckInner {
                draw: draw.into(),
                discard: Vec::new(),
                dealt,
            }),
        }
    }

    pub fn draw_pile_len(&self) -> usize {
        self.lock().draw.len()
    }

    pub fn discard_pile_len(&self) -> usize {
        self.lock().discard.len()
    }

    /// Id of the next card that would be drawn, for test assertions.
    pub fn peek_top(&self) -> Option<u32> {
        self.lock().draw.front().map(|c| c.id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DeckInner> {
        // Mutex poisoning only happens if a panic occurred mid-mutation;
        // deck state is a Vec shuffle away from consistent either way.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeckService for DemandDeck {
    fn draw_card(&self) -> Option<DemandCard> {
        let mut inner = self.lock();
        if inner.draw.is_empty() && !inner.discard.is_empty() {
            tracing::debug!("demand deck exhausted, recycling discard pile");
            let recycled: Vec<DemandCard> = inner.discard.drain(..).rev().collect();
            inner.draw.extend(recycled);
        }
        let card = inner.draw.pop_front()?;
        inner.dealt.push(card.clone());
        Some(card)
    }

    fn discard_card(&self, card_id: u32) {
        let mut inner = self.lock();
        if let Some(index) = inner.dealt.iter().position(|c| c.id == card_id) {
            let card = inner.dealt.remove(index);
            inner.discard.push(card);
        }
    }

    fn get_card(&self, card_id: u32) -> Option<DemandCard> {
        self.lock().dealt.iter().find(|c| c.id == card_id).cloned()
    }

    fn return_dealt_card_to_top(&self, card_id: u32) {
        let mut inner = self.lock();
        if let Some(index) = inner.dealt.iter().position(|c| c.id == card_id) {
            let card = inner.dealt.remove(index);
            inner.draw.push_front(card);
        }
    }

    fn return_discarded_to_dealt(&self, card_id: u32) {
        let mut inner = self.lock();
        if let Some(index) = inner.discard.iter().position(|c| c.id == card_id) {
            let card = inner.discard.remove(index);
            inner.dealt.push(card);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::demo::demo_demand_cards;

    #[test]
    fn draw_then_compensate_restores_deck() {
        let deck = DemandDeck::new(demo_demand_cards());
        let before_top = deck.peek_top().unwrap();
        let card = deck.draw_card().unwrap();
        assert_eq!(card.id, before_top);

        deck.return_dealt_card_to_top(card.id);
        assert_eq!(deck.peek_top(), Some(before_top));
        assert!(deck.get_card(card.id).is_none());
    }

    #[test]
    fn discard_then_compensate_restores_dealt() {
        let deck = DemandDeck::new(demo_demand_cards());
        let card = deck.draw_card().unwrap();

        deck.discard_card(card.id);
        assert!(deck.get_card(card.id).is_none());
        assert_eq!(deck.discard_pile_len(), 1);

        deck.return_discarded_to_dealt(card.id);
        assert!(deck.get_card(card.id).is_some());
        assert_eq!(deck.discard_pile_len(), 0);
    }

    #[test]
    fn exhausted_draw_pile_recycles_discards() {
        let cards = demo_demand_cards();
        let total = cards.len();
        let deck = DemandDeck::new(cards);

        for _ in 0..total {
            let card = deck.draw_card().unwrap();
            deck.discard_card(card.id);
        }
        assert_eq!(deck.draw_pile_len(), 0);
        assert!(deck.draw_card().is_some(), "discards should recycle");
    }
}
