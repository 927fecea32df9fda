// Copyright (C) 2020-2024 Andy Kurnia.

use crate::card::{Card, is_set};
use rand::prelude::*;

/// One card of a claimed set: where it sits and what the server calls it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    pub idx: usize,
    pub card_id: u8,
}

pub type Triple = [Pick; 3];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchOrder {
    /// first set in board order
    Ordered,
    /// first set in a freshly shuffled order
    #[default]
    Randomized,
}

pub fn find_set<R: Rng + ?Sized>(cards: &[Card], order: SearchOrder, rng: &mut R) -> Option<Triple> {
    match order {
        SearchOrder::Ordered => find_set_ordered(cards),
        SearchOrder::Randomized => find_set_randomized(cards, rng),
    }
}

/// Picks come back with ascending indices.
pub fn find_set_ordered(cards: &[Card]) -> Option<Triple> {
    let order = (0..cards.len()).collect::<Vec<_>>();
    scan(cards, &order)
}

/// Same exhaustive search, but which set wins depends on the shuffle, so
/// bots sharing a board do not all race for the same cards.
pub fn find_set_randomized<R: Rng + ?Sized>(cards: &[Card], rng: &mut R) -> Option<Triple> {
    let mut order = (0..cards.len()).collect::<Vec<_>>();
    order.shuffle(rng);
    scan(cards, &order)
}

fn scan(cards: &[Card], order: &[usize]) -> Option<Triple> {
    let l = order.len();
    for i in 0..l.saturating_sub(2) {
        for j in i + 1..l - 1 {
            for k in j + 1..l {
                let (a, b, c) = (order[i], order[j], order[k]);
                if is_set(&cards[a], &cards[b], &cards[c]) {
                    return Some([pick(cards, a)?, pick(cards, b)?, pick(cards, c)?]);
                }
            }
        }
    }
    None
}

fn pick(cards: &[Card], idx: usize) -> Option<Pick> {
    Some(Pick {
        idx,
        card_id: cards[idx].id()?,
    })
}
