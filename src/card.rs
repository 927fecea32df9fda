// Copyright (C) 2020-2024 Andy Kurnia.

use crate::error::CardError;

pub const NUM_ATTRS: usize = 4;
pub const NUM_VALUES: u8 = 3;
pub const NUM_CARDS: u8 = 81;
pub const EMPTY_CARD_ID: u8 = NUM_CARDS;
pub const BOARD_SIZE: usize = 12;

pub type Board = [Card; BOARD_SIZE];

/// A Set card, or the hole left on the board when there is none.
///
/// Card ids are the 4 attributes read as a base-3 number, attribute 0
/// being the most significant digit: [1, 0, 2, 1] is 27 + 0 + 6 + 1 = 34.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Card {
    #[default]
    Empty,
    Dealt([u8; NUM_ATTRS]),
}

impl Card {
    pub fn from_id(id: i64) -> Result<Self, CardError> {
        match u8::try_from(id) {
            Ok(EMPTY_CARD_ID) => Ok(Card::Empty),
            Ok(id) if id < NUM_CARDS => {
                let mut attrs = [0; NUM_ATTRS];
                let mut place = NUM_CARDS / NUM_VALUES;
                for attr in attrs.iter_mut() {
                    *attr = (id / place) % NUM_VALUES;
                    place /= NUM_VALUES;
                }
                Ok(Card::Dealt(attrs))
            }
            _ => Err(CardError::InvalidCard(id)),
        }
    }

    /// None for the empty card, which has no encoding of its own.
    pub fn id(&self) -> Option<u8> {
        match self {
            Card::Empty => None,
            Card::Dealt(attrs) => Some(
                attrs
                    .iter()
                    .fold(0, |acc, &attr| acc * NUM_VALUES + attr),
            ),
        }
    }

    pub fn attrs(&self) -> Option<&[u8; NUM_ATTRS]> {
        match self {
            Card::Empty => None,
            Card::Dealt(attrs) => Some(attrs),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Card::Empty)
    }
}

/// Every attribute all the same or all different.
/// The empty card never takes part in a set.
pub fn is_set(a: &Card, b: &Card, c: &Card) -> bool {
    let (Some(a), Some(b), Some(c)) = (a.attrs(), b.attrs(), c.attrs()) else {
        return false;
    };
    (0..NUM_ATTRS).all(|i| {
        let (x, y, z) = (a[i], b[i], c[i]);
        (x == y && y == z) || (x != y && y != z && x != z)
    })
}
