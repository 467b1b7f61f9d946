//! Label-driven field assembly.
//!
//! A card's info box is one of a few known layouts, told apart by its
//! section labels. This module picks the layout and assembles the ability
//! and attack fields from the entry texts, independent of HTML parsing.

use crate::models::LabelVocabulary;

/// Separator between multiple attack names.
pub const ATTACK_SEPARATOR: &str = "/";

/// Info box layouts recognised by their section labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardLayout {
    /// First label is "Ability": one ability entry, then attacks.
    Ability,
    /// First label is "Move": attacks only.
    Move,
    /// "Move" followed by "VSTAR Power": attacks, then one VSTAR entry that
    /// is itself either a move or an ability.
    MoveWithVstarPower,
    /// No known first label; both fields stay empty.
    Unrecognized,
}

/// Ability and attack text for one card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub ability: String,
    pub attack: String,
}

impl CardLayout {
    /// Pick the layout from the section labels, in document order.
    pub fn classify<S: AsRef<str>>(labels: &[S], vocab: &LabelVocabulary) -> Self {
        let first = labels.first().map(|s| s.as_ref());
        let second = labels.get(1).map(|s| s.as_ref());

        match (first, second) {
            (Some(l), _) if l == vocab.ability => Self::Ability,
            (Some(l), Some(v)) if l == vocab.move_ && v == vocab.vstar_power => {
                Self::MoveWithVstarPower
            }
            (Some(l), _) if l == vocab.move_ => Self::Move,
            _ => Self::Unrecognized,
        }
    }

    /// Assemble ability and attack text from the entry texts.
    pub fn assemble<S: AsRef<str>>(&self, entries: &[S], vocab: &LabelVocabulary) -> CardFields {
        match self {
            Self::Ability => match entries.split_first() {
                Some((ability, attacks)) => CardFields {
                    ability: ability.as_ref().to_string(),
                    attack: join_attacks(attacks),
                },
                None => CardFields::default(),
            },
            Self::Move => CardFields {
                ability: String::new(),
                attack: join_attacks(entries),
            },
            Self::MoveWithVstarPower => walk_vstar_entries(entries, vocab),
            Self::Unrecognized => CardFields::default(),
        }
    }
}

fn join_attacks<S: AsRef<str>>(entries: &[S]) -> String {
    entries
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(ATTACK_SEPARATOR)
}

/// Walk a "Move + VSTAR Power" box.
///
/// Regular moves accumulate into the attack field. The VSTAR sub-section is
/// introduced by an entry whose text is itself a label token: the entry
/// after a "Move" token is one more attack, the entry after an "Ability"
/// token is the ability. Either ends the walk.
fn walk_vstar_entries<S: AsRef<str>>(entries: &[S], vocab: &LabelVocabulary) -> CardFields {
    let mut fields = CardFields::default();
    let text = |i: usize| entries.get(i).map(|s| s.as_ref());

    for (index, entry) in entries.iter().map(|s| s.as_ref()).enumerate() {
        let next = text(index + 1);

        if entry == vocab.move_ {
            fields.attack.push_str(next.unwrap_or_default());
            break;
        }
        if entry == vocab.ability {
            fields.ability.push_str(next.unwrap_or_default());
            break;
        }

        fields.attack.push_str(entry);
        if next == Some(vocab.move_.as_str()) {
            fields.attack.push_str(ATTACK_SEPARATOR);
        }
    }

    fields
}
