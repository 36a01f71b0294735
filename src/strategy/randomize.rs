//! Deterministic synthetic replacement values
//!
//! Each value seeds its own generator from a SHA-256 of its bytes, so the
//! same input always maps to the same synthetic output across runs and
//! processes, while distinct inputs almost never collide.

use crate::constants::vocabulary::{
    EMAIL_DOMAINS, FIRST_NAMES, LAST_NAMES, LOREM_WORDS, STREET_NAMES, STREET_SUFFIXES,
};
use crate::constants::ADDRESS_MARKERS;
use crate::strategy::mask::is_phone_number;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Shape categories recognised for synthetic replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Email,
    Phone,
    Name,
    Address,
    Numeric,
    Text,
}

impl ValueShape {
    /// Classify a value; categories overlap, so the first match wins in the
    /// order email, phone, name, address, numeric, text
    pub fn classify(value: &str) -> Self {
        if is_email(value) {
            ValueShape::Email
        } else if is_phone_number(value) {
            ValueShape::Phone
        } else if is_name(value) {
            ValueShape::Name
        } else if is_address(value) {
            ValueShape::Address
        } else if is_numeric(value) {
            ValueShape::Numeric
        } else {
            ValueShape::Text
        }
    }
}

/// Replaces values with seeded synthetic values of the same shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomizeStrategy;

impl RandomizeStrategy {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }

        let mut rng = StdRng::seed_from_u64(stable_seed(value));
        match ValueShape::classify(value) {
            ValueShape::Email => fake_email(&mut rng),
            ValueShape::Phone => fake_phone(&mut rng),
            ValueShape::Name => fake_full_name(&mut rng),
            ValueShape::Address => fake_street_address(&mut rng),
            ValueShape::Numeric => rng.gen_range(1000..10000).to_string(),
            ValueShape::Text => {
                let word_count = value.split_whitespace().count().max(1);
                fake_words(&mut rng, word_count)
            }
        }
    }
}

/// Seed derived from the value's bytes, stable across processes
fn stable_seed(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(seed)
}

fn pick<'a>(rng: &mut StdRng, words: &[&'a str]) -> &'a str {
    words[rng.gen_range(0..words.len())]
}

fn fake_email(rng: &mut StdRng) -> String {
    let first = pick(rng, FIRST_NAMES).to_ascii_lowercase();
    let last = pick(rng, LAST_NAMES).to_ascii_lowercase();
    let suffix: u16 = rng.gen_range(1..100);
    let domain = pick(rng, EMAIL_DOMAINS);
    format!("{}.{}{}@{}", first, last, suffix, domain)
}

fn fake_phone(rng: &mut StdRng) -> String {
    let area: u16 = rng.gen_range(200..1000);
    let exchange: u16 = rng.gen_range(200..1000);
    let line: u16 = rng.gen_range(0..10000);
    format!("{}-{}-{:04}", area, exchange, line)
}

fn fake_full_name(rng: &mut StdRng) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}

fn fake_street_address(rng: &mut StdRng) -> String {
    let number: u32 = rng.gen_range(1..10000);
    format!(
        "{} {} {}",
        number,
        pick(rng, STREET_NAMES),
        pick(rng, STREET_SUFFIXES)
    )
}

fn fake_words(rng: &mut StdRng, count: usize) -> String {
    (0..count)
        .map(|_| pick(rng, LOREM_WORDS))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_email(value: &str) -> bool {
    value.contains('@') && value.contains('.')
}

/// Letters, whitespace, `.`, `'` and `-` only; one to four words, each
/// starting with something other than a lowercase letter
fn is_name(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, '.' | '\'' | '-'));
    if !allowed {
        return false;
    }

    let words: Vec<&str> = value.split_whitespace().collect();
    if words.is_empty() || words.len() > 4 {
        return false;
    }
    words
        .iter()
        .all(|word| !word.starts_with(|c: char| c.is_lowercase()))
}

fn is_address(value: &str) -> bool {
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = value.to_lowercase();
    ADDRESS_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// `-?\d+(\.\d+)?`
fn is_numeric(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    all_digits(integer) && fraction.is_none_or(all_digits)
}
