//! Partial masking of field values
//!
//! Lengths are measured in characters, so the masked output always has the
//! same character count as its input.

use crate::constants::{PHONE_MAX_DIGITS, PHONE_MIN_DIGITS, PHONE_SEPARATORS};

/// Masks values while leaving a small recognisable part visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskStrategy {
    mask_char: char,
    visible_chars: usize,
}

impl MaskStrategy {
    pub fn new(mask_char: char, visible_chars: usize) -> Self {
        Self {
            mask_char,
            visible_chars,
        }
    }

    pub fn mask_char(&self) -> char {
        self.mask_char
    }

    pub fn visible_chars(&self) -> usize {
        self.visible_chars
    }

    /// Mask a value
    ///
    /// Emails keep the first two characters of the local part and the final
    /// domain extension. Phone numbers keep their last `visible_chars` digits
    /// and every separator. Anything else keeps a short prefix.
    pub fn apply(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }

        let length = value.chars().count();
        if length <= self.visible_chars {
            return self.repeat(length);
        }
        if value.contains('@') {
            return self.mask_email(value);
        }
        if is_phone_number(value) {
            return self.mask_phone(value);
        }
        self.mask_default(value)
    }

    fn mask_email(&self, email: &str) -> String {
        let at_index = match email.find('@') {
            Some(index) if index > 0 => index,
            _ => return self.mask_default(email),
        };
        let local_part = &email[..at_index];
        let domain_part = &email[at_index + 1..];

        let local_length = local_part.chars().count();
        let masked_local = if local_length > 2 {
            let visible: String = local_part.chars().take(2).collect();
            format!("{}{}", visible, self.repeat(local_length - 2))
        } else {
            self.repeat(local_length)
        };

        let masked_domain = match domain_part.rfind('.') {
            Some(dot_index) if dot_index > 0 => {
                let hidden = domain_part[..dot_index].chars().count();
                format!("{}{}", self.repeat(hidden), &domain_part[dot_index..])
            }
            _ => self.repeat(domain_part.chars().count()),
        };

        format!("{}@{}", masked_local, masked_domain)
    }

    fn mask_phone(&self, phone: &str) -> String {
        let total_digits = phone.chars().filter(char::is_ascii_digit).count();
        let show_last = self.visible_chars.min(total_digits);
        let hidden_digits = total_digits - show_last;

        let mut digit_count = 0;
        phone
            .chars()
            .map(|c| {
                if c.is_ascii_digit() {
                    digit_count += 1;
                    if digit_count <= hidden_digits {
                        self.mask_char
                    } else {
                        c
                    }
                } else {
                    c
                }
            })
            .collect()
    }

    fn mask_default(&self, value: &str) -> String {
        let length = value.chars().count();
        let show = self.visible_chars.min(length / 2);
        let visible: String = value.chars().take(show).collect();
        format!("{}{}", visible, self.repeat(length - show))
    }

    fn repeat(&self, count: usize) -> String {
        std::iter::repeat_n(self.mask_char, count).collect()
    }
}

/// Whether a value is 7-15 digits once common separators are removed
pub fn is_phone_number(value: &str) -> bool {
    let mut digits = 0;
    for c in value.chars() {
        if PHONE_SEPARATORS.contains(&c) {
            continue;
        }
        if !c.is_ascii_digit() {
            return false;
        }
        digits += 1;
    }
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}
