//! Application constants for the CSV sanitizer
//!
//! This module contains configuration defaults, preview limits and the
//! vocabulary used by the synthetic value generator.

// =============================================================================
// Pipeline Defaults
// =============================================================================

/// Default number of records read, sanitized and written per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of tolerated read/process/write failures per run
pub const DEFAULT_SKIP_LIMIT: u64 = 100;

/// Log a progress line every this many rows (plus every chunk below 1000 rows)
pub const PROGRESS_LOG_INTERVAL_ROWS: u64 = 10_000;

/// Maximum number of failure messages retained on a run report
pub const MAX_RETAINED_FAILURE_MESSAGES: usize = 50;

/// Byte order mark some editors put before the header row
pub const UTF8_BOM: char = '\u{feff}';

// =============================================================================
// Strategy Defaults
// =============================================================================

/// Character used to replace masked characters
pub const DEFAULT_MASK_CHAR: char = '*';

/// Number of characters (or trailing phone digits) left visible by masking
pub const DEFAULT_MASK_VISIBLE_CHARS: usize = 4;

/// Replacement emitted by the nullify strategy
pub const DEFAULT_NULL_REPLACEMENT: &str = "";

/// Characters stripped before testing whether a value looks like a phone number
pub const PHONE_SEPARATORS: &[char] = &[' ', '\t', '\n', '\r', '-', '(', ')', '.', '+'];

/// Minimum digits in a phone-like value
pub const PHONE_MIN_DIGITS: usize = 7;

/// Maximum digits in a phone-like value
pub const PHONE_MAX_DIGITS: usize = 15;

/// Case-insensitive markers that identify street addresses
pub const ADDRESS_MARKERS: &[&str] = &[
    "street", "st.", "ave", "road", "rd.", "lane", "blvd", "drive", "dr.", "#",
];

// =============================================================================
// Preview / Diff Limits
// =============================================================================

/// Default number of preview rows when none is requested
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Hard cap on preview rows
pub const MAX_PREVIEW_ROWS: usize = 100;

/// Default number of compared rows when none is requested
pub const DEFAULT_DIFF_ROWS: usize = 20;

/// Hard cap on compared rows
pub const MAX_DIFF_ROWS: usize = 50;

// =============================================================================
// Synthetic Data Vocabulary
// =============================================================================

/// Vocabulary for generated replacement values
pub mod vocabulary {
    pub const FIRST_NAMES: &[&str] = &[
        "Alice", "Benjamin", "Chloe", "Daniel", "Eleanor", "Felix", "Grace", "Henry", "Isla",
        "Jack", "Katherine", "Liam", "Maya", "Noah", "Olivia", "Patrick", "Quinn", "Rosa",
        "Samuel", "Tessa", "Umar", "Violet", "William", "Ximena", "Yusuf", "Zoe",
    ];

    pub const LAST_NAMES: &[&str] = &[
        "Anderson", "Brooks", "Carter", "Dalton", "Ellis", "Fischer", "Garcia", "Hughes",
        "Ibrahim", "Jensen", "Kowalski", "Lambert", "Morales", "Nakamura", "Owens", "Patel",
        "Quincy", "Reyes", "Sullivan", "Turner", "Underwood", "Vargas", "Whitaker", "Young",
    ];

    pub const EMAIL_DOMAINS: &[&str] = &[
        "example.com", "example.org", "example.net", "mail.test", "inbox.test",
    ];

    pub const STREET_NAMES: &[&str] = &[
        "Maple", "Oak", "Cedar", "Willow", "Highland", "Lakeview", "Sunset", "Harbor",
        "Meadow", "Ridge", "Orchard", "River", "Park", "Elm", "Chestnut", "Spring",
    ];

    pub const STREET_SUFFIXES: &[&str] = &[
        "Street", "Avenue", "Road", "Lane", "Boulevard", "Drive", "Court", "Way",
    ];

    pub const LOREM_WORDS: &[&str] = &[
        "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed",
        "do", "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna",
        "aliqua", "enim", "ad", "minim", "veniam", "quis", "nostrud", "exercitation",
        "ullamco", "laboris", "nisi", "aliquip", "ex", "ea", "commodo", "consequat",
    ];
}
