//! Set-name allocation
//!
//! Every request and set operation in a query owns a short name ("a", "b",
//! ..., "z", "aa", ...) used to reference its result set. The allocator
//! guarantees that two simultaneously-live names are never equal. One
//! allocator instance belongs to one query document; sharing an allocator
//! across documents would make independent queries contend for names.

use std::collections::BTreeSet;

/// Allocates and tracks unique short set names.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    next: String,
    in_use: BTreeSet<String>,
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameAllocator {
    /// Create an allocator with no live names, starting at "a".
    pub fn new() -> Self {
        Self {
            next: "a".to_string(),
            in_use: BTreeSet::new(),
        }
    }

    /// Produce the next unused name, register it and return it.
    ///
    /// Candidates advance through the base-26 odometer sequence; any
    /// candidate already reserved (e.g. loaded from a persisted query) is
    /// skipped. The returned name is never equal to a live name.
    pub fn allocate(&mut self) -> String {
        let mut candidate = self.next.clone();
        self.next = successor(&candidate);
        while self.in_use.contains(&candidate) {
            candidate = self.next.clone();
            self.next = successor(&candidate);
        }
        self.in_use.insert(candidate.clone());
        candidate
    }

    /// Mark an externally-chosen name as in use.
    ///
    /// Returns `true` if the name was newly reserved, `false` if it was
    /// already live. Reserving twice is not an error here; callers that
    /// require uniqueness (e.g. deserialization) treat `false` as a
    /// collision.
    pub fn reserve(&mut self, name: impl Into<String>) -> bool {
        self.in_use.insert(name.into())
    }

    /// Release a name back for future use. Idempotent.
    ///
    /// The generation cursor is not rewound: a released name is handed out
    /// again only when the odometer sequence naturally revisits it.
    pub fn release(&mut self, name: &str) {
        self.in_use.remove(name);
    }

    /// Whether a name is currently unused.
    pub fn is_available(&self, name: &str) -> bool {
        !self.in_use.contains(name)
    }

    /// Number of live names.
    pub fn live_count(&self) -> usize {
        self.in_use.len()
    }
}

/// Base-26 odometer increment over [a-z]: "a" -> "b", "z" -> "aa",
/// "az" -> "ba", "zz" -> "aaa".
fn successor(name: &str) -> String {
    let mut chars: Vec<char> = name.chars().collect();
    for ch in chars.iter_mut().rev() {
        if *ch == 'z' {
            *ch = 'a';
        } else {
            *ch = (*ch as u8 + 1) as char;
            return chars.into_iter().collect();
        }
    }
    // All characters were 'z'.
    chars.insert(0, 'a');
    chars.into_iter().collect()
}
