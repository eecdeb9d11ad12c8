//! # Identifiers
//!
//! Pages, sections and elements are addressed by opaque string ids.
//! Fresh ids come from an [`IdGenerator`] seeded from the editor session id,
//! so ids minted by two sessions editing different documents never collide
//! and ids minted by one session are reproducible in tests.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a [`Page`](crate::Page)
    PageId
);
string_id!(
    /// Identifier of a [`Section`](crate::Section)
    SectionId
);
string_id!(
    /// Identifier of an [`Element`](crate::Element)
    ElementId
);

/// Generate a stable seed from an editor session id using CRC32
pub fn session_seed(session_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(session_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for pages, sections and elements
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(session_id: &str) -> Self {
        Self {
            seed: session_seed(session_id),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn page_id(&mut self) -> PageId {
        PageId(self.next("page"))
    }

    pub fn section_id(&mut self) -> SectionId {
        SectionId(self.next("section"))
    }

    pub fn element_id(&mut self) -> ElementId {
        ElementId(self.next("el"))
    }

    /// Skip past a counter already present in a loaded id.
    ///
    /// Ids from other seeds (or hand-written ids) are ignored.
    pub fn observe(&mut self, id: &str) {
        let Some(rest) = id.split_once('-').map(|(_, rest)| rest) else {
            return;
        };
        let Some((seed, count)) = rest.rsplit_once('-') else {
            return;
        };
        if seed != self.seed {
            return;
        }
        if let Ok(count) = count.parse::<u64>() {
            self.count = self.count.max(count);
        }
    }

    fn next(&mut self, prefix: &str) -> String {
        self.count += 1;
        format!("{}-{}-{}", prefix, self.seed, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_seed_is_stable() {
        assert_eq!(session_seed("tab-1"), session_seed("tab-1"));
        assert_ne!(session_seed("tab-1"), session_seed("tab-2"));
    }

    #[test]
    fn test_sequential_ids_share_counter() {
        let mut ids = IdGenerator::new("tab-1");
        let seed = ids.seed().to_string();

        let el = ids.element_id();
        let section = ids.section_id();
        let page = ids.page_id();

        assert_eq!(el.as_str(), format!("el-{}-1", seed));
        assert_eq!(section.as_str(), format!("section-{}-2", seed));
        assert_eq!(page.as_str(), format!("page-{}-3", seed));
    }

    #[test]
    fn test_observe_skips_loaded_counters() {
        let mut ids = IdGenerator::from_seed("abc");
        ids.observe("el-abc-41");
        ids.observe("section-other-900");
        ids.observe("home");

        assert_eq!(ids.element_id().as_str(), "el-abc-42");
    }
}
