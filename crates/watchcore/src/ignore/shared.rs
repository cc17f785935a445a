//! Build-then-publish handle for an [`IgnoreSet`].
//!
//! Readers take an `Arc` snapshot and classify against it without holding
//! any lock. Reconfiguration builds a complete replacement set off to the
//! side and swaps it in, so a reader only ever sees a fully built trie.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::set::IgnoreSet;

#[derive(Debug, Default)]
pub struct SharedIgnoreSet {
    current: RwLock<Arc<IgnoreSet>>,
    generation: AtomicU64,
}

impl SharedIgnoreSet {
    pub fn new(set: IgnoreSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the currently published set.
    pub fn load(&self) -> Arc<IgnoreSet> {
        self.current.read().clone()
    }

    /// Returns the currently published set along with its generation.
    pub fn load_with_generation(&self) -> (Arc<IgnoreSet>, u64) {
        let current = self.current.read();
        (current.clone(), self.generation.load(Ordering::Acquire))
    }

    /// Replaces the published set and returns the new generation number.
    ///
    /// The generation is bumped while the write lock is held, so the
    /// highest generation always names the set that is actually current.
    pub fn publish(&self, set: IgnoreSet) -> u64 {
        let roots = set.len();
        let next = Arc::new(set);
        let generation = {
            let mut current = self.current.write();
            *current = next;
            self.generation.fetch_add(1, Ordering::AcqRel) + 1
        };
        log::info!("published ignore set generation {generation} ({roots} roots)");
        generation
    }

    /// Number of times a set has been published since construction.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Classifies `path` against the current set.
    pub fn is_ignored(&self, path: impl AsRef<[u8]>) -> bool {
        self.load().is_ignored(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn set_with(dirs: &[&str]) -> IgnoreSet {
        let mut set = IgnoreSet::new();
        for dir in dirs {
            set.add(dir, false);
        }
        set
    }

    #[test]
    fn publish_swaps_whole_set() {
        let shared = SharedIgnoreSet::new(set_with(&["build"]));
        assert!(shared.is_ignored("build/x"));
        assert!(!shared.is_ignored("out/x"));

        let snapshot = shared.load();
        assert_eq!(shared.publish(set_with(&["out"])), 1);
        assert!(!shared.is_ignored("build/x"));
        assert!(shared.is_ignored("out/x"));

        // Snapshots taken before a publish keep their answers.
        assert!(snapshot.is_ignored("build/x"));
        assert_eq!(shared.generation(), 1);
    }

    #[test]
    fn readers_only_see_complete_sets() {
        let shared = Arc::new(SharedIgnoreSet::new(set_with(&["a", "b"])));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let set = shared.load();
                        // Every published set ignores both or neither.
                        assert_eq!(set.is_ignored("a/x"), set.is_ignored("b/x"));
                    }
                })
            })
            .collect();

        for round in 0..50 {
            if round % 2 == 0 {
                shared.publish(set_with(&["c"]));
            } else {
                shared.publish(set_with(&["a", "b"]));
            }
        }

        for reader in readers {
            reader.join().expect("reader thread");
        }
        assert_eq!(shared.generation(), 50);
    }

    #[test]
    fn latest_generation_names_the_current_set() {
        let shared = Arc::new(SharedIgnoreSet::new(IgnoreSet::new()));

        let publishers: Vec<_> = (0..4)
            .map(|writer| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    (0..200)
                        .map(|round| {
                            let marker = format!("w{writer}r{round}");
                            let generation = shared.publish(set_with(&[marker.as_str()]));
                            (generation, marker)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut published: Vec<(u64, String)> = publishers
            .into_iter()
            .flat_map(|publisher| publisher.join().expect("publisher thread"))
            .collect();
        published.sort();

        let generations: Vec<u64> = published.iter().map(|(generation, _)| *generation).collect();
        assert_eq!(generations, (1..=800).collect::<Vec<u64>>());

        let (set, generation) = shared.load_with_generation();
        assert_eq!(generation, 800);
        let (_, last_marker) = published.last().expect("at least one publish");
        assert!(set.is_ignored(format!("{last_marker}/x")));
    }
}
