use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected during consolidation
#[derive(Default)]
pub struct BuildStats {
    pub settlements_built: AtomicU64,
    pub name_records: AtomicU64,
    pub subjects_skipped: AtomicU64,
    pub populations_attached: AtomicU64,
    pub populations_absent: AtomicU64,
    pub generated_renderings: AtomicU64,
}

impl BuildStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_settlements(&self) {
        self.settlements_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_name_records(&self, count: u64) {
        self.name_records.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_subjects_skipped(&self) {
        self.subjects_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_populations_attached(&self) {
        self.populations_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_populations_absent(&self) {
        self.populations_absent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generated(&self) {
        self.generated_renderings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn settlements(&self) -> u64 {
        self.settlements_built.load(Ordering::Relaxed)
    }

    pub fn names(&self) -> u64 {
        self.name_records.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.subjects_skipped.load(Ordering::Relaxed)
    }

    pub fn populations(&self) -> u64 {
        self.populations_attached.load(Ordering::Relaxed)
    }

    pub fn missing_populations(&self) -> u64 {
        self.populations_absent.load(Ordering::Relaxed)
    }

    pub fn generated(&self) -> u64 {
        self.generated_renderings.load(Ordering::Relaxed)
    }
}
