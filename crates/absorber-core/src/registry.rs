// ─────────────────────────────────────────────────────────────────────
// Absorber — Configuration Registry
// ─────────────────────────────────────────────────────────────────────
//! Mutable absorber configuration, written by the command surface in
//! the pre-init phase and read once by the geometry builder.
//!
//! Slot fields must arrive left to right. For slot `k` and one field:
//!
//! | field length | effect of a set call |
//! |--------------|----------------------|
//! | `< k-1`      | ignored, "Wrong order!" |
//! | `k-1`        | appended |
//! | `k`          | overwritten in place |
//! | `> k`        | ignored, "Wrong order!" |

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use absorber_types::{AbsorberConfig, AbsorberSlot, MAX_ABSORBERS};

/// Value for one field of an absorber slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotField {
    /// Thickness in internal length units (mm).
    Thickness(f64),
    Material(String),
}

impl SlotField {
    fn kind(&self) -> &'static str {
        match self {
            SlotField::Thickness(_) => "thickness",
            SlotField::Material(_) => "material",
        }
    }
}

/// Outcome of a slot setter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    Appended,
    Overwritten,
    Rejected,
}

/// Thread-safe holder of the absorber configuration record.
pub struct ConfigRegistry {
    config: RwLock<AbsorberConfig>,
    frozen: AtomicBool,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::with_config(AbsorberConfig::default())
    }

    /// Start from a pre-filled record (e.g. loaded from JSON).
    pub fn with_config(config: AbsorberConfig) -> Self {
        Self {
            config: RwLock::new(config),
            frozen: AtomicBool::new(false),
        }
    }

    fn refuse_if_frozen(&self, what: &str) -> bool {
        if self.is_frozen() {
            log::warn!("Warning: geometry already built, {what} ignored");
            return true;
        }
        false
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        if self.refuse_if_frozen("setAbsorber") {
            return false;
        }
        self.config.write().enabled = enabled;
        true
    }

    /// Set the number of absorbers to build.
    ///
    /// Any value is stored; a count outside `1..=4` cannot match the slot
    /// sequences, so the builder skips the whole stack.
    pub fn set_declared_count(&self, count: i32) -> bool {
        if self.refuse_if_frozen("setNbOfAbso") {
            return false;
        }
        if !(1..=MAX_ABSORBERS as i32).contains(&count) {
            log::warn!(
                "Warning: {count} absorber(s) requested, outside [1, {MAX_ABSORBERS}]; \
                 no absorber will be built"
            );
        }
        self.config.write().declared_count = Some(count);
        true
    }

    /// Ordered append-or-overwrite of one field of slot `index` (1-based).
    pub fn set_slot(&self, index: usize, field: SlotField) -> SlotWrite {
        if self.refuse_if_frozen("absorber slot update") {
            return SlotWrite::Rejected;
        }
        if !(1..=MAX_ABSORBERS).contains(&index) {
            log::warn!("Warning: absorber index must be in [1, {MAX_ABSORBERS}], got {index}");
            return SlotWrite::Rejected;
        }

        let mut config = self.config.write();
        let len = match field {
            SlotField::Thickness(_) => config.thickness_len(),
            SlotField::Material(_) => config.material_len(),
        };

        let outcome = if len + 1 == index {
            SlotWrite::Appended
        } else if len == index {
            SlotWrite::Overwritten
        } else {
            log::warn!("Warning: Wrong order!");
            return SlotWrite::Rejected;
        };

        if config.slots.len() < index {
            config.slots.push(AbsorberSlot::default());
        }
        log::debug!("absorber {index} {}: {outcome:?}", field.kind());
        let slot = &mut config.slots[index - 1];
        match field {
            SlotField::Thickness(t) => slot.thickness = Some(t),
            SlotField::Material(m) => slot.material = Some(m),
        }
        outcome
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> AbsorberConfig {
        self.config.read().clone()
    }

    /// Stop accepting mutation and return the final record.
    pub fn freeze(&self) -> AbsorberConfig {
        self.frozen.store(true, Ordering::SeqCst);
        self.snapshot()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }
}
