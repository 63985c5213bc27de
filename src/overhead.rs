//! The kernel overhead catalogue.

/// The eight scalar kernel timing overheads plus the tick rate, read once from
/// the input file and passed by value to the [`crate::simulator::Simulator`].
///
/// The reference implementation holds these as module-level globals mutated by
/// `set_system_settings`; here they are an explicit, immutable value, avoiding
/// shared mutable state across runs within the same process (see Design Notes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverheadTable {
    pub tick_rate: f64,
    pub save: f64,
    pub load: f64,
    pub decrement_timer: f64,
    pub restart_timer: f64,
    pub resume: f64,
    pub add_ready: f64,
    pub get_hpt: f64,
}

impl OverheadTable {
    pub fn zero(tick_rate: f64) -> Self {
        OverheadTable {
            tick_rate,
            save: 0.0,
            load: 0.0,
            decrement_timer: 0.0,
            restart_timer: 0.0,
            resume: 0.0,
            add_ready: 0.0,
            get_hpt: 0.0,
        }
    }
}
