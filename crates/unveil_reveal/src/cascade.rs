//! Sequenced reveal delays
//!
//! Items of a list reveal one after another: each item's start is pushed back
//! by its position times the cascade step, up to an optional cap.
//!
//! ```rust
//! use unveil_reveal::{cascade_delays, CascadeConfig};
//!
//! let cascade = CascadeConfig::new(100, Some(250)).unwrap();
//! assert_eq!(cascade_delays(4, &cascade), vec![0, 100, 200, 250]);
//! ```

use crate::config::{CascadeConfig, StaggerDirection};

/// Reveal delay (ms) for item `index` of a list of `total` items
pub fn cascade_delay(index: usize, total: usize, cascade: &CascadeConfig) -> u32 {
    let effective_index = match cascade.stagger_direction() {
        StaggerDirection::Forward => index,
        StaggerDirection::Reverse => total.saturating_sub(1).saturating_sub(index),
        StaggerDirection::FromCenter => {
            let center = total / 2;
            if index <= center {
                center - index
            } else {
                index - center
            }
        }
    };

    let index = u32::try_from(effective_index).unwrap_or(u32::MAX);
    let stagger = cascade.step_ms().saturating_mul(index);
    let stagger = match cascade.max_delay_ms() {
        Some(max) => stagger.min(max),
        None => stagger,
    };

    cascade.base_delay_ms().saturating_add(stagger)
}

/// Reveal delays for every item of a list of `total` items
pub fn cascade_delays(total: usize, cascade: &CascadeConfig) -> Vec<u32> {
    (0..total)
        .map(|index| cascade_delay(index, total, cascade))
        .collect()
}
