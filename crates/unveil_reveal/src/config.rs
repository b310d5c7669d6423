//! Reveal configuration
//!
//! [`RevealConfig`] is validated once, when it is built, so everything
//! downstream can rely on a threshold in `[0, 1]` and non-negative delays.
//!
//! Configs can be built in code:
//!
//! ```rust
//! use unveil_reveal::RevealConfig;
//!
//! let stats = RevealConfig::builder()
//!     .threshold(0.3)
//!     .cascade_step_ms(100)
//!     .build()
//!     .unwrap();
//! assert_eq!(stats.threshold(), 0.3);
//!
//! assert!(RevealConfig::builder().threshold(1.5).build().is_err());
//! ```
//!
//! or deserialized from a table whose fields are all optional
//! ([`RevealConfigSpec`]), with unset fields taking the defaults.

use serde::{Deserialize, Serialize};
use unveil_animation::EntranceTransition;
use unveil_core::{ElementRef, RootMargin};

use crate::error::{delay_ms, ConfigError};
use crate::observer::ObserverKey;

/// Default intersection threshold
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Default stagger between list items (ms)
pub const DEFAULT_CASCADE_STEP_MS: u32 = 100;

/// Order in which list items are staggered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaggerDirection {
    /// First item first
    #[default]
    Forward,
    /// Last item first
    Reverse,
    /// Middle item first, spreading outward
    FromCenter,
}

/// How reveal delays are spread across the items of a list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadeConfig {
    step_ms: u32,
    max_delay_ms: Option<u32>,
    base_delay_ms: u32,
    direction: StaggerDirection,
}

impl CascadeConfig {
    /// No stagger: every item reveals as soon as it is visible
    pub const NONE: CascadeConfig = CascadeConfig {
        step_ms: 0,
        max_delay_ms: None,
        base_delay_ms: 0,
        direction: StaggerDirection::Forward,
    };

    /// Stagger items `step_ms` apart, optionally capping the per-item delay
    pub fn new(step_ms: i64, max_delay_ms: Option<i64>) -> Result<Self, ConfigError> {
        Ok(Self {
            step_ms: delay_ms("cascade_step_ms", step_ms)?,
            max_delay_ms: max_delay_ms
                .map(|max| delay_ms("cascade_max_ms", max))
                .transpose()?,
            base_delay_ms: 0,
            direction: StaggerDirection::Forward,
        })
    }

    /// Fixed delay added before every item's stagger
    pub fn base_delay(mut self, base_delay_ms: u32) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn direction(mut self, direction: StaggerDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn step_ms(&self) -> u32 {
        self.step_ms
    }

    pub fn max_delay_ms(&self) -> Option<u32> {
        self.max_delay_ms
    }

    pub fn base_delay_ms(&self) -> u32 {
        self.base_delay_ms
    }

    pub fn stagger_direction(&self) -> StaggerDirection {
        self.direction
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            step_ms: DEFAULT_CASCADE_STEP_MS,
            ..Self::NONE
        }
    }
}

/// Validated configuration for one revealed element
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RevealConfigSpec", into = "RevealConfigSpec")]
pub struct RevealConfig {
    threshold: f32,
    trigger_once: bool,
    root_margin: RootMargin,
    root: Option<ElementRef>,
    cascade: CascadeConfig,
    transition: EntranceTransition,
}

impl RevealConfig {
    pub fn builder() -> RevealConfigBuilder {
        RevealConfigBuilder::default()
    }

    /// Fraction of the element that must be inside the root to count as visible
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Whether a revealed element stays revealed after leaving the viewport
    pub fn trigger_once(&self) -> bool {
        self.trigger_once
    }

    pub fn root_margin(&self) -> RootMargin {
        self.root_margin
    }

    /// Intersection root, or `None` for the viewport
    pub fn root(&self) -> Option<ElementRef> {
        self.root
    }

    pub fn cascade(&self) -> &CascadeConfig {
        &self.cascade
    }

    pub fn transition(&self) -> &EntranceTransition {
        &self.transition
    }

    /// Elements whose configs share this key share one observer
    pub fn observer_key(&self) -> ObserverKey {
        ObserverKey::new(self.threshold, self.root_margin, self.root)
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            trigger_once: true,
            root_margin: RootMargin::ZERO,
            root: None,
            cascade: CascadeConfig::default(),
            transition: EntranceTransition::default(),
        }
    }
}

/// Builder for [`RevealConfig`]
///
/// Setters take raw values and never fail; [`build`](Self::build) validates
/// them all at once.
#[derive(Clone, Debug)]
pub struct RevealConfigBuilder {
    threshold: f32,
    trigger_once: bool,
    root_margin: MarginInput,
    root: Option<ElementRef>,
    cascade_step_ms: i64,
    cascade_max_ms: Option<i64>,
    base_delay_ms: i64,
    stagger: StaggerDirection,
    transition: EntranceTransition,
}

#[derive(Clone, Debug)]
enum MarginInput {
    Parsed(RootMargin),
    Text(String),
}

impl Default for RevealConfigBuilder {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            trigger_once: true,
            root_margin: MarginInput::Parsed(RootMargin::ZERO),
            root: None,
            cascade_step_ms: DEFAULT_CASCADE_STEP_MS as i64,
            cascade_max_ms: None,
            base_delay_ms: 0,
            stagger: StaggerDirection::Forward,
            transition: EntranceTransition::default(),
        }
    }
}

impl RevealConfigBuilder {
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn trigger_once(mut self, trigger_once: bool) -> Self {
        self.trigger_once = trigger_once;
        self
    }

    /// Root margin in CSS shorthand, e.g. `"0px 0px -10% 0px"`
    pub fn root_margin(mut self, margin: impl Into<String>) -> Self {
        self.root_margin = MarginInput::Text(margin.into());
        self
    }

    pub fn root_margin_value(mut self, margin: RootMargin) -> Self {
        self.root_margin = MarginInput::Parsed(margin);
        self
    }

    /// Measure intersection against this element instead of the viewport
    pub fn root(mut self, root: ElementRef) -> Self {
        self.root = Some(root);
        self
    }

    pub fn cascade_step_ms(mut self, step_ms: i64) -> Self {
        self.cascade_step_ms = step_ms;
        self
    }

    pub fn cascade_max_ms(mut self, max_ms: i64) -> Self {
        self.cascade_max_ms = Some(max_ms);
        self
    }

    pub fn base_delay_ms(mut self, delay_ms: i64) -> Self {
        self.base_delay_ms = delay_ms;
        self
    }

    pub fn stagger(mut self, direction: StaggerDirection) -> Self {
        self.stagger = direction;
        self
    }

    pub fn transition(mut self, transition: EntranceTransition) -> Self {
        self.transition = transition;
        self
    }

    pub fn build(self) -> Result<RevealConfig, ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }

        let root_margin = match self.root_margin {
            MarginInput::Parsed(margin) => margin,
            MarginInput::Text(text) => text.parse()?,
        };
        if !root_margin.is_finite() {
            return Err(ConfigError::NonFiniteMargin(root_margin));
        }

        let cascade = CascadeConfig::new(self.cascade_step_ms, self.cascade_max_ms)?
            .base_delay(delay_ms("base_delay_ms", self.base_delay_ms)?)
            .direction(self.stagger);

        Ok(RevealConfig {
            // -0.0 and 0.0 must land on the same observer
            threshold: self.threshold + 0.0,
            trigger_once: self.trigger_once,
            root_margin,
            root: self.root,
            cascade,
            transition: self.transition,
        })
    }
}

/// Serialized form of a [`RevealConfig`], every field optional
///
/// Specs can be layered with [`overlay`](Self::overlay) (page defaults, then
/// a section's overrides) before being validated into a config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevealConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_once: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_margin: Option<String>,
    /// Raw [`ElementRef`] of the intersection root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cascade_step_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cascade_max_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger: Option<StaggerDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<EntranceTransition>,
}

impl RevealConfigSpec {
    /// Fields set in `other` win over fields set in `self`
    pub fn overlay(&self, other: &RevealConfigSpec) -> RevealConfigSpec {
        RevealConfigSpec {
            threshold: other.threshold.or(self.threshold),
            trigger_once: other.trigger_once.or(self.trigger_once),
            root_margin: other.root_margin.clone().or_else(|| self.root_margin.clone()),
            root: other.root.or(self.root),
            cascade_step_ms: other.cascade_step_ms.or(self.cascade_step_ms),
            cascade_max_ms: other.cascade_max_ms.or(self.cascade_max_ms),
            base_delay_ms: other.base_delay_ms.or(self.base_delay_ms),
            stagger: other.stagger.or(self.stagger),
            transition: other.transition.or(self.transition),
        }
    }

    pub fn build(&self) -> Result<RevealConfig, ConfigError> {
        let mut builder = RevealConfig::builder();
        if let Some(threshold) = self.threshold {
            builder = builder.threshold(threshold);
        }
        if let Some(trigger_once) = self.trigger_once {
            builder = builder.trigger_once(trigger_once);
        }
        if let Some(margin) = &self.root_margin {
            builder = builder.root_margin(margin.clone());
        }
        if let Some(root) = self.root {
            builder = builder.root(ElementRef::new(root));
        }
        if let Some(step) = self.cascade_step_ms {
            builder = builder.cascade_step_ms(step);
        }
        if let Some(max) = self.cascade_max_ms {
            builder = builder.cascade_max_ms(max);
        }
        if let Some(base) = self.base_delay_ms {
            builder = builder.base_delay_ms(base);
        }
        if let Some(stagger) = self.stagger {
            builder = builder.stagger(stagger);
        }
        if let Some(transition) = self.transition {
            builder = builder.transition(transition);
        }
        builder.build()
    }
}

impl TryFrom<RevealConfigSpec> for RevealConfig {
    type Error = ConfigError;

    fn try_from(spec: RevealConfigSpec) -> Result<Self, Self::Error> {
        spec.build()
    }
}

impl From<RevealConfig> for RevealConfigSpec {
    fn from(config: RevealConfig) -> Self {
        RevealConfigSpec {
            threshold: Some(config.threshold),
            trigger_once: Some(config.trigger_once),
            root_margin: Some(config.root_margin.to_string()),
            root: config.root.map(ElementRef::to_raw),
            cascade_step_ms: Some(config.cascade.step_ms as i64),
            cascade_max_ms: config.cascade.max_delay_ms.map(i64::from),
            base_delay_ms: Some(config.cascade.base_delay_ms as i64),
            stagger: Some(config.cascade.direction),
            transition: Some(config.transition),
        }
    }
}
