//! Tunables for the radius delete tool.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::filters::DeleteFilters;

/// Tool configuration.
///
/// Every field has a default; a partial serialized config only overrides
/// what it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteConfig {
    /// Brush radius a fresh tool starts with.
    pub default_radius: f32,
    /// Smallest radius `set_radius` accepts.
    pub min_radius: f32,
    /// Largest radius `set_radius` accepts.
    pub max_radius: f32,
    /// How far below the query surface an entity may sit and still be
    /// eligible. Protects subways and other buried infrastructure.
    pub depth_offset: f32,
    /// Bound on ownership-parent hops when resolving roots.
    pub max_owner_hops: usize,
    /// Filter mask a fresh tool starts with.
    pub default_filters: DeleteFilters,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            default_radius: 20.0,
            min_radius: 5.0,
            max_radius: 500.0,
            depth_offset: 20.0,
            max_owner_hops: 10,
            default_filters: DeleteFilters::all(),
        }
    }
}

impl DeleteConfig {
    /// Defaults overlaid with `RADIUS_DELETE_*` environment variables.
    ///
    /// Unparsable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns per variable name.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            let raw = lookup(key)?;
            let value = raw.trim().parse().ok();
            if value.is_none() {
                warn!(key, raw = %raw, "ignoring unparsable config value");
            }
            value
        }

        let mut config = Self::default();
        if let Some(v) = parsed(&lookup, "RADIUS_DELETE_DEFAULT_RADIUS") {
            config.default_radius = v;
        }
        if let Some(v) = parsed(&lookup, "RADIUS_DELETE_MIN_RADIUS") {
            config.min_radius = v;
        }
        if let Some(v) = parsed(&lookup, "RADIUS_DELETE_MAX_RADIUS") {
            config.max_radius = v;
        }
        if let Some(v) = parsed(&lookup, "RADIUS_DELETE_DEPTH_OFFSET") {
            config.depth_offset = v;
        }
        if let Some(v) = parsed(&lookup, "RADIUS_DELETE_MAX_OWNER_HOPS") {
            config.max_owner_hops = v;
        }
        if let Some(v) = parsed::<u32>(&lookup, "RADIUS_DELETE_FILTERS") {
            config.default_filters = DeleteFilters::from_bits_truncate(v);
        }
        config.normalized()
    }

    /// Repair values no invocation could work with.
    ///
    /// Non-finite or non-positive bounds fall back to defaults, an inverted
    /// range is swapped, and the default radius is clamped into the range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();

        if !self.min_radius.is_finite() || self.min_radius <= 0.0 {
            self.min_radius = defaults.min_radius;
        }
        if !self.max_radius.is_finite() || self.max_radius <= 0.0 {
            self.max_radius = defaults.max_radius;
        }
        if self.min_radius > self.max_radius {
            std::mem::swap(&mut self.min_radius, &mut self.max_radius);
        }
        if !self.depth_offset.is_finite() || self.depth_offset < 0.0 {
            self.depth_offset = defaults.depth_offset;
        }
        if self.max_owner_hops == 0 {
            self.max_owner_hops = defaults.max_owner_hops;
        }
        self.default_radius = self.clamp_radius(self.default_radius);
        self
    }

    /// Coerce a requested radius into `[min_radius, max_radius]`.
    ///
    /// NaN maps to the default radius.
    #[must_use]
    pub fn clamp_radius(&self, radius: f32) -> f32 {
        let radius = if radius.is_nan() { self.default_radius } else { radius };
        if radius.is_nan() {
            return self.min_radius;
        }
        radius.clamp(self.min_radius, self.max_radius)
    }
}
