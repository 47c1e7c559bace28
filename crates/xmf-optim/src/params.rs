//! Named figure/pose parameters and their free/fixed selection.
//!
//! Every fit addresses the same nine parameters in a fixed order
//! (`p, q, theta, x_i, y_i, z_i, alpha, beta, gamma`). [`ParamMap`] is the
//! dense per-parameter "dictionary"; [`InputParams`] carries the caller's
//! starting values and [`FreeSpec`] decides which parameters move.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use anyhow::{anyhow, bail, ensure, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use xmf_core::{Generator, Pose, Real, SurfaceParams};

/// One of the nine fit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParamName {
    #[serde(rename = "p")]
    P,
    #[serde(rename = "q")]
    Q,
    #[serde(rename = "theta")]
    Theta,
    #[serde(rename = "x_i")]
    Xi,
    #[serde(rename = "y_i")]
    Yi,
    #[serde(rename = "z_i")]
    Zi,
    #[serde(rename = "alpha")]
    Alpha,
    #[serde(rename = "beta")]
    Beta,
    #[serde(rename = "gamma")]
    Gamma,
}

impl ParamName {
    /// Canonical parameter order.
    pub const ALL: [ParamName; 9] = [
        ParamName::P,
        ParamName::Q,
        ParamName::Theta,
        ParamName::Xi,
        ParamName::Yi,
        ParamName::Zi,
        ParamName::Alpha,
        ParamName::Beta,
        ParamName::Gamma,
    ];

    /// Position in [`ParamName::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::P => "p",
            ParamName::Q => "q",
            ParamName::Theta => "theta",
            ParamName::Xi => "x_i",
            ParamName::Yi => "y_i",
            ParamName::Zi => "z_i",
            ParamName::Alpha => "alpha",
            ParamName::Beta => "beta",
            ParamName::Gamma => "gamma",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ParamName::ALL
            .into_iter()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| anyhow!("unknown parameter name `{s}`"))
    }
}

/// Dense map from every [`ParamName`] to a `T`.
///
/// Serializes as a name-keyed map; deserialization requires all nine keys.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParamMap<T> {
    values: [T; 9],
}

impl<T> ParamMap<T> {
    pub fn from_fn(mut f: impl FnMut(ParamName) -> T) -> Self {
        Self {
            values: ParamName::ALL.map(&mut f),
        }
    }

    /// Values in canonical order.
    pub fn from_array(values: [T; 9]) -> Self {
        Self { values }
    }

    pub fn as_array(&self) -> &[T; 9] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamName, &T)> + '_ {
        ParamName::ALL.into_iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(ParamName, &T) -> U) -> ParamMap<U> {
        ParamMap::from_fn(|n| f(n, &self.values[n.index()]))
    }
}

impl ParamMap<Real> {
    pub fn surface(&self) -> SurfaceParams {
        SurfaceParams::new(self[ParamName::P], self[ParamName::Q], self[ParamName::Theta])
    }

    pub fn pose(&self) -> Pose {
        Pose {
            x_i: self[ParamName::Xi],
            y_i: self[ParamName::Yi],
            z_i: self[ParamName::Zi],
            alpha: self[ParamName::Alpha],
            beta: self[ParamName::Beta],
            gamma: self[ParamName::Gamma],
        }
    }
}

impl<T> Index<ParamName> for ParamMap<T> {
    type Output = T;

    fn index(&self, name: ParamName) -> &T {
        &self.values[name.index()]
    }
}

impl<T> IndexMut<ParamName> for ParamMap<T> {
    fn index_mut(&mut self, name: ParamName) -> &mut T {
        &mut self.values[name.index()]
    }
}

impl<T: Serialize> Serialize for ParamMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ParamMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = BTreeMap::<ParamName, T>::deserialize(deserializer)?;
        let mut values = Vec::with_capacity(9);
        for name in ParamName::ALL {
            let v = map
                .remove(&name)
                .ok_or_else(|| {
                    <D::Error as serde::de::Error>::custom(format!("missing parameter `{name}`"))
                })?;
            values.push(v);
        }
        let values: [T; 9] = values
            .try_into()
            .map_err(|_| <D::Error as serde::de::Error>::custom("expected nine parameters"))?;
        Ok(Self { values })
    }
}

/// Caller-supplied starting values.
///
/// `p`, `q` and `theta` are mandatory at fit time; the pose entries default
/// to the mean observed coordinate (`x_i`, `y_i`) or zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputParams {
    values: ParamMap<Option<Real>>,
}

impl InputParams {
    /// Start from the three figure parameters.
    pub fn new(p: Real, q: Real, theta: Real) -> Self {
        Self::default()
            .with(ParamName::P, p)
            .with(ParamName::Q, q)
            .with(ParamName::Theta, theta)
    }

    pub fn with(mut self, name: ParamName, value: Real) -> Self {
        self.values[name] = Some(value);
        self
    }

    pub fn with_pose(self, pose: &Pose) -> Self {
        self.with(ParamName::Xi, pose.x_i)
            .with(ParamName::Yi, pose.y_i)
            .with(ParamName::Zi, pose.z_i)
            .with(ParamName::Alpha, pose.alpha)
            .with(ParamName::Beta, pose.beta)
            .with(ParamName::Gamma, pose.gamma)
    }

    pub fn set(&mut self, name: ParamName, value: Real) {
        self.values[name] = Some(value);
    }

    pub fn get(&self, name: ParamName) -> Option<Real> {
        self.values[name]
    }

    /// Build from `(name, value)` pairs; names as in [`ParamName::as_str`].
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Real)>,
    {
        let mut out = Self::default();
        for (key, value) in pairs {
            let name: ParamName = key.parse()?;
            ensure!(
                out.values[name].is_none(),
                "parameter `{name}` given more than once"
            );
            out.values[name] = Some(value);
        }
        Ok(out)
    }
}

/// Search interval around a free parameter's start value, as signed offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tolerance {
    /// `[-|t|, |t|]`.
    Symmetric(Real),
    /// `[lower, upper]`.
    Interval { lower: Real, upper: Real },
}

impl Tolerance {
    /// Offsets `(lower, upper)`.
    pub fn offsets(self) -> (Real, Real) {
        match self {
            Tolerance::Symmetric(t) => (-t.abs(), t.abs()),
            Tolerance::Interval { lower, upper } => (lower, upper),
        }
    }

    /// An all-zero interval fixes the parameter.
    pub fn is_zero(self) -> bool {
        let (lo, hi) = self.offsets();
        lo == 0.0 && hi == 0.0
    }
}

/// Which parameters the fit may move.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FreeSpec {
    /// The generator's default free set, unbounded.
    #[default]
    Defaults,
    /// Per-parameter overrides of the default set; `None` keeps the default.
    /// Free parameters are unbounded.
    Flags(ParamMap<Option<bool>>),
    /// Per-parameter search intervals. A missing entry is unbounded when the
    /// parameter is free by default and fixed otherwise.
    Tolerances(ParamMap<Option<Tolerance>>),
}

impl FreeSpec {
    /// Flags from `(name, free)` pairs.
    pub fn flags<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut map = ParamMap::<Option<bool>>::default();
        for (key, free) in pairs {
            let name: ParamName = key.parse()?;
            map[name] = Some(free);
        }
        Ok(FreeSpec::Flags(map))
    }

    /// Tolerances from `(name, tolerance)` pairs.
    pub fn tolerances<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Tolerance)>,
    {
        let mut map = ParamMap::<Option<Tolerance>>::default();
        for (key, tol) in pairs {
            let name: ParamName = key.parse()?;
            let (lo, hi) = tol.offsets();
            if lo.is_nan() || hi.is_nan() || lo > hi {
                bail!("invalid tolerance for `{name}`: [{lo}, {hi}]");
            }
            map[name] = Some(tol);
        }
        Ok(FreeSpec::Tolerances(map))
    }
}

/// Parameters free by default for a generator.
pub fn default_free_mask(generator: Generator) -> ParamMap<bool> {
    use ParamName::*;
    let free: &[ParamName] = match generator {
        Generator::FullSurface => &[Xi, Yi, Zi, Alpha, Beta, Gamma],
        Generator::Cylinder => &[Xi, Zi, Alpha, Beta, Gamma],
        Generator::Profile1DHeight => &[Xi, Zi, Beta],
        Generator::Profile1DSlope => &[Xi, Beta],
    };
    ParamMap::from_fn(|n| free.contains(&n))
}

/// Resolved state of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamSpec {
    Fixed(Real),
    Free {
        initial: Real,
        /// Absolute `(lower, upper)` bounds; infinite sides are open.
        lower: Real,
        upper: Real,
    },
}

impl ParamSpec {
    pub fn is_free(&self) -> bool {
        matches!(self, ParamSpec::Free { .. })
    }

    pub fn start(&self) -> Real {
        match *self {
            ParamSpec::Fixed(v) => v,
            ParamSpec::Free { initial, .. } => initial,
        }
    }
}
