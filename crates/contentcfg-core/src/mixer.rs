//! Ratio-based interleaving of two ranked content lists
//!
//! Recommendation rows mix regular characters (primary) with origin-story
//! characters (secondary) in a fixed cyclic pattern. When one source runs
//! dry the other fills its turns, so the row still reaches its limit without
//! gaps.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CfgError, CfgResult};

/// Which list a pattern step draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Primary,
    Secondary,
}

/// A non-empty cyclic draw pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Source>", into = "Vec<Source>")]
pub struct MixPattern(Vec<Source>);

impl MixPattern {
    pub fn new(steps: Vec<Source>) -> CfgResult<Self> {
        if steps.is_empty() {
            return Err(CfgError::InvalidArgument("mix pattern must not be empty".to_string()));
        }
        Ok(Self(steps))
    }

    /// `primary` primary draws followed by `secondary` secondary draws.
    pub fn ratio(primary: usize, secondary: usize) -> CfgResult<Self> {
        let mut steps = vec![Source::Primary; primary];
        steps.extend(std::iter::repeat(Source::Secondary).take(secondary));
        Self::new(steps)
    }

    pub fn steps(&self) -> &[Source] {
        &self.0
    }
}

impl Default for MixPattern {
    /// Two characters for every origin-story character
    fn default() -> Self {
        Self(vec![Source::Primary, Source::Primary, Source::Secondary])
    }
}

impl TryFrom<Vec<Source>> for MixPattern {
    type Error = CfgError;

    fn try_from(steps: Vec<Source>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<MixPattern> for Vec<Source> {
    fn from(pattern: MixPattern) -> Self {
        pattern.0
    }
}

impl fmt::Display for MixPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            f.write_str(match step {
                Source::Primary => "P",
                Source::Secondary => "S",
            })?;
        }
        Ok(())
    }
}

impl FromStr for MixPattern {
    type Err = CfgError;

    /// Parses the compact form, e.g. `"PPS"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let steps = s
            .trim()
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'P' | 'A' => Ok(Source::Primary),
                'S' | 'B' => Ok(Source::Secondary),
                other => Err(CfgError::InvalidArgument(format!(
                    "unknown mix pattern step '{other}'"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(steps)
    }
}

/// Interleave `primary` and `secondary` following `pattern`, borrowing from
/// the other list when the named one is exhausted.
///
/// The result length is `min(limit, primary.len() + secondary.len())`.
pub fn interleave<T>(
    primary: Vec<T>,
    secondary: Vec<T>,
    pattern: &MixPattern,
    limit: usize,
) -> Vec<T> {
    interleave_filtered(primary, secondary, pattern, limit, |_| true)
}

/// Like [`interleave`], but an item whose key was already emitted is
/// skipped, so content present in both lists shows once.
pub fn interleave_unique<T, K, F>(
    primary: Vec<T>,
    secondary: Vec<T>,
    pattern: &MixPattern,
    limit: usize,
    key: F,
) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    interleave_filtered(primary, secondary, pattern, limit, |item| seen.insert(key(item)))
}

fn interleave_filtered<T>(
    primary: Vec<T>,
    secondary: Vec<T>,
    pattern: &MixPattern,
    limit: usize,
    mut accept: impl FnMut(&T) -> bool,
) -> Vec<T> {
    let mut primary = primary.into_iter();
    let mut secondary = secondary.into_iter();
    let mut out = Vec::with_capacity(limit.min(primary.len() + secondary.len()));

    'outer: for step in pattern.steps().iter().cycle() {
        if out.len() >= limit {
            break;
        }
        let (first, second) = match step {
            Source::Primary => (&mut primary, &mut secondary),
            Source::Secondary => (&mut secondary, &mut primary),
        };
        loop {
            match first.next().or_else(|| second.next()) {
                Some(item) if accept(&item) => {
                    out.push(item);
                    break;
                }
                Some(_) => continue,
                None => break 'outer,
            }
        }
    }
    out
}
