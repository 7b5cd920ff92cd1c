//! Host patterns and range expansion.
//!
//! A declared member token is either a literal host name or a template with
//! one or more numeric range markers:
//!
//!   client-[1:2]        =>  client-1, client-2
//!   node-[01:03]        =>  node-01, node-02, node-03
//!   node-[1:9:4]        =>  node-1, node-5, node-9
//!   web-[1:2].lab       =>  web-1.lab, web-2.lab
//!
//! Bounds are inclusive. Several markers expand as a cartesian product with
//! the leftmost marker varying slowest.

use crate::spec::HostName;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Upper limit on the names a single token may expand to.
pub const MAX_EXPANSION: u64 = 65_536;

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d+)(?::(\d+))?$").expect("range marker regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("host pattern is empty")]
    Empty,

    #[error("unterminated range marker in '{0}'")]
    Unterminated(String),

    #[error("unbalanced ']' in '{0}'")]
    StrayBracket(String),

    #[error("range marker '[{body}]' in '{pattern}' needs numeric bounds like [1:3]")]
    NonNumeric { pattern: String, body: String },

    #[error("range in '{pattern}' has lower bound {lower} above upper bound {upper}")]
    Inverted {
        pattern: String,
        lower: u64,
        upper: u64,
    },

    #[error("zero-padded range in '{0}' needs bounds of equal width")]
    PaddingMismatch(String),

    #[error("range in '{0}' has a zero stride")]
    ZeroStride(String),

    #[error("'{pattern}' expands to more than {limit} host names")]
    TooLarge { pattern: String, limit: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NumericRange {
    lower: u64,
    upper: u64,
    stride: u64,
    /// Zero-pad width; 0 means no padding.
    width: usize,
}

impl NumericRange {
    /// `None` when the count does not fit in a u64.
    fn len(&self) -> Option<u64> {
        ((self.upper - self.lower) / self.stride).checked_add(1)
    }

    fn values(&self) -> impl Iterator<Item = u64> + '_ {
        (self.lower..=self.upper).step_by(self.stride as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Range(NumericRange),
}

/// A parsed member token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl HostPattern {
    pub fn parse(token: &str) -> Result<Self, PatternError> {
        if token.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let mut segments = Vec::new();
        let mut rest = token;
        while let Some(open) = rest.find('[') {
            let head = &rest[..open];
            if head.contains(']') {
                return Err(PatternError::StrayBracket(token.to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find(']')
                .ok_or_else(|| PatternError::Unterminated(token.to_string()))?;

            if !head.is_empty() {
                segments.push(Segment::Text(head.to_string()));
            }
            segments.push(Segment::Range(parse_range(token, &after[..close])?));
            rest = &after[close + 1..];
        }
        if rest.contains(']') {
            return Err(PatternError::StrayBracket(token.to_string()));
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        let mut total: u64 = 1;
        for seg in &segments {
            if let Segment::Range(r) = seg {
                total = r.len().map_or(u64::MAX, |n| total.saturating_mul(n));
            }
        }
        if total > MAX_EXPANSION {
            return Err(PatternError::TooLarge {
                pattern: token.to_string(),
                limit: MAX_EXPANSION,
            });
        }

        Ok(Self {
            raw: token.to_string(),
            segments,
        })
    }

    pub fn is_range(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Range(_)))
    }

    /// Concrete names in ascending range order.
    pub fn expand(&self) -> Vec<HostName> {
        let mut names = vec![String::new()];
        for seg in &self.segments {
            match seg {
                Segment::Text(text) => {
                    for name in &mut names {
                        name.push_str(text);
                    }
                }
                Segment::Range(range) => {
                    let mut next = Vec::with_capacity(names.len());
                    for name in &names {
                        for v in range.values() {
                            next.push(format!("{}{:0width$}", name, v, width = range.width));
                        }
                    }
                    names = next;
                }
            }
        }
        names.into_iter().map(HostName::new).collect()
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Expand a single member token into the host names it denotes.
pub fn expand(pattern: &str) -> Result<Vec<HostName>, PatternError> {
    Ok(HostPattern::parse(pattern)?.expand())
}

fn parse_range(pattern: &str, body: &str) -> Result<NumericRange, PatternError> {
    let non_numeric = || PatternError::NonNumeric {
        pattern: pattern.to_string(),
        body: body.to_string(),
    };

    let caps = RANGE_RE.captures(body).ok_or_else(non_numeric)?;
    let lower_str = &caps[1];
    let upper_str = &caps[2];

    let lower: u64 = lower_str.parse().map_err(|_| non_numeric())?;
    let upper: u64 = upper_str.parse().map_err(|_| non_numeric())?;
    let stride: u64 = match caps.get(3) {
        Some(m) => m.as_str().parse().map_err(|_| non_numeric())?,
        None => 1,
    };

    if lower > upper {
        return Err(PatternError::Inverted {
            pattern: pattern.to_string(),
            lower,
            upper,
        });
    }
    if stride == 0 {
        return Err(PatternError::ZeroStride(pattern.to_string()));
    }

    let padded = |s: &str| s.len() > 1 && s.starts_with('0');
    let width = if padded(lower_str) || padded(upper_str) {
        if upper_str.len() != lower_str.len() {
            return Err(PatternError::PaddingMismatch(pattern.to_string()));
        }
        lower_str.len()
    } else {
        0
    };

    Ok(NumericRange {
        lower,
        upper,
        stride,
        width,
    })
}
