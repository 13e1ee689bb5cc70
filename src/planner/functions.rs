//! Expression function library.
//!
//! A closed registry of derived-expression templates. Each template is
//! reachable by a symbolic identifier (`upper`) and, for most, by a literal
//! fragment string (`upper(?)`) that is treated as an alias for the same
//! template.
//!
//! Lookup failures are the caller's concern: an unknown identifier aborts
//! the build, while a missing or malformed parameter is a per-entry
//! [`ParamError`] the caller records.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::query::expr::{self, func, lit_float, lit_int, lit_str, Expr};
use crate::resolve::{FunctionRef, Param};

/// Date truncation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncUnit {
    Day,
    Week,
    Month,
    Year,
}

impl TruncUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruncUnit::Day => "day",
            TruncUnit::Week => "week",
            TruncUnit::Month => "month",
            TruncUnit::Year => "year",
        }
    }
}

/// A derived-expression template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Upper,
    Lower,
    Concat,
    DateTrunc(TruncUnit),
    Count,
    Sum,
    Avg,
    Median,
    Percentile,
    Max,
    Bucket,
}

/// Problems with the parameters of one derived entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("missing required option '{param}' for function '{function}'")]
    Missing {
        function: &'static str,
        param: &'static str,
    },

    #[error("invalid option '{param}' for function '{function}': {reason}")]
    Invalid {
        function: &'static str,
        param: &'static str,
        reason: String,
    },
}

const ALL: [Function; 14] = [
    Function::Upper,
    Function::Lower,
    Function::Concat,
    Function::DateTrunc(TruncUnit::Day),
    Function::DateTrunc(TruncUnit::Week),
    Function::DateTrunc(TruncUnit::Month),
    Function::DateTrunc(TruncUnit::Year),
    Function::Count,
    Function::Sum,
    Function::Avg,
    Function::Median,
    Function::Percentile,
    Function::Max,
    Function::Bucket,
];

static FRAGMENT_SPACING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([(),])\s*").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static FRAGMENTS: LazyLock<HashMap<String, Function>> = LazyLock::new(|| {
    ALL.iter()
        .filter_map(|f| f.fragment().map(|template| (normalize_fragment(template), *f)))
        .collect()
});

/// Case-fold and collapse whitespace so `UPPER( ? )` matches `upper(?)`.
fn normalize_fragment(fragment: &str) -> String {
    let lowered = fragment.trim().to_lowercase();
    let tight = FRAGMENT_SPACING.replace_all(&lowered, "$1");
    WHITESPACE.replace_all(&tight, " ").into_owned()
}

impl Function {
    /// Look up a symbolic identifier.
    ///
    /// Accepts the same long spellings as aggregate symbols (`average`,
    /// `maximum`), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        match name.as_str() {
            "average" => Some(Function::Avg),
            "maximum" => Some(Function::Max),
            other => ALL.iter().copied().find(|f| f.name() == other),
        }
    }

    /// Look up a literal fragment template.
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        FRAGMENTS.get(&normalize_fragment(fragment)).copied()
    }

    pub fn lookup(function: &FunctionRef) -> Option<Self> {
        match function {
            FunctionRef::Named(name) => Self::from_name(name),
            FunctionRef::Fragment(fragment) => Self::from_fragment(fragment),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Upper => "upper",
            Function::Lower => "lower",
            Function::Concat => "concat",
            Function::DateTrunc(unit) => unit.as_str(),
            Function::Count => "count",
            Function::Sum => "sum",
            Function::Avg => "avg",
            Function::Median => "median",
            Function::Percentile => "percentile",
            Function::Max => "max",
            Function::Bucket => "bucket",
        }
    }

    /// The literal template accepted as an alias, if any.
    pub fn fragment(&self) -> Option<&'static str> {
        match self {
            Function::Upper => Some("upper(?)"),
            Function::Lower => Some("lower(?)"),
            Function::Concat => Some("concat(?, ?)"),
            Function::DateTrunc(TruncUnit::Day) => Some("date_trunc('day', ?)"),
            Function::DateTrunc(TruncUnit::Week) => Some("date_trunc('week', ?)"),
            Function::DateTrunc(TruncUnit::Month) => Some("date_trunc('month', ?)"),
            Function::DateTrunc(TruncUnit::Year) => Some("date_trunc('year', ?)"),
            Function::Count => Some("count(?)"),
            Function::Sum => Some("sum(?)"),
            Function::Avg => Some("avg(?)"),
            Function::Median => Some("percentile_cont(0.5) within group (order by ?)"),
            Function::Max => Some("max(?)"),
            Function::Percentile | Function::Bucket => None,
        }
    }

    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Function::Concat => &["value"],
            Function::Percentile => &["percentile"],
            Function::Bucket => &["lower", "upper", "count"],
            _ => &[],
        }
    }

    /// Check parameters without building anything.
    pub fn validate(&self, params: &BTreeMap<String, Param>) -> Result<(), ParamError> {
        for &param in self.required_params() {
            if !params.contains_key(param) {
                return Err(ParamError::Missing {
                    function: self.name(),
                    param,
                });
            }
        }
        match self {
            Function::Percentile => {
                self.fraction(params)?;
            }
            Function::Bucket => {
                self.number(params, "lower")?;
                self.number(params, "upper")?;
                self.bucket_count(params)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Instantiate the template over `arg`.
    pub fn apply(&self, arg: Expr, params: &BTreeMap<String, Param>) -> Result<Expr, ParamError> {
        self.validate(params)?;

        let expr = match self {
            Function::Upper => func("upper", vec![arg]),
            Function::Lower => func("lower", vec![arg]),
            Function::Concat => {
                let value = Expr::Literal(self.param(params, "value")?.to_literal());
                func("concat", vec![arg, value])
            }
            Function::DateTrunc(unit) => func("date_trunc", vec![lit_str(unit.as_str()), arg]),
            Function::Count => expr::count(arg),
            Function::Sum => expr::sum(arg),
            Function::Avg => expr::avg(arg),
            Function::Median => func("percentile_cont", vec![lit_float(0.5), arg]),
            Function::Percentile => {
                func("percentile_cont", vec![lit_float(self.fraction(params)?), arg])
            }
            Function::Max => expr::max(arg),
            Function::Bucket => func(
                "width_bucket",
                vec![
                    arg,
                    lit_float(self.number(params, "lower")?),
                    lit_float(self.number(params, "upper")?),
                    lit_int(self.bucket_count(params)?),
                ],
            ),
        };
        Ok(expr)
    }

    fn param<'p>(
        &self,
        params: &'p BTreeMap<String, Param>,
        name: &'static str,
    ) -> Result<&'p Param, ParamError> {
        params.get(name).ok_or(ParamError::Missing {
            function: self.name(),
            param: name,
        })
    }

    fn number(
        &self,
        params: &BTreeMap<String, Param>,
        name: &'static str,
    ) -> Result<f64, ParamError> {
        self.param(params, name)?
            .as_f64()
            .ok_or_else(|| ParamError::Invalid {
                function: self.name(),
                param: name,
                reason: "expected a number".into(),
            })
    }

    fn fraction(&self, params: &BTreeMap<String, Param>) -> Result<f64, ParamError> {
        let value = self.number(params, "percentile")?;
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(ParamError::Invalid {
                function: self.name(),
                param: "percentile",
                reason: format!("{} is outside 0.0..=1.0", value),
            })
        }
    }

    fn bucket_count(&self, params: &BTreeMap<String, Param>) -> Result<i64, ParamError> {
        match self.param(params, "count")?.as_i64() {
            Some(n) if n > 0 => Ok(n),
            _ => Err(ParamError::Invalid {
                function: self.name(),
                param: "count",
                reason: "expected a positive integer".into(),
            }),
        }
    }
}
