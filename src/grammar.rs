//! Predicate grammar used inside constraints.
//!
//! A predicate is a JSON object with exactly one operator key, for instance
//! `{ "$eq": "did:ethr:0xf3beac30c498d9e26865f34fcaa57dbb935b0d74" }` or
//! `{ "$lt": 15999999 }`.
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::Error;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }

    /// Applies the operator to `actual` (the claim value) and `expected`
    /// (the predicate value).
    ///
    /// Ordering operators are only defined between two numbers or two
    /// strings; any other pair does not satisfy them.
    pub fn apply(&self, actual: &Value, expected: &Value) -> bool {
        match self {
            Self::Eq => json_eq(actual, expected),
            Self::Ne => !json_eq(actual, expected),
            Self::Gt => json_cmp(actual, expected) == Some(Ordering::Greater),
            Self::Gte => matches!(
                json_cmp(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt => json_cmp(actual, expected) == Some(Ordering::Less),
            Self::Lte => matches!(
                json_cmp(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnknownOperator(s.to_owned()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        // `1` and `1.0` are the same claim value.
        (Value::Number(a), Value::Number(b)) => cmp_numbers(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn json_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => cmp_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Integers are compared exactly; `f64` is only used when a float is
/// involved.
fn cmp_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    if !a.is_f64() && !b.is_f64() {
        // A negative integer against one above `i64::MAX`.
        return Some(if a.is_i64() {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Raw predicate object, as received.
///
/// Well-formedness is only checked by [`Predicate::validate`], so a request
/// may carry a malformed predicate until its items are validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(BTreeMap<String, Value>);

/// Validated view of a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison<'a> {
    pub operator: Operator,
    pub value: &'a Value,
}

impl Predicate {
    pub fn new(operator: Operator, value: impl Into<Value>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(operator.as_str().to_owned(), value.into());
        Self(map)
    }

    /// Builds a predicate from arbitrary operator entries, without checking
    /// them.
    pub fn from_entries<K: Into<String>, V: Into<Value>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that the predicate has exactly one recognized operator.
    pub fn validate(&self) -> Result<Comparison<'_>, Error> {
        let mut entries = self.0.iter();
        let (key, value) = entries.next().ok_or(Error::EmptyPredicate)?;
        if entries.next().is_some() {
            return Err(Error::MultipleOperators);
        }

        Ok(Comparison {
            operator: key.parse()?,
            value,
        })
    }

    /// Evaluates the predicate against a claim value.
    pub fn evaluate(&self, actual: &Value) -> Result<bool, Error> {
        let Comparison { operator, value } = self.validate()?;
        Ok(operator.apply(actual, value))
    }
}

impl From<Comparison<'_>> for Predicate {
    fn from(comparison: Comparison<'_>) -> Self {
        Self::new(comparison.operator, comparison.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn predicate(value: Value) -> Predicate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn single_operator() {
        let p = predicate(json!({ "$eq": "jpsantos@gmail.com" }));
        let comparison = p.validate().unwrap();
        assert_eq!(comparison.operator, Operator::Eq);
        assert_eq!(comparison.value, &json!("jpsantos@gmail.com"));
    }

    #[test]
    fn every_operator_is_recognized() {
        for op in Operator::ALL {
            let p = predicate(json!({ op.as_str(): 1 }));
            assert_eq!(p.validate().unwrap().operator, op);
        }
    }

    #[test]
    fn multiple_operators() {
        let p = predicate(json!({
            "$eq": "jpsantos@gmail.com",
            "$ne": "jpsantos@gmail.com"
        }));
        assert!(matches!(p.validate(), Err(Error::MultipleOperators)));
    }

    #[test]
    fn multiple_operators_wins_over_unknown() {
        let p = predicate(json!({ "$super": 1, "$eq": 1 }));
        assert!(matches!(p.validate(), Err(Error::MultipleOperators)));
    }

    #[test]
    fn unknown_operator() {
        let p = predicate(json!({ "$super": "jpsantos@gmail.com" }));
        match p.validate() {
            Err(Error::UnknownOperator(op)) => assert_eq!(op, "$super"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn empty_predicate() {
        assert!(matches!(
            Predicate::default().validate(),
            Err(Error::EmptyPredicate)
        ));
    }

    #[test]
    fn evaluate_numbers() {
        let lt = Predicate::new(Operator::Lt, 15999999);
        assert!(lt.evaluate(&json!(15000000)).unwrap());
        assert!(!lt.evaluate(&json!(15999999)).unwrap());

        let lte = Predicate::new(Operator::Lte, 15999999);
        assert!(lte.evaluate(&json!(15999999.0)).unwrap());

        let eq = Predicate::new(Operator::Eq, 1);
        assert!(eq.evaluate(&json!(1.0)).unwrap());
    }

    #[test]
    fn evaluate_large_integers_exactly() {
        let eq = Predicate::new(Operator::Eq, 9007199254740993u64);
        assert!(!eq.evaluate(&json!(9007199254740992u64)).unwrap());
        assert!(eq.evaluate(&json!(9007199254740993u64)).unwrap());

        let gt = Predicate::new(Operator::Gt, 9007199254740992i64);
        assert!(gt.evaluate(&json!(9007199254740993i64)).unwrap());

        let lt = Predicate::new(Operator::Lt, u64::MAX);
        assert!(lt.evaluate(&json!(-1)).unwrap());
        assert!(lt.evaluate(&json!(u64::MAX - 1)).unwrap());
    }

    #[test]
    fn evaluate_strings_and_timestamps() {
        let gt = Predicate::new(Operator::Gt, "2019-01-01T00:00:00Z");
        assert!(gt.evaluate(&json!("2020-06-30T12:00:00Z")).unwrap());
        assert!(!gt.evaluate(&json!("2018-06-30T12:00:00Z")).unwrap());

        let ne = Predicate::new(Operator::Ne, "a");
        assert!(ne.evaluate(&json!("b")).unwrap());
    }

    #[test]
    fn ordering_mismatched_types_never_holds() {
        for op in [Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte] {
            let p = Predicate::new(op, 10);
            assert!(!p.evaluate(&json!("10")).unwrap(), "{op}");
        }
    }

    #[test]
    fn evaluate_rejects_malformed_predicate() {
        let p = Predicate::from_entries([("$super", 1)]);
        assert!(p.evaluate(&json!(1)).is_err());
    }
}
