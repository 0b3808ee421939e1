//! Input normalization: raw text, token lists and pre-tallied tables all
//! resolve to a single [`FrequencyTable`].

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// A word and its cumulative weight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub text: String,
    pub weight: f64,
}

/// Insertion-ordered mapping from word to cumulative weight.
///
/// Adding a word that is already present accumulates its weight, so the table
/// can be built either by tallying tokens or from caller-supplied pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally every token once. Empty tokens are skipped.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for token in tokens {
            let token = token.as_ref();
            if !token.is_empty() {
                table.accumulate(token, 1.0);
            }
        }
        table
    }

    /// Build a table from pre-tallied `(word, weight)` pairs.
    ///
    /// Weights are trusted as frequencies and not re-counted, but they must be
    /// finite and non-negative.
    pub fn from_weights<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (text, weight) in pairs {
            table.add(text, weight)?;
        }
        Ok(table)
    }

    /// Add `weight` to `text`, inserting it if absent.
    ///
    /// Fails if `weight` is not a finite, non-negative number or if the
    /// accumulated total would overflow to infinity.
    pub fn add(&mut self, text: impl Into<String>, weight: f64) -> Result<()> {
        let text = text.into();
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeight { word: text, weight });
        }
        let total = self.get(&text).unwrap_or(0.0) + weight;
        if !total.is_finite() {
            return Err(Error::InvalidWeight { word: text, weight: total });
        }
        self.accumulate(&text, weight);
        Ok(())
    }

    fn accumulate(&mut self, text: &str, weight: f64) {
        match self.index.get(text) {
            Some(&i) => self.entries[i].weight += weight,
            None => {
                self.index.insert(text.to_string(), self.entries.len());
                self.entries.push(FrequencyEntry {
                    text: text.to_string(),
                    weight,
                });
            }
        }
    }

    pub fn get(&self, text: &str) -> Option<f64> {
        self.index.get(text).map(|&i| self.entries[i].weight)
    }

    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The accepted shapes of word input, resolved once by [`Words::into_table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Words {
    /// Free text, tokenized on whitespace
    Text(String),
    /// One occurrence per element
    Tokens(Vec<String>),
    /// Pre-tallied weights used as-is
    Table(FrequencyTable),
}

impl Words {
    /// Normalize into a frequency table.
    pub fn into_table(self) -> FrequencyTable {
        match self {
            Words::Text(text) => FrequencyTable::from_tokens(text.split_whitespace()),
            Words::Tokens(tokens) => FrequencyTable::from_tokens(tokens),
            Words::Table(table) => table,
        }
    }
}

impl From<&str> for Words {
    fn from(text: &str) -> Self {
        Words::Text(text.to_string())
    }
}

impl From<String> for Words {
    fn from(text: String) -> Self {
        Words::Text(text)
    }
}

impl From<Vec<String>> for Words {
    fn from(tokens: Vec<String>) -> Self {
        Words::Tokens(tokens)
    }
}

impl From<Vec<&str>> for Words {
    fn from(tokens: Vec<&str>) -> Self {
        Words::Tokens(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Words {
    fn from(tokens: &[&str]) -> Self {
        Words::Tokens(tokens.iter().map(|s| s.to_string()).collect())
    }
}

impl From<FrequencyTable> for Words {
    fn from(table: FrequencyTable) -> Self {
        Words::Table(table)
    }
}

/// Untyped input: a JSON string, an array of strings, or an object mapping
/// words to numbers. Anything else is an `InvalidInputType`.
impl TryFrom<Value> for Words {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(Words::Text(text)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(Error::InvalidInputType(format!(
                        "sequence elements must be strings, found {}",
                        json_type_name(&other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Words::Tokens),
            Value::Object(map) => {
                let mut table = FrequencyTable::new();
                for (word, weight) in map {
                    let weight = weight.as_f64().ok_or_else(|| {
                        Error::InvalidInputType(format!(
                            "weight for '{}' must be a number, found {}",
                            word,
                            json_type_name(&weight)
                        ))
                    })?;
                    table.add(word, weight)?;
                }
                Ok(Words::Table(table))
            }
            other => Err(Error::InvalidInputType(format!(
                "expected a string, an array of strings or a map of weights, found {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn text_is_tallied_on_whitespace() {
        let table = Words::from("a  a\tb\n").into_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(2.0));
        assert_eq!(table.get("b"), Some(1.0));
    }

    #[test]
    fn text_matches_equivalent_pretallied_table() {
        let tallied = Words::from("a a b").into_table();
        let supplied = FrequencyTable::from_weights(vec![("a", 2.0), ("b", 1.0)]).unwrap();
        assert_eq!(tallied, supplied);
    }

    #[test]
    fn tokens_keep_first_seen_order() {
        let table = Words::from(vec!["moon", "sun", "moon", "star"]).into_table();
        let order: Vec<&str> = table.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(order, vec!["moon", "sun", "star"]);
        assert_eq!(table.get("moon"), Some(2.0));
    }

    #[test]
    fn empty_inputs_give_empty_tables() {
        assert!(Words::from("   ").into_table().is_empty());
        assert!(Words::Tokens(vec![]).into_table().is_empty());
        assert!(Words::from(vec![""]).into_table().is_empty());
    }

    #[test]
    fn pretallied_weights_are_not_recounted() {
        let table = FrequencyTable::from_weights(vec![("a", 5.0), ("b", 10.0)]).unwrap();
        let words = Words::from(table.clone());
        assert_eq!(words.into_table(), table);
    }

    #[test]
    fn duplicate_pairs_accumulate() {
        let table = FrequencyTable::from_weights(vec![("a", 1.5), ("a", 2.0)]).unwrap();
        assert_eq!(table.get("a"), Some(3.5));
    }

    #[test]
    fn bad_weights_are_rejected() {
        for weight in [-1.0, f64::NAN, f64::INFINITY] {
            let err = FrequencyTable::from_weights(vec![("a", weight)]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert!(FrequencyTable::from_weights(vec![("zero", 0.0)]).is_ok());
    }

    #[test]
    fn overflowing_totals_are_rejected() {
        let err = FrequencyTable::from_weights(vec![("big", 1e308), ("big", 1e308), ("small", 1.0)])
            .unwrap_err();
        match err {
            Error::InvalidWeight { word, weight } => {
                assert_eq!(word, "big");
                assert!(weight.is_infinite());
            }
            other => panic!("expected InvalidWeight, got {:?}", other),
        }

        let mut table = FrequencyTable::new();
        table.add("big", 1e308).unwrap();
        assert!(table.add("big", 1e308).is_err());
        assert_eq!(table.get("big"), Some(1e308));
    }

    #[test]
    fn json_shapes_map_to_variants() {
        assert_eq!(
            Words::try_from(json!("a b")).unwrap(),
            Words::Text("a b".into())
        );
        assert_eq!(
            Words::try_from(json!(["a", "b"])).unwrap(),
            Words::Tokens(vec!["a".into(), "b".into()])
        );
        let table = Words::try_from(json!({"b": 10, "a": 5})).unwrap().into_table();
        let order: Vec<&str> = table.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(table.get("a"), Some(5.0));
    }

    #[test]
    fn unsupported_json_shapes_are_invalid_input_type() {
        for value in [json!(42), json!(true), json!(null), json!(["a", 1]), json!({"a": "x"})] {
            match Words::try_from(value) {
                Err(Error::InvalidInputType(_)) => {}
                other => panic!("expected InvalidInputType, got {:?}", other),
            }
        }
    }

    #[test]
    fn negative_json_weight_is_invalid_weight() {
        let err = Words::try_from(json!({"a": -3})).unwrap_err();
        assert!(matches!(err, Error::InvalidWeight { .. }));
    }
}
