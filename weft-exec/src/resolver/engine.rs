use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rhai::{Array, Dynamic, Engine, EvalAltResult, Map, Scope};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("expression execution error: {0}")]
    Eval(String),
}

/// Guard/value expression engine on a locked-down Rhai configuration.
///
/// Guards are evaluated with the case's scalar process variables pushed into
/// the scope by bare name; the injected built-ins cover the small set of
/// helpers declarative documents rely on.
pub struct ExpressionEngine {
    engine: Engine,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new(Arc::new(BTreeMap::new()))
    }
}

impl ExpressionEngine {
    pub fn new(dictionaries: Arc<BTreeMap<String, BTreeMap<String, String>>>) -> Self {
        let mut engine = Engine::new_raw();
        engine.set_max_operations(50_000);
        engine.set_max_call_levels(64);
        engine.set_max_expr_depths(64, 64);
        engine.on_print(|_| {});
        engine.on_debug(|_, _, _| {});

        engine.register_fn(
            "parse_date",
            |value: &str, format: &str| -> Result<i64, Box<EvalAltResult>> {
                parse_date(value, format).map_err(|e| e.to_string().into())
            },
        );
        engine.register_fn("format_amount", |value: f64, decimals: i64| -> String {
            format!("{:.*}", decimals.max(0) as usize, value)
        });
        engine.register_fn("format_amount", |value: i64, decimals: i64| -> String {
            format!("{:.*}", decimals.max(0) as usize, value as f64)
        });
        engine.register_fn("lookup", move |dictionary: &str, key: &str| -> String {
            dictionaries
                .get(dictionary)
                .and_then(|d| d.get(key))
                .cloned()
                .unwrap_or_default()
        });

        Self { engine }
    }

    /// Evaluate an expression against the given variable map.
    pub fn evaluate(
        &self,
        expr: &str,
        vars: &BTreeMap<String, JsonValue>,
    ) -> Result<JsonValue, ExprError> {
        let mut scope = Scope::new();
        for (name, value) in vars {
            scope.push_dynamic(name.clone(), to_dynamic(value));
        }

        let result = self
            .engine
            .eval_with_scope::<Dynamic>(&mut scope, expr)
            .map_err(|e| ExprError::Eval(e.to_string()))?;
        Ok(from_dynamic(result))
    }

    pub fn evaluate_bool(
        &self,
        expr: &str,
        vars: &BTreeMap<String, JsonValue>,
    ) -> Result<Option<bool>, ExprError> {
        match self.evaluate(expr, vars)? {
            JsonValue::Bool(b) => Ok(Some(b)),
            _ => Ok(None),
        }
    }
}

fn parse_date(value: &str, format: &str) -> Result<i64, chrono::ParseError> {
    match NaiveDateTime::parse_from_str(value, format) {
        Ok(dt) => Ok(dt.and_utc().timestamp()),
        Err(_) => {
            let date = NaiveDate::parse_from_str(value, format)?;
            Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp())
        }
    }
}

fn to_dynamic(value: &JsonValue) -> Dynamic {
    match value {
        JsonValue::Null => Dynamic::UNIT,
        JsonValue::Bool(b) => Dynamic::from(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::from(0_i64)
            }
        }
        JsonValue::String(s) => Dynamic::from(s.clone()),
        JsonValue::Array(items) => {
            let mut arr = Array::new();
            for item in items {
                arr.push(to_dynamic(item));
            }
            Dynamic::from_array(arr)
        }
        JsonValue::Object(map) => {
            let mut rhai_map = Map::new();
            for (key, value) in map {
                rhai_map.insert(key.into(), to_dynamic(value));
            }
            Dynamic::from_map(rhai_map)
        }
    }
}

fn from_dynamic(value: Dynamic) -> JsonValue {
    if value.is_unit() {
        return JsonValue::Null;
    }
    if let Some(b) = value.clone().try_cast::<bool>() {
        return JsonValue::Bool(b);
    }
    if let Some(i) = value.clone().try_cast::<i64>() {
        return JsonValue::Number(Number::from(i));
    }
    if let Some(f) = value.clone().try_cast::<f64>() {
        if let Some(num) = Number::from_f64(f) {
            return JsonValue::Number(num);
        }
    }
    if let Some(s) = value.clone().try_cast::<String>() {
        return JsonValue::String(s);
    }
    if let Some(arr) = value.clone().try_cast::<Array>() {
        return JsonValue::Array(arr.into_iter().map(from_dynamic).collect());
    }
    if let Some(map) = value.clone().try_cast::<Map>() {
        let mut json_map = JsonMap::new();
        for (key, value) in map {
            json_map.insert(key.into(), from_dynamic(value));
        }
        return JsonValue::Object(json_map);
    }
    JsonValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, JsonValue)]) -> BTreeMap<String, JsonValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn comparison_over_variables() {
        let engine = ExpressionEngine::default();
        let v = vars(&[("total", json!(120))]);
        assert_eq!(
            engine.evaluate_bool("total > 100", &v).unwrap(),
            Some(true)
        );
        assert_eq!(
            engine.evaluate_bool("total > 200", &v).unwrap(),
            Some(false)
        );
    }

    #[test]
    fn string_equality() {
        let engine = ExpressionEngine::default();
        let v = vars(&[("status", json!("open"))]);
        assert_eq!(
            engine.evaluate_bool(r#"status == "open""#, &v).unwrap(),
            Some(true)
        );
    }

    #[test]
    fn arithmetic_result() {
        let engine = ExpressionEngine::default();
        assert_eq!(
            engine.evaluate("2 + 3 * 4", &BTreeMap::new()).unwrap(),
            json!(14)
        );
    }

    #[test]
    fn non_boolean_guard_is_none() {
        let engine = ExpressionEngine::default();
        assert_eq!(
            engine.evaluate_bool("1 + 1", &BTreeMap::new()).unwrap(),
            None
        );
    }

    #[test]
    fn format_amount_builtin() {
        let engine = ExpressionEngine::default();
        assert_eq!(
            engine
                .evaluate("format_amount(12.5, 2)", &BTreeMap::new())
                .unwrap(),
            json!("12.50")
        );
    }

    #[test]
    fn parse_date_builtin() {
        let engine = ExpressionEngine::default();
        let result = engine
            .evaluate(r#"parse_date("1939-09-01", "%Y-%m-%d")"#, &BTreeMap::new())
            .unwrap();
        assert_eq!(result, json!(-957312000));
    }

    #[test]
    fn dictionary_lookup_builtin() {
        let mut dict = BTreeMap::new();
        dict.insert(
            "countries".to_string(),
            BTreeMap::from([("IT".to_string(), "Italy".to_string())]),
        );
        let engine = ExpressionEngine::new(Arc::new(dict));
        assert_eq!(
            engine
                .evaluate(r#"lookup("countries", "IT")"#, &BTreeMap::new())
                .unwrap(),
            json!("Italy")
        );
        assert_eq!(
            engine
                .evaluate(r#"lookup("countries", "XX")"#, &BTreeMap::new())
                .unwrap(),
            json!("")
        );
    }

    #[test]
    fn bad_expression_errors() {
        let engine = ExpressionEngine::default();
        assert!(engine.evaluate("][", &BTreeMap::new()).is_err());
    }
}
