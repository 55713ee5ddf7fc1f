//! Positional call arguments

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Signal;

/// Arguments of one call, in the order of the capability's signature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    capability: String,
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(capability: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            capability: capability.into(),
            values,
        }
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Deserialize the whole argument list, typically into a tuple:
    ///
    /// ```
    /// # use kotto_agent::Arguments;
    /// # use serde_json::json;
    /// let args = Arguments::new("greet", vec![json!("Ada"), json!(3)]);
    /// let (name, times): (String, u32) = args.parse().unwrap();
    /// assert_eq!((name.as_str(), times), ("Ada", 3));
    /// ```
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, Signal> {
        serde_json::from_value(Value::Array(self.values.clone())).map_err(|e| {
            Signal::Feedback(format!(
                "invalid arguments for `{}`: {}",
                self.capability, e
            ))
        })
    }

    /// Deserialize the argument at `index`
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, Signal> {
        let value = self.values.get(index).cloned().ok_or_else(|| {
            Signal::Feedback(format!(
                "`{}` expects an argument at position {}, got {} arguments",
                self.capability,
                index,
                self.values.len()
            ))
        })?;
        serde_json::from_value(value).map_err(|e| {
            Signal::Feedback(format!(
                "invalid argument {} for `{}`: {}",
                index, self.capability, e
            ))
        })
    }
}
