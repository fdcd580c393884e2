use serde_json::Value;

/// Cheap structural check applied to frames before they are forwarded.
///
/// An empty key set accepts everything, including non-JSON payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameFilter {
    required_keys: Vec<String>,
}

impl FrameFilter {
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Accept only JSON objects carrying every one of `keys` at the top level.
    pub fn require_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required_keys(&self) -> &[String] {
        &self.required_keys
    }

    pub fn accepts(&self, frame: &[u8]) -> bool {
        if self.required_keys.is_empty() {
            return true;
        }
        match serde_json::from_slice::<Value>(frame) {
            Ok(Value::Object(map)) => self.required_keys.iter().all(|k| map.contains_key(k)),
            _ => false,
        }
    }
}
