//! Value serialization
//!
//! Values are stored as text. `JsonCodec` is the default encoding.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Converts values to the stored text form and back
pub trait ValueCodec: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T>;
}

/// JSON text via serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        Ok(serde_json::from_str(text)?)
    }
}
