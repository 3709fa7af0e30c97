pub mod token;
#[cfg(feature = "terminal_printing")]
pub mod printing;
pub(crate) mod prompt_processing;

use std::collections::HashMap;
use serde_json::{Map, Value};

pub type JsonMap = Map<String, Value>;

/// Mapping from placeholder name to the value entered for it.
pub type ValueMap = HashMap<String, String>;
