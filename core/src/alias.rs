//! Action compatibility resolver.
//!
//! # Design
//! Older callers use retired action names and wrap their parameters in a
//! nested `payload` object. The server only understands canonical names and
//! flat parameters, so every call passes through `resolve` first.
//!
//! The alias table is versioned: each entry names the table version that
//! introduced it, and `ALIAS_TABLE_VERSION` is bumped whenever an entry is
//! added. Entries are never removed while any caller may still send them.
//!
//! Flattening precedence: fields of the outer object win over fields of the
//! nested `payload` object, the `payload` key itself is dropped, and no
//! further conflict detection is performed.

use serde_json::{Map, Value};

/// Key under which legacy callers nest their parameters.
pub const LEGACY_NESTING_KEY: &str = "payload";

/// Current version of `ACTION_ALIASES`.
pub const ALIAS_TABLE_VERSION: u32 = 1;

/// One retired action name and the canonical action that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionAlias {
    pub legacy: &'static str,
    pub canonical: &'static str,
    pub since: u32,
}

/// Legacy → canonical action names.
pub static ACTION_ALIASES: &[ActionAlias] = &[
    ActionAlias {
        legacy: "getStudentByRut",
        canonical: "getStudent",
        since: 1,
    },
    ActionAlias {
        legacy: "listBusesWithLoad",
        canonical: "listBuses",
        since: 1,
    },
];

/// Map `action` to its canonical name, passing unknown names through.
pub fn canonical_action(action: &str) -> &str {
    ACTION_ALIASES
        .iter()
        .find(|alias| alias.legacy == action)
        .map_or(action, |alias| alias.canonical)
}

/// The two parameter shapes callers send.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestShape {
    /// Parameters already at the top level.
    Flat(Map<String, Value>),
    /// Legacy shape: `{ payload: { ...nested }, ...outer }`.
    LegacyNested {
        outer: Map<String, Value>,
        nested: Map<String, Value>,
    },
}

impl RequestShape {
    /// Classify a caller payload. Absent or non-object payloads are an empty
    /// flat shape; a `payload` key holding a non-object is an ordinary field.
    pub fn classify(payload: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = payload else {
            return RequestShape::Flat(Map::new());
        };
        let mut outer = map.clone();
        match outer.remove(LEGACY_NESTING_KEY) {
            Some(Value::Object(nested)) => RequestShape::LegacyNested { outer, nested },
            Some(other) => {
                outer.insert(LEGACY_NESTING_KEY.to_string(), other);
                RequestShape::Flat(outer)
            }
            None => RequestShape::Flat(outer),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, RequestShape::LegacyNested { .. })
    }

    /// Merge into one flat parameter map; outer fields win.
    pub fn flatten(self) -> Map<String, Value> {
        match self {
            RequestShape::Flat(map) => map,
            RequestShape::LegacyNested { outer, mut nested } => {
                nested.extend(outer);
                nested
            }
        }
    }
}

/// A call after alias substitution and flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub action: String,
    pub flat_payload: Map<String, Value>,
}

/// Canonicalize `action` and flatten `payload`. Never fails.
pub fn resolve(action: &str, payload: Option<&Value>) -> ResolvedCall {
    ResolvedCall {
        action: canonical_action(action).to_string(),
        flat_payload: RequestShape::classify(payload).flatten(),
    }
}
