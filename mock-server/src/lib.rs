use std::{collections::HashMap, sync::Arc};

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "test-key";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rider {
    pub id: Uuid,
    pub rut: String,
    pub name: String,
    pub bus: Option<String>,
    pub updated_by: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bus {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub load: u32,
}

/// Inbound envelope. Everything besides the three envelope fields is a
/// parameter of the action.
#[derive(Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Default)]
pub struct Sheet {
    pub riders: HashMap<String, Rider>,
    pub buses: Vec<(String, String, u32)>,
}

impl Sheet {
    pub fn seeded() -> Self {
        Self {
            riders: HashMap::new(),
            buses: vec![
                ("B1".to_string(), "Recorrido Norte".to_string(), 40),
                ("B2".to_string(), "Recorrido Sur".to_string(), 32),
            ],
        }
    }

    fn bus_rows(&self) -> Vec<Bus> {
        self.buses
            .iter()
            .map(|(id, name, capacity)| Bus {
                id: id.clone(),
                name: name.clone(),
                capacity: *capacity,
                load: self
                    .riders
                    .values()
                    .filter(|r| r.bus.as_deref() == Some(id.as_str()))
                    .count() as u32,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub api_key: Arc<str>,
    pub sheet: Arc<RwLock<Sheet>>,
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        sheet: Arc::new(RwLock::new(Sheet::seeded())),
    };
    Router::new().route("/", post(handle)).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_key(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

/// The spreadsheet backend answers every request with 200 and an envelope,
/// whatever the content type.
async fn handle(State(state): State<AppState>, body: String) -> Json<Value> {
    let envelope: Envelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(_) => return fail("invalid request body"),
    };
    if envelope.api_key != *state.api_key {
        return fail("invalid api key");
    }
    info!(action = %envelope.action, email = %envelope.email, "sheet request");

    match envelope.action.as_str() {
        "ping" => ok(json!({"pong": true, "email": envelope.email})),
        "listBuses" => {
            let sheet = state.sheet.read().await;
            ok(json!(sheet.bus_rows()))
        }
        "getStudent" => {
            let Some(rut) = param_str(&envelope.params, "rut") else {
                return fail("missing rut");
            };
            let sheet = state.sheet.read().await;
            ok(json!(sheet.riders.get(rut)))
        }
        "saveStudent" => save_student(&state, &envelope).await,
        other => fail(&format!("unknown action: {other}")),
    }
}

async fn save_student(state: &AppState, envelope: &Envelope) -> Json<Value> {
    let (Some(rut), Some(name)) = (
        param_str(&envelope.params, "rut"),
        param_str(&envelope.params, "name"),
    ) else {
        return fail("rut and name are required");
    };
    let bus = param_str(&envelope.params, "bus").map(str::to_string);

    let mut sheet = state.sheet.write().await;
    if let Some(bus) = &bus {
        if !sheet.buses.iter().any(|(id, _, _)| id == bus) {
            return fail(&format!("unknown bus: {bus}"));
        }
    }
    let id = sheet.riders.get(rut).map_or_else(Uuid::new_v4, |r| r.id);
    let rider = Rider {
        id,
        rut: rut.to_string(),
        name: name.to_string(),
        bus,
        updated_by: envelope.email.clone(),
    };
    sheet.riders.insert(rider.rut.clone(), rider.clone());
    ok(json!(rider))
}

fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({"ok": true, "data": data}))
}

fn fail(message: &str) -> Json<Value> {
    Json(json!({"ok": false, "error": message}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_collects_params() {
        let env: Envelope = serde_json::from_str(
            r#"{"action":"getStudent","apiKey":"k","email":"a@b.cl","rut":"1-9"}"#,
        )
        .unwrap();
        assert_eq!(env.action, "getStudent");
        assert_eq!(env.api_key, "k");
        assert_eq!(env.params.get("rut"), Some(&json!("1-9")));
        assert!(!env.params.contains_key("action"));
    }

    #[test]
    fn envelope_defaults_key_and_email() {
        let env: Envelope = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
        assert_eq!(env.api_key, "");
        assert_eq!(env.email, "");
    }

    #[test]
    fn envelope_rejects_missing_action() {
        let result: Result<Envelope, _> = serde_json::from_str(r#"{"apiKey":"k"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rider_serializes_camel_case() {
        let rider = Rider {
            id: Uuid::nil(),
            rut: "1-9".to_string(),
            name: "Ana".to_string(),
            bus: None,
            updated_by: "a@b.cl".to_string(),
        };
        let json = serde_json::to_value(&rider).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["updatedBy"], "a@b.cl");
        assert_eq!(json["bus"], Value::Null);
    }

    #[test]
    fn bus_load_counts_assigned_riders() {
        let mut sheet = Sheet::seeded();
        sheet.riders.insert(
            "1-9".to_string(),
            Rider {
                id: Uuid::nil(),
                rut: "1-9".to_string(),
                name: "Ana".to_string(),
                bus: Some("B2".to_string()),
                updated_by: String::new(),
            },
        );
        let rows = sheet.bus_rows();
        assert_eq!(rows[0].load, 0);
        assert_eq!(rows[1].load, 1);
    }
}
