//! State API endpoints: GET/PATCH adapters over the amplifier command
//! vocabulary.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use nad_protocol::{Command, Operator, ProtocolError};

use crate::client::AmpClient;
use crate::transport::AmpError;
use crate::web::state::WebState;

/// Sparse amplifier state document. Only the fields relevant to the request
/// are populated; absent fields are omitted from the JSON representation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmpState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,
    #[serde(rename = "speakerA", skip_serializing_if = "Option::is_none")]
    pub speaker_a: Option<bool>,
    #[serde(rename = "speakerB", skip_serializing_if = "Option::is_none")]
    pub speaker_b: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

/// PATCH request body: `{"value": <string|boolean>}`.
#[derive(Debug, Deserialize)]
pub struct AmpValue {
    pub value: BodyValue,
}

/// A value that accepts either a JSON string or a JSON boolean. The untagged
/// decoding tries string first, then boolean.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BodyValue {
    Text(String),
    Toggle(bool),
}

impl BodyValue {
    /// Booleans normalize to the protocol's canonical on/off strings.
    pub fn normalized(&self) -> &str {
        match self {
            BodyValue::Text(s) => s,
            BodyValue::Toggle(true) => "On",
            BodyValue::Toggle(false) => "Off",
        }
    }
}

/// An API error returned to the client as `{"status", "message"}`. The
/// underlying cause is logged server-side and never serialized.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    cause: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> ApiError {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            cause: None,
        }
    }

    pub fn not_found() -> ApiError {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: "Not found".to_string(),
            cause: None,
        }
    }

    pub fn internal(message: impl Into<String>, cause: impl ToString) -> ApiError {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(cause) = &self.cause {
            log::error!("{}: {}", self.message, cause);
        }
        let body = Json(json!({
            "status": self.status.as_u16(),
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

/// Map a resource name from the request path to the canonical protocol
/// variable. `volume` is reachable through PATCH only.
fn protocol_variable(resource: &str) -> Option<&'static str> {
    match resource {
        "power" => Some("Power"),
        "mute" => Some("Mute"),
        "speakera" => Some("SpeakerA"),
        "speakerb" => Some("SpeakerB"),
        "source" => Some("Source"),
        "model" => Some("Model"),
        "volume" => Some("Volume"),
        _ => None,
    }
}

fn is_on(value: &str) -> bool {
    value.eq_ignore_ascii_case("on")
}

/// `GET /api/v1/state/:variable`
pub async fn query_state(
    State(state): State<WebState>,
    Path(variable): Path<String>,
) -> Result<Json<AmpState>, ApiError> {
    let variable = variable.to_ascii_lowercase();
    if variable == "state" {
        return Err(ApiError::not_found());
    }
    let client = Arc::clone(&state.client);
    let doc = tokio::task::spawn_blocking(move || query(&client, &variable))
        .await
        .map_err(|err| ApiError::internal("Amplifier task failed", err))??;
    Ok(Json(doc))
}

/// `PATCH /api/v1/state/:variable`
pub async fn modify_state(
    State(state): State<WebState>,
    Path(variable): Path<String>,
    body: String,
) -> Result<Json<AmpState>, ApiError> {
    let variable = variable.to_ascii_lowercase();
    if variable == "state" {
        return Err(ApiError::not_found());
    }
    let value: AmpValue =
        serde_json::from_str(&body).map_err(|_| ApiError::bad_request("Malformed JSON"))?;
    let client = Arc::clone(&state.client);
    let doc = tokio::task::spawn_blocking(move || modify(&client, &variable, &value))
        .await
        .map_err(|err| ApiError::internal("Amplifier task failed", err))??;
    Ok(Json(doc))
}

/// 404 for any other path under the API prefix.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// 400 for unsupported methods on the state resource.
pub async fn invalid_method(method: Method) -> ApiError {
    ApiError::bad_request(format!(
        "Invalid request method {method}, must be GET or PATCH"
    ))
}

fn query(client: &AmpClient, variable: &str) -> Result<AmpState, ApiError> {
    let mut doc = AmpState::default();
    match variable {
        "power" => doc.power = Some(query_bool(client, "Power")?),
        "mute" => doc.mute = Some(query_bool(client, "Mute")?),
        "speakera" => doc.speaker_a = Some(query_bool(client, "SpeakerA")?),
        "speakerb" => doc.speaker_b = Some(query_bool(client, "SpeakerB")?),
        "source" => doc.source = Some(query_string(client, "Source")?),
        "model" => doc.model = Some(query_string(client, "Model")?),
        _ => {
            return Err(ApiError::bad_request(format!("Invalid command: {variable}?")));
        }
    }
    Ok(doc)
}

fn query_string(client: &AmpClient, variable: &str) -> Result<String, ApiError> {
    client
        .send_cmd(Command::query(variable))
        .map(|reply| reply.value)
        .map_err(|err| {
            ApiError::internal(
                format!("Failed to get {variable} state from amplifier"),
                err,
            )
        })
}

fn query_bool(client: &AmpClient, variable: &str) -> Result<bool, ApiError> {
    Ok(is_on(&query_string(client, variable)?))
}

fn modify(client: &AmpClient, variable: &str, value: &AmpValue) -> Result<AmpState, ApiError> {
    let raw = value.value.normalized();
    let proto_var = protocol_variable(variable)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid command: {variable}={raw}")))?;

    // The volume policy check precedes command construction.
    if variable == "volume" && !client.volume_enabled() {
        return Err(ApiError::bad_request("Volume adjustment is disabled"));
    }

    let cmd = match raw {
        "+" => Command::step(proto_var, true),
        "-" => Command::step(proto_var, false),
        "?" => Command::query(proto_var),
        _ => Command::set(proto_var, raw),
    };
    // Querying goes through GET, not PATCH, even though `?` is a
    // structurally valid operator.
    if cmd.operator == Operator::Query || !cmd.valid() {
        return Err(ApiError::bad_request(format!("Invalid command: {cmd}")));
    }

    let reply = client.send_cmd(cmd).map_err(|err| match err {
        AmpError::VolumeDisabled => ApiError::bad_request("Volume adjustment is disabled"),
        AmpError::Protocol(
            cause @ (ProtocolError::InvalidCommand(_) | ProtocolError::UnknownSource(_)),
        ) => ApiError::bad_request(cause.to_string()),
        err => ApiError::internal("Could not send command to amplifier", err),
    })?;

    let mut doc = AmpState::default();
    match reply.variable.to_ascii_lowercase().as_str() {
        "power" => doc.power = Some(is_on(&reply.value)),
        "mute" => doc.mute = Some(is_on(&reply.value)),
        "speakera" => doc.speaker_a = Some(is_on(&reply.value)),
        "speakerb" => doc.speaker_b = Some(is_on(&reply.value)),
        "source" => doc.source = Some(reply.value),
        "model" => doc.model = Some(reply.value),
        "volume" => doc.volume = reply.volume,
        _ => {}
    }
    Ok(doc)
}
