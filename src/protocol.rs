use std::sync::Arc;

use serde::{Deserialize, Serialize, de};

use crate::selection::{
    ActionDescriptor, ActionId, RequestContext, RequestId, SelectorError, SelectorErrorKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Select(RequestContext),
    Exit,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: WireMessageType,
    #[serde(default)]
    context: Option<RequestContext>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WireMessageType {
    Select,
    Exit,
}

pub fn parse_client_message(line: &str) -> Result<ClientMessage, serde_json::Error> {
    let wire: WireMessage = serde_json::from_str(line)?;
    match (wire.kind, wire.context) {
        (WireMessageType::Select, Some(context)) => Ok(ClientMessage::Select(context)),
        (WireMessageType::Select, None) => Err(de::Error::missing_field("context")),
        (WireMessageType::Exit, None) => Ok(ClientMessage::Exit),
        (WireMessageType::Exit, Some(_)) => {
            Err(de::Error::custom("exit message does not carry a context"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Selected {
        request_id: RequestId,
        action_id: ActionId,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    NoMatch {
        request_id: RequestId,
    },
    Ambiguous {
        request_id: RequestId,
        candidates: Vec<ActionId>,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn from_outcome(
        request_id: RequestId,
        outcome: Result<Option<Arc<ActionDescriptor>>, SelectorError>,
    ) -> Self {
        match outcome {
            Ok(Some(action)) => ServerMessage::Selected {
                request_id,
                action_id: action.id.clone(),
                display_name: action.display_name.clone(),
            },
            Ok(None) => ServerMessage::NoMatch { request_id },
            Err(err) if err.kind == SelectorErrorKind::AmbiguousAction => {
                ServerMessage::Ambiguous {
                    request_id,
                    candidates: err.candidates,
                }
            }
            Err(err) => ServerMessage::Error {
                request_id: Some(request_id),
                code: error_code(err.kind).to_string(),
                message: err.message,
            },
        }
    }

    pub fn invalid_message(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            request_id: None,
            code: "invalid_message".to_string(),
            message: message.into(),
        }
    }
}

fn error_code(kind: SelectorErrorKind) -> &'static str {
    match kind {
        SelectorErrorKind::InvalidArgument => "invalid_argument",
        SelectorErrorKind::AmbiguousAction => "ambiguous_action",
        SelectorErrorKind::ProviderFailure => "provider_failure",
        SelectorErrorKind::Cancelled => "cancelled",
    }
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}
