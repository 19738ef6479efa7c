use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    classification::{
        ports::ChatTransport,
        value_objects::{Channel, Endpoint, ResponseFormat, TransportRequest},
    },
    common::{LLMConfig, entities::app_errors::CoreError},
};

const WIRE_USER_AGENT: &str = "food-classifier/1.0";
const ORGANIZATION_HEADER: &str = "openai-organization";
const PROJECT_HEADER: &str = "openai-project";

/// OpenAI-compatible transport over the `/responses` and `/chat/completions`
/// surfaces.
///
/// The client channel honours proxy settings and sends organization/project
/// headers; the wire channel bypasses proxies and sends an ASCII-only body.
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    api_key: Option<String>,
    base_url: String,
    organization: Option<String>,
    project: Option<String>,
    client: Client,
    wire: Client,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<ResponsesMessage<'a>>,
    max_output_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<ResponsesText<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponsesMessage<'a> {
    role: &'static str,
    content: Vec<ResponsesPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponsesPart<'a> {
    InputText { text: &'a str },
    InputImage { image_url: String },
}

#[derive(Debug, Serialize)]
struct ResponsesText<'a> {
    format: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ChatResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: ChatContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent<'a> {
    Text(&'a str),
    Parts(Vec<ChatPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn data_url(image_b64: &str) -> String {
    format!("data:image/jpeg;base64,{}", image_b64)
}

fn responses_body(request: &TransportRequest) -> Result<Value, CoreError> {
    let mut content = vec![ResponsesPart::InputText {
        text: &request.prompt,
    }];
    if let Some(image) = &request.image_b64 {
        content.push(ResponsesPart::InputImage {
            image_url: data_url(image),
        });
    }

    let text = match &request.format {
        ResponseFormat::JsonSchema { name, schema } => Some(ResponsesText {
            format: JsonSchemaFormat {
                kind: "json_schema",
                name,
                schema,
                strict: true,
            },
        }),
        _ => None,
    };

    serde_json::to_value(ResponsesRequest {
        model: &request.model,
        input: vec![ResponsesMessage {
            role: "user",
            content,
        }],
        max_output_tokens: request.max_tokens,
        temperature: 0.0,
        text,
    })
    .map_err(|e| CoreError::Encoding(e.to_string()))
}

fn chat_body(request: &TransportRequest) -> Result<Value, CoreError> {
    let content = match &request.image_b64 {
        Some(image) => ChatContent::Parts(vec![
            ChatPart::Text {
                text: &request.prompt,
            },
            ChatPart::ImageUrl {
                image_url: ImageUrl {
                    url: data_url(image),
                },
            },
        ]),
        None => ChatContent::Text(&request.prompt),
    };

    let response_format = match request.format {
        ResponseFormat::None => None,
        _ => Some(ChatResponseFormat {
            kind: "json_object",
        }),
    };

    serde_json::to_value(ChatRequest {
        model: &request.model,
        messages: vec![ChatMessage {
            role: "user",
            content,
        }],
        max_tokens: request.max_tokens,
        temperature: 0.0,
        response_format,
    })
    .map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Serializes `value` with every non-ASCII character written as a `\uXXXX`
/// escape (surrogate pairs above U+FFFF).
pub fn to_ascii_json(value: &Value) -> Result<String, CoreError> {
    let json = serde_json::to_string(value).map_err(|e| CoreError::Encoding(e.to_string()))?;

    let mut escaped = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            escaped.push(c);
            continue;
        }
        for unit in c.encode_utf16(&mut units) {
            escaped.push_str(&format!("\\u{:04x}", unit));
        }
    }
    Ok(escaped)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, CoreError> {
    if !value.is_ascii() {
        return Err(CoreError::Encoding(format!(
            "header '{}' contains non-ASCII characters",
            name
        )));
    }
    HeaderValue::from_str(value)
        .map_err(|e| CoreError::Encoding(format!("invalid header '{}': {}", name, e)))
}

fn extract_responses_text(body: ResponsesResponse) -> Option<String> {
    if let Some(text) = body.output_text
        && !text.is_empty()
    {
        return Some(text);
    }

    let joined: String = body
        .output
        .into_iter()
        .flat_map(|item| item.content)
        .filter_map(|part| part.text)
        .collect();
    (!joined.is_empty()).then_some(joined)
}

fn extract_chat_text(body: ChatResponse) -> Option<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.is_empty())
}

impl OpenAiTransport {
    pub fn new(config: &LLMConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::Setup(format!("failed to build HTTP client: {}", e)))?;

        let wire = Client::builder()
            .timeout(config.timeout)
            .no_proxy()
            .build()
            .map_err(|e| CoreError::Setup(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            organization: config.organization.clone().filter(|v| !v.is_empty()),
            project: config.project.clone().filter(|v| !v.is_empty()),
            client,
            wire,
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    fn headers(&self, channel: Channel) -> Result<HeaderMap, CoreError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CoreError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value("authorization", &format!("Bearer {}", api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match channel {
            Channel::Client => {
                if let Some(org) = &self.organization {
                    headers.insert(
                        HeaderName::from_static(ORGANIZATION_HEADER),
                        header_value(ORGANIZATION_HEADER, org)?,
                    );
                }
                if let Some(project) = &self.project {
                    headers.insert(
                        HeaderName::from_static(PROJECT_HEADER),
                        header_value(PROJECT_HEADER, project)?,
                    );
                }
            }
            Channel::Wire => {
                headers.insert(USER_AGENT, HeaderValue::from_static(WIRE_USER_AGENT));
            }
        }
        Ok(headers)
    }

    async fn post(&self, request: &TransportRequest) -> Result<String, CoreError> {
        let body = match request.endpoint {
            Endpoint::Responses => responses_body(request)?,
            Endpoint::ChatCompletions => chat_body(request)?,
        };
        let headers = self.headers(request.channel)?;

        let builder = match request.channel {
            Channel::Client => self.client.post(self.url(request.endpoint)).json(&body),
            Channel::Wire => self
                .wire
                .post(self.url(request.endpoint))
                .body(to_ascii_json(&body)?),
        };

        let response = builder.headers(headers).send().await.map_err(|e| {
            tracing::error!(model = %request.model, "chat API request failed: {}", e);
            CoreError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(model = %request.model, %status, "chat API returned an error: {}", detail);

            if status == StatusCode::BAD_REQUEST && !request.format.is_none() {
                return Err(CoreError::SchemaRejected {
                    status: status.as_u16(),
                    detail,
                });
            }
            return Err(CoreError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let text = match request.endpoint {
            Endpoint::Responses => response
                .json::<ResponsesResponse>()
                .await
                .map(extract_responses_text),
            Endpoint::ChatCompletions => response
                .json::<ChatResponse>()
                .await
                .map(extract_chat_text),
        }
        .map_err(|e| {
            tracing::error!("failed to parse chat API response: {}", e);
            CoreError::MalformedResponse(e.to_string())
        })?;

        text.ok_or_else(|| CoreError::MalformedResponse("response carried no text".to_string()))
    }
}

impl ChatTransport for OpenAiTransport {
    async fn send(&self, request: TransportRequest) -> Result<String, CoreError> {
        self.post(&request).await
    }
}
