//! Utility functions for the x402 wire shapes carried by MCP tool calls.
//!
//! These functions work with [`serde_json::Value`] maps, making them
//! framework-agnostic and compatible with any MCP SDK implementation.

use s402::encoding;
use s402::error::DecodeError;
use s402::proto::{PaymentProof, PaymentRequirements};
use serde_json::Value;

use crate::types::{CallToolResult, ContentItem, ToolArguments};
use crate::{PAYMENT_ERROR_KEY, PAYMENT_REQUIRED_CODE};

/// Key holding the requirements in the flat payment-required shape.
const REQUIREMENTS_KEY: &str = "paymentRequirements";

/// Payment demand parsed out of a tool error result.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPaymentRequired {
    /// The declared requirements.
    pub requirements: PaymentRequirements,
    /// Optional server message.
    pub message: Option<String>,
}

/// Extracts a payment demand from an MCP tool error result.
///
/// Two payload shapes are recognized:
///
/// 1. The envelope `{"x402/error": {"code": 402, "message": ..., "data": {..}}}`
/// 2. The flat form `{"paymentRequirements": {..}, "error": ...}`
///
/// `structuredContent` is checked first; the text content items are parsed
/// as JSON as a fallback.
///
/// Returns `Ok(None)` if the result is not an error or carries no payment
/// demand.
///
/// # Errors
///
/// Returns `Err` if a payload is recognized as a payment demand but its
/// requirements do not parse.
pub fn extract_payment_required_from_result(
    result: &CallToolResult,
) -> Result<Option<ExtractedPaymentRequired>, serde_json::Error> {
    if !result.is_error {
        return Ok(None);
    }

    // Preferred path: structuredContent
    if let Some(sc) = &result.structured_content
        && let Some(pr) = try_parse_payment_required_from_value(sc)
    {
        return pr.map(Some);
    }

    // Fallback: parse text items as JSON
    result
        .content
        .iter()
        .filter_map(ContentItem::as_text)
        .find_map(try_parse_payment_required_from_text)
        .transpose()
}

/// Builds the error result a paid tool returns when no proof was supplied.
///
/// Uses the `x402/error` envelope in both `content[0].text` and
/// `structuredContent`, with `isError: true`.
///
/// # Errors
///
/// Returns `Err` if the requirements cannot be serialized.
pub fn payment_required_result(
    requirements: &PaymentRequirements,
    message: &str,
) -> Result<CallToolResult, serde_json::Error> {
    let envelope = wrap_x402_error_envelope(requirements, message)?;
    let text = serde_json::to_string(&envelope)?;
    Ok(CallToolResult {
        content: vec![ContentItem::text(text)],
        is_error: true,
        structured_content: Some(envelope),
    })
}

/// Wraps requirements in the `x402/error` envelope.
///
/// # Errors
///
/// Returns `Err` if the requirements cannot be serialized.
pub fn wrap_x402_error_envelope(
    requirements: &PaymentRequirements,
    message: &str,
) -> Result<Value, serde_json::Error> {
    Ok(serde_json::json!({
        PAYMENT_ERROR_KEY: {
            "code": PAYMENT_REQUIRED_CODE,
            "message": message,
            "data": serde_json::to_value(requirements)?,
        }
    }))
}

/// Returns a copy of `arguments` with `token` added under `field`.
///
/// Returns `None` if `arguments` already holds a value under `field`; the
/// caller's arguments are never overwritten.
#[must_use]
pub fn attach_proof_to_arguments(
    arguments: &ToolArguments,
    field: &str,
    token: String,
) -> Option<ToolArguments> {
    if arguments.contains_key(field) {
        return None;
    }
    let mut with_proof = arguments.clone();
    with_proof.insert(field.to_owned(), Value::String(token));
    Some(with_proof)
}

/// Decodes a proof attached to call arguments under `field`.
///
/// Returns `None` if no string value is present under `field`.
#[must_use]
pub fn extract_proof_from_arguments(
    arguments: &ToolArguments,
    field: &str,
) -> Option<Result<PaymentProof, DecodeError>> {
    let token = arguments.get(field)?.as_str()?;
    Some(encoding::decode(token))
}

/// Attempts to parse a payment demand from a JSON value.
///
/// `None` means the value is not a payment demand; `Some(Err(..))` means it
/// is one with unparseable requirements.
fn try_parse_payment_required_from_value(
    value: &Value,
) -> Option<Result<ExtractedPaymentRequired, serde_json::Error>> {
    let obj = value.as_object()?;

    if let Some(envelope) = obj.get(PAYMENT_ERROR_KEY).and_then(Value::as_object) {
        if envelope.get("code")?.as_i64()? != PAYMENT_REQUIRED_CODE {
            return None;
        }
        let data = envelope.get("data").cloned().unwrap_or(Value::Null);
        return Some(
            serde_json::from_value(data).map(|requirements| ExtractedPaymentRequired {
                requirements,
                message: string_field(envelope, "message"),
            }),
        );
    }

    let data = obj.get(REQUIREMENTS_KEY)?.clone();
    Some(
        serde_json::from_value(data).map(|requirements| ExtractedPaymentRequired {
            requirements,
            message: string_field(obj, "error").or_else(|| string_field(obj, "message")),
        }),
    )
}

/// Attempts to parse a payment demand from a JSON text string.
fn try_parse_payment_required_from_text(
    text: &str,
) -> Option<Result<ExtractedPaymentRequired, serde_json::Error>> {
    let value: Value = serde_json::from_str(text).ok()?;
    try_parse_payment_required_from_value(&value)
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}
