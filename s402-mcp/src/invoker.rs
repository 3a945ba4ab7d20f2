//! The tool-invocation boundary.
//!
//! [`ToolInvoker`] is the contract the negotiator requires from the
//! surrounding MCP client: perform one call and classify the response as a
//! success, a payment demand, or a tool error. [`McpToolInvoker`] adapts any
//! raw MCP session ([`McpCaller`]) to that contract by recognizing the x402
//! payment-required payloads in tool error results.

use std::sync::Arc;

use s402::BoxFuture;

use crate::error::{McpPaymentError, PaymentRequiredSignal};
use crate::extract;
use crate::types::{CallToolParams, CallToolResult};

/// Classified response of a single tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    /// The tool ran and produced a result.
    Success(CallToolResult),
    /// The tool demands payment before it will run.
    PaymentRequired(PaymentRequiredSignal),
    /// The tool failed for a reason unrelated to payment.
    Error {
        /// Error category.
        kind: String,
        /// Error message.
        message: String,
    },
}

/// Performs MCP tool calls on behalf of the negotiator.
///
/// An `Err` return is a transport failure; the negotiator passes it through
/// unchanged.
pub trait ToolInvoker: Send + Sync {
    /// Calls a tool once.
    fn call(&self, params: CallToolParams) -> BoxFuture<'_, Result<ToolResponse, McpPaymentError>>;
}

impl<T: ToolInvoker + ?Sized> ToolInvoker for Arc<T> {
    fn call(&self, params: CallToolParams) -> BoxFuture<'_, Result<ToolResponse, McpPaymentError>> {
        (**self).call(params)
    }
}

/// Trait abstracting raw MCP tool call capability.
///
/// Implement this trait to integrate with any MCP SDK. The implementation
/// should forward `call_tool` to the underlying MCP session/client and map
/// transport failures to [`McpPaymentError::ToolCallFailed`].
///
/// # Examples
///
/// ```rust,ignore
/// struct MyMcpSession { /* ... */ }
///
/// impl McpCaller for MyMcpSession {
///     fn call_tool(
///         &self,
///         params: CallToolParams,
///     ) -> BoxFuture<'_, Result<CallToolResult, McpPaymentError>> {
///         Box::pin(async move {
///             let raw = self.session.call_tool(params.name, params.arguments).await
///                 .map_err(|e| McpPaymentError::ToolCallFailed(e.to_string()))?;
///             Ok(raw.into())
///         })
///     }
/// }
/// ```
pub trait McpCaller: Send + Sync {
    /// Calls an MCP tool with the given parameters.
    fn call_tool(
        &self,
        params: CallToolParams,
    ) -> BoxFuture<'_, Result<CallToolResult, McpPaymentError>>;
}

/// Error kind reported for tool errors that carry no payment demand.
pub const TOOL_ERROR_KIND: &str = "tool";

/// [`ToolInvoker`] over a raw MCP session.
#[derive(Debug, Clone)]
pub struct McpToolInvoker<C> {
    caller: C,
}

impl<C: McpCaller> McpToolInvoker<C> {
    /// Wraps an MCP caller.
    pub const fn new(caller: C) -> Self {
        Self { caller }
    }

    /// Returns a reference to the underlying MCP caller.
    pub const fn caller(&self) -> &C {
        &self.caller
    }
}

impl<C: McpCaller> ToolInvoker for McpToolInvoker<C> {
    fn call(&self, params: CallToolParams) -> BoxFuture<'_, Result<ToolResponse, McpPaymentError>> {
        Box::pin(async move {
            let result = self.caller.call_tool(params).await?;
            classify(result)
        })
    }
}

/// Sorts a raw tool result into a [`ToolResponse`].
///
/// # Errors
///
/// - [`McpPaymentError::MalformedRequirements`] if the result carries a
///   payment demand whose requirements do not parse
/// - [`McpPaymentError::InvalidRequirements`] if the declared amount is unusable
pub fn classify(result: CallToolResult) -> Result<ToolResponse, McpPaymentError> {
    if !result.is_error {
        return Ok(ToolResponse::Success(result));
    }
    if let Some(extracted) = extract::extract_payment_required_from_result(&result)
        .map_err(McpPaymentError::MalformedRequirements)?
    {
        let signal = PaymentRequiredSignal::new(extracted.requirements, extracted.message)?;
        return Ok(ToolResponse::PaymentRequired(signal));
    }
    Ok(ToolResponse::Error {
        kind: TOOL_ERROR_KIND.to_owned(),
        message: result
            .first_text()
            .unwrap_or("tool returned an error")
            .to_owned(),
    })
}
