#![cfg_attr(docsrs, feature(doc_cfg))]

//! Payment-gated MCP (Model Context Protocol) tool calls.
//!
//! This crate drives a single MCP tool call through the x402 payment-required
//! handshake: detect the server's payment demand, ask a human to approve it,
//! have a wallet sign the exact declared payment, and retry the call once
//! with the encoded proof attached.
//!
//! # Architecture
//!
//! The protocol logic is decoupled from every side effect through four
//! object-safe traits:
//!
//! - [`invoker::ToolInvoker`] - performs the MCP call and classifies the response
//! - [`approval::UserApprovalGate`] - suspends until a human approves or declines
//! - [`signer::WalletSigner`] - produces the signed payment transaction
//! - [`approval::PromptPresenter`] - renders the forced-choice prompt
//!
//! # Usage
//!
//! ```rust,ignore
//! use s402_mcp::approval::ForcedChoiceGate;
//! use s402_mcp::invoker::McpToolInvoker;
//! use s402_mcp::negotiator::PaymentNegotiator;
//!
//! let negotiator = PaymentNegotiator::builder(
//!     McpToolInvoker::new(my_mcp_session),
//!     Box::new(ForcedChoiceGate::new(my_dialog)),
//!     Box::new(my_wallet),
//! )
//! .build();
//!
//! // Paid tools prompt once, sign once, and retry once.
//! let result = negotiator.invoke("get_weather", args).await?;
//! ```
//!
//! # Utility Functions
//!
//! The [`extract`] module provides low-level helpers for the wire shapes:
//!
//! - [`extract::extract_payment_required_from_result`] - Extract 402 info from error results
//! - [`extract::payment_required_result`] - Build a 402 error result (server side)
//! - [`extract::attach_proof_to_arguments`] - Attach an encoded proof to call arguments
//! - [`extract::extract_proof_from_arguments`] - Decode a proof from call arguments
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod approval;
pub mod config;
pub mod error;
pub mod extract;
pub mod invoker;
pub mod negotiator;
pub mod signer;
pub mod types;

/// Default argument name under which the encoded proof is attached to a retry.
pub const PAYMENT_PROOF_ARG: &str = "x402Payment";

/// JSON-RPC error code for payment required (x402).
pub const PAYMENT_REQUIRED_CODE: i64 = 402;

/// MCP error envelope key for x402 payment errors.
///
/// Paid tools report a payment demand as a tool error shaped like:
/// ```json
/// { "x402/error": { "code": 402, "message": "...", "data": { /* PaymentRequirements */ } } }
/// ```
pub const PAYMENT_ERROR_KEY: &str = "x402/error";
