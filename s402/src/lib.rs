#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 payment handshake on Solana.
//!
//! This crate holds the value types exchanged when an MCP tool answers a call
//! with "payment required": the server-declared [`proto::PaymentRequirements`],
//! the UI-facing [`proto::PaymentInfo`] projection, and the signed
//! [`proto::PaymentProof`] a client attaches when it retries the call.
//!
//! It carries no I/O and no runtime. The negotiation flow that drives these
//! types lives in the `s402-mcp` crate.
//!
//! # Modules
//!
//! - [`amount`] - Conversion between atomic token units and decimal amounts
//! - [`encoding`] - The proof codec (JSON + base64) and raw base64 helpers
//! - [`error`] - Error types for amounts, proofs and decoding
//! - [`networks`] - Registry of well-known Solana networks and USDC mints
//! - [`proto`] - Wire format types for requirements, payment info and proofs
//! - [`timestamp`] - Millisecond Unix timestamps
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

use std::future::Future;
use std::pin::Pin;

pub mod amount;
pub mod encoding;
pub mod error;
pub mod networks;
pub mod proto;
pub mod timestamp;

/// A boxed, `Send` future used by the object-safe collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
