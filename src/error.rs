// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for sitepilot
//!
//! This module defines all error types used throughout the agent core.

use thiserror::Error;

/// Main error type for sitepilot operations
#[derive(Error, Debug)]
pub enum PilotError {
    /// Provider/API-related errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Tool execution errors (unknown tool, handler failure)
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// Invalid tool arguments or malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Target document or entity could not be found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Permission denied by the access policy
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Storage errors (document store, file mirror, dedicated tables)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Rate limited by the API
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    /// Requested model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API (including malformed tool-call payloads)
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned an error
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,
}

/// Result type alias for sitepilot operations
pub type Result<T> = std::result::Result<T, PilotError>;
