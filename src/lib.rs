// Grid store: cells, ownership records, atomic claims
pub mod core;

// Identity tokens and credential extraction
pub mod auth;

// Middleware
pub mod middleware;

// Services (claim write path, subscriber fan-out)
pub mod services;

// API models (requests/responses)
pub mod models;

// HTTP and WebSocket routes
pub mod routes;

// Router assembly
pub mod app;

// Environment configuration
pub mod config;

// Application state
pub mod state;
