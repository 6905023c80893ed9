//! # Crypto Price Agent
//!
//! A one-page web front-end that answers "what is the price of X?" for a
//! cryptocurrency by asking a hosted model, which may call a single price
//! lookup tool backed by the Coinlore tickers API.
//!
//! ## Request Flow
//!
//! ```text
//!   browser ──POST /──▶ api::routes ──▶ agent::Agent ──▶ llm::GeminiClient ──▶ Gemini
//!                                            │  ▲
//!                                            ▼  │ {"name","symbol","price_usd"} | {"error"}
//!                                    tools::GetCryptoPrice ──GET──▶ Coinlore
//! ```
//!
//! ## Modules
//! - `config`: environment-driven configuration
//! - `llm`: chat-completions types and the model client trait
//! - `tools`: tool trait, registry and the price lookup
//! - `agent`: persona + tools + model run loop
//! - `api`: HTTP server and page rendering

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use agent::{crypto_data_agent, price_prompt, Agent, RunResult};
pub use config::Config;
