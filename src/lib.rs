//! CPF lookup and PIX charge proxy.
//!
//! Two stateless HTTP endpoints in front of third-party services:
//!
//! - `POST|GET /api/consulta-cpf`: normalizes a CPF, queries the lookup API
//!   and relays the identity fields found.
//! - `POST /api/pagamento`: normalizes customer fields, creates a fixed-amount
//!   PIX transaction and relays the QR code.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `docs`: OpenAPI document and Swagger UI.
//! - `errors`: Error taxonomy and the JSON failure envelope.
//! - `handlers`: HTTP request handlers and shared state.
//! - `models`: Request, response and upstream payload types.
//! - `routes`: Router and middleware stack.
//! - `services`: Outbound clients for the lookup and PIX APIs.
//! - `validation`: Digit-stripping and length checks.

pub mod config;
pub mod docs;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

pub use routes::create_router;
