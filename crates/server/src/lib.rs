//! Lobcast Server - HTTP surface over the local prediction pipeline
//!
//! | Method | Path                | Body                    |
//! |--------|---------------------|-------------------------|
//! | POST   | `/api/predict-json` | `{"data": [row, ...]}`  |
//! | POST   | `/api/predict`      | CSV with a header row   |
//! | GET    | `/api/health`       |                         |
//! | GET    | `/api/models`       |                         |
//! | GET    | `/api/capabilities` |                         |
//! | GET    | `/api/`             |                         |
//!
//! The live result stream (`GET /ws`, see [`stream`]) is served separately.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod stream;

pub use error::ApiError;
pub use router::{AppState, create_router, serve};
pub use stream::{StreamState, serve_stream, stream_router};
