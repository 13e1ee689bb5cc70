//! # Trellis
//!
//! Turns data-shaped query requests into joinable query structures.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           Request (PathSpec values or JSON)              │
//! │     select / group_by / order_by / aggregate             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolve]
//! ┌─────────────────────────────────────────────────────────┐
//! │      PathResolver            JoinRegistry                │
//! │  (paths against the      (one join per chain,            │
//! │   SchemaGraph)            unique aliases)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Selector → Grouper → Sorter → Aggregator               │
//! │   folding into one Accumulator                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          Accumulator { query, errors }                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The schema is read-only and shared by reference; each build owns its
//! query, error list and join registry.

pub mod config;
pub mod error;
pub mod planner;
pub mod query;
pub mod request;
pub mod resolve;
pub mod schema;

pub use config::Settings;
pub use error::{BuildError, BuildResult, ErrorKind, ErrorRecord};
pub use planner::{Accumulator, AggregateFn, AggregateSpec, QueryBuilder};
pub use query::{Expr, Query};
pub use request::{BuildRequest, RequestError};
pub use resolve::{DerivedSpec, PathSpec};
pub use schema::{Cardinality, EntityDef, Schema, SchemaError, SchemaGraph};
