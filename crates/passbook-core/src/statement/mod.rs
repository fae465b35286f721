//! Statement extraction: classification, block reconstruction, field
//! mapping and balance reconciliation.

pub mod amount;
pub mod blocks;
pub mod classifier;
pub mod institutions;
pub mod mapper;
pub mod noise;
pub mod orchestrator;
pub mod patterns;
pub mod reconcile;
pub mod repair;
pub mod schema;

pub use blocks::{BlockReconstructor, RowBlock, TextBlock, TransactionBlock};
pub use classifier::{Classification, DocumentClassifier};
pub use mapper::{FieldMapper, MappedBlock};
pub use noise::{LineNoiseFilter, NoiseRule};
pub use orchestrator::{ExtractionOrchestrator, Strategy};
pub use reconcile::{Reconciled, Reconciler};
pub use repair::Repair;
pub use schema::{InstitutionSchema, SchemaRegistry, SourceKind};
