#![cfg_attr(not(feature = "std"), no_std)]

pub mod collect_view;
pub mod position;
pub mod record;
pub mod routing;

pub use collect_view::CollectViewMessage;
pub use position::Position;
pub use record::{next_seqno, DecodedRecord, RoutingBlob, TelemetryRecord};
pub use routing::{LinkId, RoutingMetrics};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Record does not fit in {capacity} bytes")]
    RecordOverflow { capacity: usize },

    #[error("Incorrect record length (expected {expected}, got {actual})")]
    IncorrectLength { expected: usize, actual: usize },

    #[error("Routing blob declares {declared} words, expected {expected}")]
    IncorrectBlobLength { expected: u16, declared: u16 },
}
