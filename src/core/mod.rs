pub mod etl;
pub mod ingestor;
pub mod path_builder;
pub mod report;
pub mod tokenizer;
pub mod transformer;
pub mod validator;

pub use crate::domain::model::{FlatRecord, NestedValue, Scalar};
pub use crate::domain::ports::{ConfigProvider, Sink, SinkConnection};
pub use crate::utils::error::Result;
