pub mod image;
pub mod loaders;
pub mod reference;
pub mod report;

pub use image::{ImageFormat, UploadedImage};
pub use loaders::{load_reference_table, read_reference_table, TableSchema};
pub use reference::{format_candidates, ReferenceQuestionRecord, ReferenceTable};
pub use report::PipelineReport;
