//! 识别-规整-补充流水线: 图片字节 -> 识别结果 (全文, 逐字注音释义, 整句翻译).
mod enrich;
mod error;
mod pipeline;
mod result;
mod stream;

pub use enrich::Enricher;
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use result::{CharacterRecord, RecognitionResult};
pub use stream::{StreamChar, build_char_stream, concat_text};
