mod error;
mod external;
mod lines;
mod normalize;
mod ocr;
mod pp_ocr;
mod raw;

pub use error::OcrError;
pub use external::ExternalRecognizer;
pub use lines::split_lines;
pub use normalize::{PixelArray, normalize_image};
pub use ocr::{Detection, Recognizer, detect};
pub use pp_ocr::PPOcr;
pub use raw::{DEFAULT_CONFIDENCE, RawConfidence, RawDetection, RawOutput, RawPair};
