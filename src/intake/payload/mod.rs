pub mod code_payload;
pub mod decoder;

pub use code_payload::CodePayload;
pub use decoder::PayloadDecoder;
