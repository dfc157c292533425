mod open_ai;

pub use open_ai::{decode_image, OpenAIProvider, IMAGE_SIZE};
