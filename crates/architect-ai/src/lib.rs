pub mod chat;
pub mod engine;
pub mod mode;
pub mod prompts;
pub mod schematic;
pub mod stress;

pub use chat::{compose_and_send, ChatReply};
pub use mode::decide_mode;
pub use schematic::compose_schematic;
pub use stress::estimate;
