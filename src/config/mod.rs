mod schema;

pub use schema::{Config, GeneratorConfig, HeartbeatConfig, SpeechConfig};
