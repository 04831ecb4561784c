mod client;

pub use client::{MqttIngestClient, MqttTuning};
