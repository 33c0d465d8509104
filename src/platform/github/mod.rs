mod client;

pub use client::GitHubSink;
