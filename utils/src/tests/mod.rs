#[cfg(all(feature = "context", feature = "prelude"))]
mod context;
