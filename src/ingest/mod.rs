pub mod downloader;
pub mod hybrid;
pub mod pipeline;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;
