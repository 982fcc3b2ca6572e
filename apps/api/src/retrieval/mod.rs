// Question retrieval: index builder + similarity search over the interview question corpus.
// The embedding runtime and the storage format sit behind traits so either can be swapped.

pub mod builder;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod search;
pub mod store;
