pub mod fetcher;
pub mod http;
pub mod local;
pub mod memory;
pub mod traits;

pub use fetcher::{FetchError, ObjectFetcher, RawLogBlob};
pub use http::HttpObjectStore;
pub use local::LocalFsObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::{ObjectStore, StorageError};
