pub mod backend;
pub mod cache;
pub mod file;
pub mod library;
pub mod redis;

pub use self::backend::StorageBackend;
pub use self::cache::{Cached, TtlCache};
pub use self::file::FileBackend;
pub use self::library::LibraryStore;
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;
pub use self::redis::RedisBackend;

#[cfg(test)]
pub use self::backend::MockStorageBackend;
