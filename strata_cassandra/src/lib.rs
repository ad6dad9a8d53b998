pub mod memory;
pub mod session;
pub mod statement;

pub use memory::MemorySession;
pub use session::{CassandraSession, SessionError};
pub use statement::{ConsistencyLevel, Mutation, MutationBatch};
