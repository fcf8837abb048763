pub mod pool;

pub use pool::{
    begin_serializable, create_pool, run_migrations, Database, DatabaseError,
};
