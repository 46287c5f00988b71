pub mod blob_id;
pub mod lenient;
pub mod model;
pub mod stats;
pub mod test_id;

pub use blob_id::{BlobId, ParseBlobIdError};
pub use model::{Case, CaseDamage, Database, ProductFailure, Test};
pub use stats::{Statistics, TestFilter};
pub use test_id::TestIdGenerator;
