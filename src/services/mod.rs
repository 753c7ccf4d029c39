//! Services implementing the publication workflow.
//!
//! - `detect`: resolve the run's candidate articles from the change event
//! - `extract`: pull title/category/image metadata out of a document
//! - `ledger`: idempotent publication ledger (fail-open dedup)
//! - `compose`: bounded-length post text assembly
//! - `enhance`: optional generative text enhancement
//! - `images`: representative image loading for upload
//! - `publish`: signed posting to the X API

pub mod compose;
pub mod detect;
pub mod enhance;
pub mod extract;
pub mod images;
pub mod ledger;
pub mod publish;

pub use compose::PostComposer;
pub use detect::ChangeEventSource;
pub use enhance::{GenAiEnhancer, TextEnhancer};
pub use extract::ArticleExtractor;
pub use images::ImagePreparer;
pub use ledger::{HttpLedger, Ledger, publication_key};
pub use publish::{Publisher, XPublisher};
