pub mod compatible;
pub mod factory;
pub mod http_client;
pub mod reliable;
pub mod scrub;
pub mod traits;
pub mod types;

pub use compatible::OpenAiCompatibleProvider;
pub use factory::{create_provider, create_resilient_provider};
pub use reliable::ReliableProvider;
pub use traits::Provider;
pub use types::OracleRequest;
