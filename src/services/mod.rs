pub mod expiry;
pub mod links;
pub mod location;
pub mod resolver;
pub mod short_code;
pub mod validation;

pub use links::{LinkService, LinkSettings};
pub use location::LocationLookup;
pub use resolver::RedirectResolver;
pub use short_code::ShortCodeAllocator;
