pub mod coding_key;
pub mod model;

pub use coding_key::CodingKeyGenerator;
pub use model::ModelGenerator;
