pub mod accessors;
pub mod migration;
pub mod serialization;

pub use accessors::AccessorGenerator;
pub use migration::MigrationGenerator;
pub use serialization::SerializationGenerator;

use proc_macro2::TokenStream;

use crate::compile::ModelPlan;
use crate::generators::coding_key::CodingKeyGenerator;
use crate::keys::KeySource;

/// Combines every fragment emitted for one model, in place of its struct.
pub struct ModelGenerator<'a> {
    plan: &'a ModelPlan,
}

impl<'a> ModelGenerator<'a> {
    pub fn new(plan: &'a ModelPlan) -> Self {
        Self { plan }
    }

    pub fn generate(&self) -> TokenStream {
        let mut output = TokenStream::new();

        // Declared enums stay where the user wrote them and carry their own
        // `#[derive(CodingKey)]`.
        if self.plan.keys.source == KeySource::Implicit {
            output.extend(CodingKeyGenerator::from_key_set(&self.plan.keys).generate_enum(&self.plan.vis));
        }

        output.extend(AccessorGenerator::new(self.plan).generate());
        output.extend(SerializationGenerator::new(self.plan).generate());
        output.extend(MigrationGenerator::new(self.plan).generate());
        output
    }
}
