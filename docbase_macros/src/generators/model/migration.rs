//! Migration adapter generation.
//!
//! Emitted only for `MigrationState::Configured`. The shadow is a private
//! copy of the persisted fields that decodes under the migration keys and
//! encodes under the model keys; the model gets `migrate` and
//! `should_migrate`, both forwarding to `docbase_store::migration`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::compile::{MigrationPlan, MigrationState, ModelPlan};
use crate::utils::naming::{migration_keys_alias, migration_shadow_name};

pub struct MigrationGenerator<'a> {
    plan: &'a ModelPlan,
}

impl<'a> MigrationGenerator<'a> {
    pub fn new(plan: &'a ModelPlan) -> Self {
        Self { plan }
    }

    pub fn generate(&self) -> TokenStream {
        match &self.plan.migration {
            MigrationState::NotConfigured => TokenStream::new(),
            MigrationState::Configured(migration) => {
                let mut output = self.generate_shadow(migration);
                output.extend(self.generate_entry_points());
                output
            }
        }
    }

    fn generate_shadow(&self, migration: &MigrationPlan) -> TokenStream {
        let model_name = self.plan.name.to_string();
        let shadow = migration_shadow_name(&self.plan.name);
        let old_alias = migration_keys_alias(&self.plan.name);
        let old_keys = &migration.old_keys.enum_ident;
        let new_keys = &self.plan.keys.enum_ident;

        let fields = self.plan.persisted.iter().map(|field| {
            let name = &field.name;
            let ty = &field.ty;
            quote!(#name: #ty)
        });

        // Old and new cases are paired through the field they are bound to.
        let decodes = self.plan.persisted.iter().filter_map(|field| {
            let name = &field.name;
            let new_case = &field.key.case;
            let old_case = &migration.old_keys.binding(name)?.case;
            Some(quote!(#name: decoder.decode(#old_alias::#old_case, #new_keys::#new_case)?,))
        });
        let encodes = self.plan.persisted.iter().map(|field| {
            let name = &field.name;
            let case = &field.key.case;
            quote!(encoder.encode(&self.#name, #new_keys::#case)?;)
        });

        quote! {
            type #old_alias = #old_keys;

            struct #shadow {
                #(#fields,)*
            }

            impl ::docbase_store::traits::MigrationShadow for #shadow {
                type OldKeys = #old_alias;
                type NewKeys = #new_keys;

                const MODEL_NAME: &'static str = #model_name;

                fn decode_old(
                    decoder: &::docbase_store::container::MigrationDecoder<'_, Self::OldKeys, Self::NewKeys>,
                ) -> ::std::result::Result<Self, ::docbase_store::error::DecodeError> {
                    Ok(Self {
                        #(#decodes)*
                    })
                }

                fn encode_new(
                    &self,
                    encoder: &mut ::docbase_store::container::KeyedEncoder<Self::NewKeys>,
                ) -> ::std::result::Result<(), ::docbase_store::error::EncodeError> {
                    #(#encodes)*
                    Ok(())
                }
            }
        }
    }

    fn generate_entry_points(&self) -> TokenStream {
        let model = &self.plan.name;
        let vis = &self.plan.vis;
        let shadow = migration_shadow_name(model);

        quote! {
            impl #model {
                /// Rewrites a record stored under the migration keys with the
                /// current keys. A no-op for records that are already current.
                #vis fn migrate(
                    context: &::docbase_store::context::ModelContext,
                ) -> ::docbase_store::error::DocbaseResult<::docbase_store::migration::MigrationOutcome> {
                    ::docbase_store::migration::migrate::<#shadow>(context)
                }

                /// Whether the stored record still uses the migration keys.
                /// Never writes.
                #vis fn should_migrate(
                    context: &::docbase_store::context::ModelContext,
                ) -> ::docbase_store::error::DocbaseResult<bool> {
                    ::docbase_store::migration::should_migrate::<#shadow>(context)
                }
            }
        }
    }
}
