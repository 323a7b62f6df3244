use proc_macro2::TokenStream;
use quote::quote;

use crate::compile::ModelPlan;
use crate::utils::naming::slots_struct_name;

/// Generator for the persisted backing slots and their keyed encode/decode
pub struct SerializationGenerator<'a> {
    plan: &'a ModelPlan,
}

impl<'a> SerializationGenerator<'a> {
    pub fn new(plan: &'a ModelPlan) -> Self {
        Self { plan }
    }

    pub fn generate(&self) -> TokenStream {
        let mut output = self.generate_slots_struct();
        output.extend(self.generate_record_impl());
        output
    }

    /// `<Model>Slots`: one backing slot per persisted field, with the model's
    /// derives forwarded.
    fn generate_slots_struct(&self) -> TokenStream {
        let slots = slots_struct_name(&self.plan.name);
        let vis = &self.plan.vis;
        let derives = &self.plan.derives;
        let fields = self.plan.persisted.iter().map(|field| {
            let name = &field.name;
            let ty = &field.ty;
            quote!(#name: #ty)
        });

        quote! {
            #(#derives)*
            #[doc(hidden)]
            #vis struct #slots {
                #(#fields,)*
            }
        }
    }

    fn generate_record_impl(&self) -> TokenStream {
        let slots = slots_struct_name(&self.plan.name);
        let keys = &self.plan.keys.enum_ident;

        let encodes = self.plan.persisted.iter().map(|field| {
            let name = &field.name;
            let case = &field.key.case;
            quote!(encoder.encode(&self.#name, #keys::#case)?;)
        });
        let decodes = self.plan.persisted.iter().map(|field| {
            let name = &field.name;
            let case = &field.key.case;
            quote!(#name: decoder.decode(#keys::#case)?,)
        });

        quote! {
            impl ::docbase_store::traits::PersistedRecord for #slots {
                type Keys = #keys;

                fn encode_record(
                    &self,
                    encoder: &mut ::docbase_store::container::KeyedEncoder<Self::Keys>,
                ) -> ::std::result::Result<(), ::docbase_store::error::EncodeError> {
                    #(#encodes)*
                    Ok(())
                }

                fn decode_record(
                    decoder: &::docbase_store::container::KeyedDecoder<'_, Self::Keys>,
                ) -> ::std::result::Result<Self, ::docbase_store::error::DecodeError> {
                    Ok(Self {
                        #(#decodes)*
                    })
                }
            }
        }
    }
}
