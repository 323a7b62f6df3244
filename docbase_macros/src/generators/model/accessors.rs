//! Accessor synthesis
//!
//! The model struct keeps ignored fields as plain backing slots and every
//! persisted field inside a lazily loaded `PersistedSlots<<Model>Slots>`.
//! Persisted getters load on first use. Persisted setters notify the sink,
//! assign, and write the whole record back before returning; a failed write
//! puts the previous value back.
//!
//! Locals and parameters introduced by the generated bodies carry the
//! reserved `__` prefix so they never capture a user field of the same name.

use proc_macro2::TokenStream;
use quote::quote;

use crate::compile::{IgnoredField, ModelPlan, PersistedField};
use crate::parse::attributes::doc_attrs;
use crate::utils::naming::{context_field, setter_name, slots_field, slots_struct_name};

pub struct AccessorGenerator<'a> {
    plan: &'a ModelPlan,
}

impl<'a> AccessorGenerator<'a> {
    pub fn new(plan: &'a ModelPlan) -> Self {
        Self { plan }
    }

    pub fn generate(&self) -> TokenStream {
        let model = &self.plan.name;
        let model_struct = self.generate_model_struct();
        let constants = self.generate_constants();
        let persisted = self.plan.persisted.iter().map(|field| self.persisted_accessors(field));
        let ignored = self.plan.ignored.iter().map(|field| self.ignored_accessors(field));
        let constructors = self.generate_constructors();
        let record_ops = self.generate_record_ops();
        let model_impl = self.generate_model_trait_impl();

        quote! {
            #model_struct

            impl #model {
                #constants
                #constructors
                #record_ops
                #(#persisted)*
                #(#ignored)*
            }

            #model_impl
        }
    }

    fn generate_model_struct(&self) -> TokenStream {
        let model = &self.plan.name;
        let vis = &self.plan.vis;
        let attrs = &self.plan.attrs;
        let slots = slots_struct_name(model);
        let slots_field = slots_field();
        let context_field = context_field();
        let ignored = self.plan.ignored.iter().map(|field| {
            let name = &field.name;
            let ty = &field.ty;
            quote!(#name: #ty)
        });

        quote! {
            #(#attrs)*
            #vis struct #model {
                #(#ignored,)*
                #slots_field: ::docbase_store::slots::PersistedSlots<#slots>,
                #context_field: ::docbase_store::context::ModelContext,
            }
        }
    }

    fn generate_constants(&self) -> TokenStream {
        let vis = &self.plan.vis;
        let model_name = self.plan.name.to_string();
        let storage_name = &self.plan.storage_name;

        quote! {
            #vis const MODEL_NAME: &'static str = #model_name;
            #vis const STORAGE_NAME: &'static str = #storage_name;
        }
    }

    fn persisted_accessors(&self, field: &PersistedField) -> TokenStream {
        let vis = &field.vis;
        let name = &field.name;
        let ty = &field.ty;
        let label = &field.label;
        let setter = setter_name(name);
        let docs = doc_attrs(&field.attrs);
        let slots_field = slots_field();
        let context_field = context_field();

        quote! {
            #(#docs)*
            #vis fn #name(&self) -> ::docbase_store::error::DocbaseResult<&#ty> {
                self.#context_field.access(::docbase_store::observation::FieldId::new(Self::MODEL_NAME, #label));
                Ok(&self.#slots_field.get_or_load(&self.#context_field)?.#name)
            }

            #vis fn #setter(&mut self, value: #ty) -> ::docbase_store::error::DocbaseResult<()> {
                let __context = &self.#context_field;
                let __slots = self.#slots_field.get_mut_or_load(__context)?;
                __context.commit(
                    ::docbase_store::observation::FieldId::new(Self::MODEL_NAME, #label),
                    __slots,
                    |__record| &mut __record.#name,
                    value,
                )
            }
        }
    }

    fn ignored_accessors(&self, field: &IgnoredField) -> TokenStream {
        let vis = &field.vis;
        let name = &field.name;
        let ty = &field.ty;
        let label = &field.label;
        let docs = doc_attrs(&field.attrs);
        let context_field = context_field();

        let getter = quote! {
            #(#docs)*
            #vis fn #name(&self) -> &#ty {
                self.#context_field.access(::docbase_store::observation::FieldId::new(Self::MODEL_NAME, #label));
                &self.#name
            }
        };
        if field.constant {
            return getter;
        }

        let setter = setter_name(name);
        quote! {
            #getter

            #vis fn #setter(&mut self, value: #ty) {
                self.#context_field.mutate(
                    ::docbase_store::observation::FieldId::new(Self::MODEL_NAME, #label),
                    &mut self.#name,
                    value,
                );
            }
        }
    }

    /// Ignored field initializers for the non-`new` constructors: constants
    /// come from arguments, everything else from `Default`.
    fn ignored_initializers(&self) -> Vec<TokenStream> {
        self.plan
            .ignored
            .iter()
            .map(|field| {
                let name = &field.name;
                if field.constant {
                    quote!(#name)
                } else {
                    quote!(#name: ::std::default::Default::default())
                }
            })
            .collect()
    }

    fn constant_params(&self) -> Vec<TokenStream> {
        self.plan
            .ignored
            .iter()
            .filter(|field| field.constant)
            .map(|field| {
                let name = &field.name;
                let ty = &field.ty;
                quote!(#name: #ty)
            })
            .collect()
    }

    fn generate_constructors(&self) -> TokenStream {
        let vis = &self.plan.vis;
        let slots = slots_struct_name(&self.plan.name);
        let slots_field = slots_field();
        let context_field = context_field();

        let all_params = self
            .plan
            .persisted
            .iter()
            .map(|field| (&field.name, &field.ty))
            .chain(self.plan.ignored.iter().map(|field| (&field.name, &field.ty)))
            .map(|(name, ty)| quote!(#name: #ty));
        let persisted_names = self.plan.persisted.iter().map(|field| &field.name);
        let ignored_names = self.plan.ignored.iter().map(|field| &field.name);
        let constant_params = self.constant_params();
        let ignored_inits = self.ignored_initializers();

        quote! {
            /// Creates the model and writes its record immediately.
            #vis fn new(
                __context: ::docbase_store::context::ModelContext,
                #(#all_params),*
            ) -> ::docbase_store::error::DocbaseResult<Self> {
                let __model = Self {
                    #(#ignored_names,)*
                    #slots_field: ::docbase_store::slots::PersistedSlots::loaded(#slots {
                        #(#persisted_names,)*
                    }),
                    #context_field: __context,
                };
                __model.save()?;
                Ok(__model)
            }

            /// Binds to the stored record without reading it; the first
            /// accessor call loads it.
            #vis fn open(
                __context: ::docbase_store::context::ModelContext,
                #(#constant_params),*
            ) -> Self {
                Self {
                    #(#ignored_inits,)*
                    #slots_field: ::docbase_store::slots::PersistedSlots::unloaded(),
                    #context_field: __context,
                }
            }

            #vis fn load(
                __context: ::docbase_store::context::ModelContext,
                #(#constant_params),*
            ) -> ::docbase_store::error::DocbaseResult<Self> {
                let __record = __context.load::<#slots>()?;
                Ok(Self {
                    #(#ignored_inits,)*
                    #slots_field: ::docbase_store::slots::PersistedSlots::loaded(__record),
                    #context_field: __context,
                })
            }

            #vis fn decode_from(
                __container: &::docbase_store::container::RecordContainer,
                __context: ::docbase_store::context::ModelContext,
                #(#constant_params),*
            ) -> ::std::result::Result<Self, ::docbase_store::error::DecodeError> {
                let __record = <#slots as ::docbase_store::traits::PersistedRecord>::from_container(__container)?;
                Ok(Self {
                    #(#ignored_inits,)*
                    #slots_field: ::docbase_store::slots::PersistedSlots::loaded(__record),
                    #context_field: __context,
                })
            }
        }
    }

    fn generate_record_ops(&self) -> TokenStream {
        let vis = &self.plan.vis;
        let keys = &self.plan.keys.enum_ident;
        let slots = slots_struct_name(&self.plan.name);
        let slots_field = slots_field();
        let context_field = context_field();

        quote! {
            #vis fn encode_to(
                &self,
                encoder: &mut ::docbase_store::container::KeyedEncoder<#keys>,
            ) -> ::docbase_store::error::DocbaseResult<()> {
                let __record = self.#slots_field.get_or_load(&self.#context_field)?;
                ::docbase_store::traits::PersistedRecord::encode_record(__record, encoder)?;
                Ok(())
            }

            #vis fn save(&self) -> ::docbase_store::error::DocbaseResult<()> {
                let __record = self.#slots_field.get_or_load(&self.#context_field)?;
                self.#context_field.save(__record)
            }

            /// Discards the in-memory copy and reads the stored record again.
            #vis fn reload(&mut self) -> ::docbase_store::error::DocbaseResult<()> {
                let __record = self.#context_field.load::<#slots>()?;
                self.#slots_field.replace(__record);
                Ok(())
            }

            #vis fn is_persisted(
                context: &::docbase_store::context::ModelContext,
            ) -> ::docbase_store::error::DocbaseResult<bool> {
                context.is_persisted()
            }

            /// File-backed context for this model's record.
            #vis fn context(config: &::docbase_store::config::StorageConfig) -> ::docbase_store::context::ModelContext {
                ::docbase_store::context::ModelContext::file(config, Self::STORAGE_NAME)
            }

            #vis fn model_context(&self) -> &::docbase_store::context::ModelContext {
                &self.#context_field
            }
        }
    }

    fn generate_model_trait_impl(&self) -> TokenStream {
        let model = &self.plan.name;
        let slots = slots_struct_name(model);

        quote! {
            impl ::docbase_store::traits::PersistedModel for #model {
                type Record = #slots;

                const MODEL_NAME: &'static str = #model::MODEL_NAME;
                const STORAGE_NAME: &'static str = #model::STORAGE_NAME;
            }
        }
    }
}
