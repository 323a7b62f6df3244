use proc_macro2::Ident;
use quote::format_ident;
use syn::ext::IdentExt;

/// Utilities for consistent names of the items a model compiles into

/// Field name as written, without any `r#` prefix
pub fn field_label(field: &Ident) -> String {
    field.unraw().to_string()
}

/// Synthesized key case for a field (e.g., number -> _number)
pub fn key_case_name(field: &Ident) -> Ident {
    format_ident!("_{}", field_label(field))
}

/// Setter for a field (e.g., number -> set_number)
pub fn setter_name(field: &Ident) -> Ident {
    format_ident!("set_{}", field_label(field))
}

/// Implicit key enum (e.g., Settings -> SettingsPersistedKeys)
pub fn persisted_keys_enum_name(model_name: &Ident) -> Ident {
    format_ident!("{}PersistedKeys", model_name)
}

/// Persisted backing slots (e.g., Settings -> SettingsSlots)
pub fn slots_struct_name(model_name: &Ident) -> Ident {
    format_ident!("{}Slots", model_name)
}

/// Migration shadow (e.g., Settings -> SettingsMigrationShadow)
pub fn migration_shadow_name(model_name: &Ident) -> Ident {
    format_ident!("{}MigrationShadow", model_name)
}

/// Alias of the key enum a migration decodes with (e.g., Settings -> SettingsMigrationKeys)
pub fn migration_keys_alias(model_name: &Ident) -> Ident {
    format_ident!("{}MigrationKeys", model_name)
}

pub fn context_field() -> Ident {
    format_ident!("__context")
}

pub fn slots_field() -> Ident {
    format_ident!("__slots")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_raw_identifiers_are_unprefixed() {
        let field: Ident = parse_quote!(r#type);
        assert_eq!(field_label(&field), "type");
        assert_eq!(key_case_name(&field), "_type");
        assert_eq!(setter_name(&field), "set_type");
    }

    #[test]
    fn test_model_names() {
        let model: Ident = parse_quote!(Settings);
        assert_eq!(persisted_keys_enum_name(&model), "SettingsPersistedKeys");
        assert_eq!(slots_struct_name(&model), "SettingsSlots");
        assert_eq!(migration_shadow_name(&model), "SettingsMigrationShadow");
    }
}
