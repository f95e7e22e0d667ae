//! Procedural macros used in the definition and implementation of getters and setters for PolicySettings

use quote::quote;
use syn::parse::ParseStream;
use syn::parse::{Parse, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a ps_gets_and_sets definition, i.e., the
/// name of a value stored in a PolicySettings map and the corresponding type.
struct Signature {
    value_name: ValueName,
    value_type: ValueType,
}

/// SignatureWithDefault contains the results of parsing a ps_gets_and_sets_with_default definition,
/// i.e., the name of a value stored in a PolicySettings map, the corresponding type and the value
/// returned by the getter when the map has no entry. For example:
///     ```text
///     ps_gets_and_sets_with_default!(PS_RESOLVE_CUSTOM_OID_NAMES, bool, true);
///     ```
struct SignatureWithDefault {
    value_name: ValueName,
    value_type: ValueType,
    default_value: DefaultValue,
}

impl Parse for Signature {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name = stream.parse()?;
        stream.parse::<Token!(,)>()?;
        let value_type = stream.parse()?;
        Ok(Signature {
            value_name,
            value_type,
        })
    }
}

impl Parse for SignatureWithDefault {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name = stream.parse()?;
        stream.parse::<Token!(,)>()?;
        let value_type = stream.parse()?;
        stream.parse::<Token!(,)>()?;
        let default_value = stream.parse()?;
        Ok(SignatureWithDefault {
            value_name,
            value_type,
            default_value,
        })
    }
}

/// Names generated for one setting: getter, setter and the PolicyProcessingTypes variant.
struct Accessors {
    getter: Ident,
    setter: Ident,
    variant: Ident,
    getter_comment: String,
    setter_comment: String,
}

/// is_string_numeric is used to determine if a string value contains only numeric characters.
/// It is used to process a slice that omits the first character, i.e., in order to identify
/// types like u8, u32, etc.
fn is_string_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_numeric())
}

/// Strips the `PS_` prefix from the key ident to form accessor names and maps primitive type names
/// to the corresponding variant name, i.e., u32 to U32 and bool to Bool.
fn accessors(flag: &Ident, value_type: &Ident) -> Accessors {
    let flag_str = flag.to_string()[3..].to_lowercase();
    let getter_str = format!("get_{}", flag_str);
    let setter_str = format!("set_{}", flag_str);

    let type_str = value_type.to_string();
    let variant_str = if is_string_numeric(&type_str[1..]) {
        type_str.to_uppercase()
    } else if type_str == "bool" {
        "Bool".to_string()
    } else {
        type_str
    };

    Accessors {
        getter: Ident::new(&getter_str, flag.span()),
        setter: Ident::new(&setter_str, flag.span()),
        variant: Ident::new(&variant_str, value_type.span()),
        getter_comment: format!(
            "`{}` is used to retrieve `{}` items from a [`PolicySettings`] instance",
            getter_str, flag
        ),
        setter_comment: format!(
            "`{}` is used to set `{}` items in a [`PolicySettings`] instance",
            setter_str, flag
        ),
    }
}

/// Generates `get_x` (returning `Option<T>`) and `set_x` methods on `PolicySettings` for the
/// `PS_X` key.
#[proc_macro]
pub fn ps_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let Accessors {
        getter,
        setter,
        variant,
        getter_comment,
        setter_comment,
    } = accessors(&flag, &return_t);

    let tokens = quote! {
        impl PolicySettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> Option<#return_t> {
                match self.0.get(#flag) {
                    Some(PolicyProcessingTypes::#variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(#flag.to_string(), PolicyProcessingTypes::#variant(v));
            }
        }
    };
    tokens.into()
}

/// Generates `get_x` (returning `T`, or the given default when absent or of another type) and
/// `set_x` methods on `PolicySettings` for the `PS_X` key.
#[proc_macro]
pub fn ps_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as SignatureWithDefault);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let default_value = signature.default_value;
    let Accessors {
        getter,
        setter,
        variant,
        getter_comment,
        setter_comment,
    } = accessors(&flag, &return_t);

    let tokens = quote! {
        impl PolicySettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> #return_t {
                match self.0.get(#flag) {
                    Some(PolicyProcessingTypes::#variant(v)) => v.clone(),
                    _ => #default_value,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(#flag.to_string(), PolicyProcessingTypes::#variant(v));
            }
        }
    };
    tokens.into()
}
