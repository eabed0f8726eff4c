//! Code generation for rest-feign proc-macros.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Type, Visibility};

use crate::attrs::{ClientArgs, CollectionFormat, MethodParam, ParamKind};

/// Declaration kind of the annotated item, as `rest_feign::DeclarationKind` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemKind {
    Trait,
    Struct,
    Enum,
}

impl ItemKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Trait => "Trait",
            Self::Struct => "Struct",
            Self::Enum => "Enum",
        }
    }
}

/// Generate the `ClientMetadata` literal for the declaration.
pub(crate) fn generate_metadata(args: &ClientArgs) -> TokenStream {
    let name = &args.name;
    let value = &args.value;
    let url = &args.url;
    let is_secure = args.is_secure;
    let singleton = args.singleton;
    let level = format_ident!("{}", args.level.as_str());
    let interceptors = &args.interceptors;

    quote! {
        ::rest_feign::ClientMetadata {
            name: ::std::string::String::from(#name),
            value: ::std::string::String::from(#value),
            url: ::std::string::String::from(#url),
            is_secure: #is_secure,
            singleton: #singleton,
            level: ::rest_feign::LogLevel::#level,
            interceptors: ::std::vec![#(::rest_feign::TypeRef::of::<#interceptors>()),*],
        }
    }
}

/// Generate the `Declared` implementation.
///
/// The declared name is `module_path!()` of the call site joined with the item name, so the
/// scanner can match it against namespaces. Trait declarations also carry the proxy
/// constructor.
pub(crate) fn generate_declared_impl(
    self_ty: &Ident,
    declared_name: &Ident,
    kind: ItemKind,
    args: &ClientArgs,
) -> TokenStream {
    let metadata = generate_metadata(args);
    let suffix = format!("::{declared_name}");
    let constructor = (kind == ItemKind::Trait).then(|| {
        quote! { .with_constructor(::rest_feign::construct_proxy::<Self>) }
    });
    let kind = format_ident!("{}", kind.as_str());

    quote! {
        impl ::rest_feign::Declared for #self_ty {
            fn declaration() -> ::rest_feign::TypeDeclaration {
                ::rest_feign::TypeDeclaration::new::<Self>(
                    ::core::concat!(::core::module_path!(), #suffix),
                    ::rest_feign::DeclarationKind::#kind,
                )
                .with_client(#metadata)
                #constructor
            }
        }
    }
}

/// Generate the proxy struct and its `RestClient` implementation.
pub(crate) fn generate_client_struct(
    vis: &Visibility,
    trait_name: &Ident,
    client_name: &Ident,
) -> TokenStream {
    let doc = format!(" Generated proxy implementing [`{trait_name}`].");

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone)]
        #vis struct #client_name {
            pipeline: ::rest_feign::ClientPipeline,
        }

        impl #client_name {
            /// Request pipeline shared by every method of this client.
            #[must_use]
            pub fn pipeline(&self) -> &::rest_feign::ClientPipeline {
                &self.pipeline
            }
        }

        impl ::rest_feign::RestClient for #client_name {
            fn from_pipeline(pipeline: ::rest_feign::ClientPipeline) -> Self {
                Self { pipeline }
            }
        }
    }
}

/// Generate path substitution and URL resolution.
///
/// Path values are percent-encoded as a single segment.
pub(crate) fn generate_url_code(path_template: &str, params: &[MethodParam]) -> TokenStream {
    let substitutions: Vec<_> = params
        .iter()
        .filter_map(|p| match &p.kind {
            ParamKind::Path(alias) => {
                let name = &p.name;
                let key = alias.clone().unwrap_or_else(|| name.to_string());
                let placeholder = format!("{{{key}}}");
                Some(quote! {
                    __path = __path.replace(
                        #placeholder,
                        &::rest_feign::encode_path_segment(&#name.to_string()),
                    );
                })
            }
            _ => None,
        })
        .collect();

    quote! {
        let mut __path = ::std::string::String::from(#path_template);
        #(#substitutions)*
        let __url = self.pipeline.url_for(&__path)?;
    }
}

/// Generate query parameter code.
///
/// Supports:
/// - Simple types: `#[query] page: u32` → `?page=1`
/// - Optional types: `#[query] page: Option<u32>` → skipped if None
/// - Vec types: `#[query] tags: Vec<String>` → `?tags=a&tags=b` (multi format, default)
/// - Vec types with format: `#[query(format = "csv")] tags: Vec<String>` → `?tags=a,b,c`
pub(crate) fn generate_query_code(params: &[MethodParam]) -> TokenStream {
    let statements: Vec<_> = params
        .iter()
        .filter_map(|p| match &p.kind {
            ParamKind::Query(options) => {
                let name = &p.name;
                let key = options.alias.clone().unwrap_or_else(|| name.to_string());
                Some(if is_option_type(&p.ty) {
                    quote! {
                        if let ::std::option::Option::Some(value) = &#name {
                            __builder = __builder.query(#key, value.to_string());
                        }
                    }
                } else if is_vec_type(&p.ty) {
                    generate_vec_query_code(&key, name, options.format)
                } else {
                    quote! {
                        __builder = __builder.query(#key, #name.to_string());
                    }
                })
            }
            _ => None,
        })
        .collect();

    quote! { #(#statements)* }
}

/// Generate code for serializing a Vec<T> query parameter with the given format.
fn generate_vec_query_code(key: &str, name: &Ident, format: CollectionFormat) -> TokenStream {
    match format.separator() {
        None => quote! {
            for item in #name.iter() {
                __builder = __builder.query(#key, item.to_string());
            }
        },
        Some(sep) => quote! {
            if !#name.is_empty() {
                let value = #name
                    .iter()
                    .map(::std::string::ToString::to_string)
                    .collect::<::std::vec::Vec<_>>()
                    .join(#sep);
                __builder = __builder.query(#key, value);
            }
        },
    }
}

/// Generate header code: `Accept` for decoded responses, then `#[header]` parameters.
pub(crate) fn generate_headers_code(params: &[MethodParam], accept_json: bool) -> TokenStream {
    let accept = accept_json.then(|| {
        quote! {
            __builder = __builder.header("Accept", "application/json");
        }
    });

    let headers: Vec<_> = params
        .iter()
        .filter_map(|p| match &p.kind {
            ParamKind::Header(header_name) => {
                let name = &p.name;
                Some(if is_option_type(&p.ty) {
                    quote! {
                        if let ::std::option::Option::Some(value) = &#name {
                            __builder = __builder.header(#header_name, value.to_string());
                        }
                    }
                } else {
                    quote! {
                        __builder = __builder.header(#header_name, #name.to_string());
                    }
                })
            }
            _ => None,
        })
        .collect();

    quote! {
        #accept
        #(#headers)*
    }
}

/// Generate body code using the pipeline's encoder.
pub(crate) fn generate_body_code(params: &[MethodParam]) -> TokenStream {
    params
        .iter()
        .find(|p| p.kind == ParamKind::Body)
        .map(|p| {
            let name = &p.name;
            quote! {
                __builder = __builder.encoded(self.pipeline.encoder(), &#name)?;
            }
        })
        .unwrap_or_default()
}

/// The kind of return type for a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReturnTypeKind {
    /// Decoded body (default): `Result<T>`
    Json,
    /// Raw response: `Result<Response>`
    RawResponse,
    /// Unit type: `Result<()>`
    Unit,
}

/// Analyze the return type to determine how to handle the response.
///
/// Extracts the inner type from `Result<T>` and determines:
/// - `RawResponse`: If the type is `Response`
/// - `Unit`: If the type is `()`
/// - `Json`: Everything else
pub(crate) fn analyze_return_type(ty: &Type) -> ReturnTypeKind {
    let inner = unwrap_result_type(ty).unwrap_or(ty);

    if is_unit_type(inner) {
        return ReturnTypeKind::Unit;
    }

    if is_response_type(inner) {
        return ReturnTypeKind::RawResponse;
    }

    ReturnTypeKind::Json
}

/// Generate response handling code based on return type kind.
pub(crate) fn generate_response_handling(kind: ReturnTypeKind) -> TokenStream {
    match kind {
        ReturnTypeKind::Unit => quote! {
            self.pipeline.expect_success(__response)?;
            ::std::result::Result::Ok(())
        },
        // returned as-is, without status check
        ReturnTypeKind::RawResponse => quote! {
            ::std::result::Result::Ok(__response)
        },
        ReturnTypeKind::Json => quote! {
            self.pipeline.decode(__response)
        },
    }
}

/// Check if a type is the unit type `()`.
fn is_unit_type(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// Check if a type is `Response`.
fn is_response_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return segment.ident == "Response";
    }
    false
}

/// Unwrap `Result<T>` to get `T`, returns None if not a Result.
fn unwrap_result_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Result"
        && let syn::PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(syn::GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner);
    }
    None
}

/// Check if a type is `Option<T>`.
pub(crate) fn is_option_type(ty: &Type) -> bool {
    last_segment_is(ty, "Option")
}

/// Check if a type is `Vec<T>` or `&Vec<T>`.
fn is_vec_type(ty: &Type) -> bool {
    let ty = match ty {
        Type::Reference(reference) => &*reference.elem,
        other => other,
    };
    last_segment_is(ty, "Vec")
}

fn last_segment_is(ty: &Type, name: &str) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    type_path
        .path
        .segments
        .last()
        .is_some_and(|seg| seg.ident == name)
}
