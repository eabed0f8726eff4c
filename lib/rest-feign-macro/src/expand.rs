//! Macro expansion logic for `#[rest_client]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{FnArg, Ident, Item, ItemTrait, Pat, TraitItem, TraitItemFn, parse2};

use crate::attrs::{
    ClientArgs, HttpMethod, MethodParam, PARAM_ATTRS, ParamKind, extract_path_placeholders,
    parse_attr_path, parse_client_args, parse_custom_http, parse_param_attr,
};
use crate::codegen::{
    ItemKind, ReturnTypeKind, analyze_return_type, generate_body_code, generate_client_struct,
    generate_declared_impl, generate_headers_code, generate_query_code,
    generate_response_handling, generate_url_code,
};

/// Information about a parsed trait method.
struct TraitMethodInfo {
    sig: syn::Signature,
    http_method: HttpMethod,
    path: String,
    params: Vec<MethodParam>,
    return_kind: ReturnTypeKind,
    attrs: Vec<syn::Attribute>,
}

/// Expand `#[rest_client]`.
///
/// Traits get a proxy. Structs and enums keep their definition and only declare client
/// metadata, which client scanning rejects at startup.
pub(crate) fn expand_rest_client(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args = parse_client_args(attr)?;

    match parse2::<Item>(item)? {
        Item::Trait(trait_def) => expand_trait(&args, &trait_def),
        Item::Struct(item) => expand_declared_item(
            &args,
            &item.ident,
            &item.generics,
            ItemKind::Struct,
            quote!(#item),
        ),
        Item::Enum(item) => expand_declared_item(
            &args,
            &item.ident,
            &item.generics,
            ItemKind::Enum,
            quote!(#item),
        ),
        other => Err(syn::Error::new(
            other.span(),
            "`#[rest_client]` can only be specified on a trait",
        )),
    }
}

fn expand_declared_item(
    args: &ClientArgs,
    ident: &Ident,
    generics: &syn::Generics,
    kind: ItemKind,
    item: TokenStream,
) -> syn::Result<TokenStream> {
    if !generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            generics,
            "`#[rest_client]` can only be specified on a trait",
        ));
    }
    let declared = generate_declared_impl(ident, ident, kind, args);
    Ok(quote! {
        #item
        #declared
    })
}

fn expand_trait(args: &ClientArgs, trait_def: &ItemTrait) -> syn::Result<TokenStream> {
    let trait_name = &trait_def.ident;
    let vis = &trait_def.vis;

    if !trait_def.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &trait_def.generics,
            "generic client traits are not supported",
        ));
    }

    let client_name = format_ident!("{}Client", trait_name);
    let methods = extract_trait_methods(trait_def)?;

    let clean_trait = generate_clean_trait(trait_def, &methods);
    let client_struct = generate_client_struct(vis, trait_name, &client_name);
    let declared = generate_declared_impl(&client_name, trait_name, ItemKind::Trait, args);
    let trait_impl = generate_trait_impl(trait_name, &client_name, &methods);

    Ok(quote! {
        #clean_trait
        #client_struct
        #declared
        #trait_impl
    })
}

/// Extract methods from a trait definition.
///
/// Every item must be an `async fn(&self, ..) -> Result<T>` carrying one HTTP method
/// attribute.
fn extract_trait_methods(trait_def: &ItemTrait) -> syn::Result<Vec<TraitMethodInfo>> {
    let mut methods = Vec::new();

    for item in &trait_def.items {
        let TraitItem::Fn(method) = item else {
            return Err(syn::Error::new_spanned(
                item,
                "client traits may only contain methods",
            ));
        };

        let (http_method, path) = find_http_attribute(&method.attrs)?.ok_or_else(|| {
            syn::Error::new_spanned(
                &method.sig,
                "missing HTTP method attribute: #[get], #[post], #[put], #[delete], #[patch], #[head], #[options] or #[http]",
            )
        })?;

        validate_signature(method)?;

        let return_kind = match &method.sig.output {
            syn::ReturnType::Type(_, ty) => analyze_return_type(ty),
            syn::ReturnType::Default => ReturnTypeKind::Unit,
        };
        let params = parse_trait_method_params(method, &path, http_method)?;
        let attrs = method
            .attrs
            .iter()
            .filter(|a| !is_http_attr(a))
            .cloned()
            .collect();

        methods.push(TraitMethodInfo {
            sig: method.sig.clone(),
            http_method,
            path,
            params,
            return_kind,
            attrs,
        });
    }

    Ok(methods)
}

fn validate_signature(method: &TraitItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(sig, "client methods must be `async fn`"));
    }
    if method.default.is_some() {
        return Err(syn::Error::new_spanned(
            method,
            "client methods cannot have a default body",
        ));
    }
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "client methods must take `&self`",
            ));
        }
    }
    if matches!(sig.output, syn::ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            sig,
            "client methods must return `rest_feign::Result<T>`",
        ));
    }
    Ok(())
}

fn is_http_attr(attr: &syn::Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| ident == "http" || HttpMethod::from_attr(ident).is_some())
}

/// Find and parse HTTP method attribute from a method's attributes.
fn find_http_attribute(attrs: &[syn::Attribute]) -> syn::Result<Option<(HttpMethod, String)>> {
    for attr in attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };

        if let Some(method) = HttpMethod::from_attr(ident) {
            return parse_attr_path(attr).map(|path| Some((method, path)));
        }

        if ident == "http" {
            let route = parse_attr_path(attr)?;
            return parse_custom_http(&route, attr.span()).map(Some);
        }
    }

    Ok(None)
}

/// Parse method parameters from a trait method.
///
/// Parameters are classified as follows:
/// 1. Explicit attributes (`#[path]`, `#[query]`, `#[header]`, `#[body]`) take precedence
/// 2. Parameters matching URL placeholders are auto-classified as Path
/// 3. For body-supporting methods (POST, PUT, PATCH), a single remaining param becomes Body
/// 4. Multiple unclassified params or unclassified params on non-body methods cause errors
fn parse_trait_method_params(
    method: &TraitItemFn,
    path_template: &str,
    http_method: HttpMethod,
) -> syn::Result<Vec<MethodParam>> {
    let placeholders = extract_path_placeholders(path_template);
    let mut params = Vec::new();
    let mut unclassified: Vec<(Ident, syn::Type, &syn::PatType)> = Vec::new();

    for input in &method.sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "client method parameters must be plain identifiers",
            ));
        };
        let name = pat_ident.ident.clone();
        let ty = (*pat_type.ty).clone();

        let mut explicit = None;
        for attr in &pat_type.attrs {
            if let Some(kind) = parse_param_attr(attr)? {
                explicit = Some(kind);
                break;
            }
        }
        if let Some(kind) = explicit {
            params.push(MethodParam { name, ty, kind });
            continue;
        }

        if placeholders.contains(&name.to_string()) {
            params.push(MethodParam {
                name,
                ty,
                kind: ParamKind::Path(None),
            });
            continue;
        }

        unclassified.push((name, ty, pat_type));
    }

    if params.iter().filter(|p| p.kind == ParamKind::Body).count()
        + usize::from(!unclassified.is_empty() && http_method.supports_body())
        > 1
    {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "only one body parameter is allowed",
        ));
    }

    match unclassified.len() {
        0 => {}
        1 if http_method.supports_body() => {
            if let Some((name, ty, _)) = unclassified.into_iter().next() {
                params.push(MethodParam {
                    name,
                    ty,
                    kind: ParamKind::Body,
                });
            }
        }
        1 => {
            if let Some((name, _, pat_type)) = unclassified.first() {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    format!(
                        "parameter '{}' does not match any URL placeholder (available: {:?}) \
                         and {} requests do not support body. \
                         Add #[query] or another explicit attribute.",
                        name,
                        placeholders,
                        http_method.as_str().to_uppercase()
                    ),
                ));
            }
        }
        _ => {
            let names: Vec<_> = unclassified.iter().map(|(n, _, _)| n.to_string()).collect();
            if let Some((_, _, pat_type)) = unclassified.get(1) {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    format!(
                        "multiple unattributed parameters found: {names:?}. \
                         Only one body parameter is allowed. \
                         Add explicit attributes to disambiguate.",
                    ),
                ));
            }
        }
    }

    Ok(params)
}

/// Generate a clean trait without rest-feign attributes.
fn generate_clean_trait(original: &ItemTrait, methods: &[TraitMethodInfo]) -> TokenStream {
    let vis = &original.vis;
    let name = &original.ident;
    let supertraits = &original.supertraits;
    let colon = original.colon_token;
    let trait_attrs = &original.attrs;

    let method_signatures: Vec<_> = methods
        .iter()
        .map(|m| {
            let attrs = &m.attrs;
            let sig = strip_param_attrs(&m.sig);
            quote! {
                #(#attrs)*
                #sig;
            }
        })
        .collect();

    quote! {
        #(#trait_attrs)*
        #[allow(async_fn_in_trait)]
        #vis trait #name #colon #supertraits {
            #(#method_signatures)*
        }
    }
}

/// Strip parameter attributes from a method signature.
fn strip_param_attrs(sig: &syn::Signature) -> syn::Signature {
    let mut clean_sig = sig.clone();
    for arg in &mut clean_sig.inputs {
        if let FnArg::Typed(pat_type) = arg {
            pat_type
                .attrs
                .retain(|attr| !PARAM_ATTRS.iter().any(|name| attr.path().is_ident(name)));
        }
    }
    clean_sig
}

/// Generate the trait implementation for the proxy struct.
fn generate_trait_impl(
    trait_name: &Ident,
    client_name: &Ident,
    methods: &[TraitMethodInfo],
) -> TokenStream {
    let method_impls: Vec<_> = methods
        .iter()
        .map(|m| {
            let sig = strip_param_attrs(&m.sig);
            let body = generate_method_body(m);
            quote! {
                #sig {
                    #body
                }
            }
        })
        .collect();

    quote! {
        impl #trait_name for #client_name {
            #(#method_impls)*
        }
    }
}

/// Generate the body of a method implementation.
fn generate_method_body(method: &TraitMethodInfo) -> TokenStream {
    let method_ident = format_ident!("{}", method.http_method.as_str());
    let method_name = method.sig.ident.to_string();
    let url_code = generate_url_code(&method.path, &method.params);
    let query_code = generate_query_code(&method.params);
    let headers_code =
        generate_headers_code(&method.params, method.return_kind == ReturnTypeKind::Json);
    let body_code = generate_body_code(&method.params);
    let response_handling = generate_response_handling(method.return_kind);

    quote! {
        #url_code
        let mut __builder = ::rest_feign::Request::builder(
            ::rest_feign::Method::#method_ident,
            __url,
        );
        #query_code
        #headers_code
        #body_code
        let __request = __builder.build()?;

        let __response = self.pipeline.execute(#method_name, __request).await?;
        #response_handling
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use quote::quote;

    use super::*;

    fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<String> {
        expand_rest_client(attr, item).map(|tokens| tokens.to_string())
    }

    #[test]
    fn expands_trait_into_proxy() {
        let code = expand(
            quote! { url = "${inventory.url}", interceptors = [Auth] },
            quote! {
                /// Stock service.
                pub trait InventoryApi {
                    /// Fetch one item.
                    #[get("/items/{id}")]
                    async fn get_item(&self, id: u64) -> rest_feign::Result<Item>;

                    #[post("/items")]
                    async fn create_item(&self, item: &NewItem) -> rest_feign::Result<Item>;

                    #[http("DELETE /items/{id}")]
                    async fn delete_item(&self, #[path] id: u64) -> rest_feign::Result<()>;
                }
            },
        )
        .expect("expand");

        check!(code.contains("pub trait InventoryApi"));
        check!(code.contains("pub struct InventoryApiClient"));
        check!(code.contains("impl :: rest_feign :: Declared for InventoryApiClient"));
        check!(code.contains("impl :: rest_feign :: RestClient for InventoryApiClient"));
        check!(code.contains("impl InventoryApi for InventoryApiClient"));
        check!(code.contains("DeclarationKind :: Trait"));
        check!(code.contains("construct_proxy :: < Self >"));
        check!(code.contains("\"::InventoryApi\""));
        check!(code.contains("TypeRef :: of :: < Auth >"));
        check!(code.contains("execute (\"get_item\""));
        check!(code.contains("Method :: Delete"));
        check!(code.contains("encoded"));
        check!(code.contains("async_fn_in_trait"));
        check!(!code.contains("# [get"));
        check!(!code.contains("# [path]"));
    }

    #[test]
    fn struct_keeps_definition_and_declares_kind() {
        let code = expand(
            quote! { url = "http://stock.local" },
            quote! { pub struct InventoryApi; },
        )
        .expect("expand");

        check!(code.contains("pub struct InventoryApi ;"));
        check!(code.contains("impl :: rest_feign :: Declared for InventoryApi"));
        check!(code.contains("DeclarationKind :: Struct"));
        check!(!code.contains("RestClient"));
        check!(!code.contains("construct_proxy"));
    }

    #[test]
    fn rejects_other_items() {
        let_assert!(Err(err) = expand(quote! {}, quote! { fn inventory() {} }));
        check!(err.to_string() == "`#[rest_client]` can only be specified on a trait");
    }

    #[test]
    fn rejects_invalid_methods() {
        let_assert!(
            Err(err) = expand(
                quote! {},
                quote! {
                    trait Api {
                        fn list(&self) -> rest_feign::Result<Vec<Item>>;
                    }
                }
            )
        );
        check!(err.to_string().contains("missing HTTP method attribute"));

        let_assert!(
            Err(err) = expand(
                quote! {},
                quote! {
                    trait Api {
                        #[get("/items")]
                        fn list(&self) -> rest_feign::Result<Vec<Item>>;
                    }
                }
            )
        );
        check!(err.to_string().contains("async fn"));

        let_assert!(
            Err(err) = expand(
                quote! {},
                quote! {
                    trait Api {
                        #[get("/items")]
                        async fn list(&self);
                    }
                }
            )
        );
        check!(err.to_string().contains("must return"));
    }

    #[test]
    fn parameter_classification_errors() {
        let_assert!(
            Err(err) = expand(
                quote! {},
                quote! {
                    trait Api {
                        #[get("/items")]
                        async fn list(&self, page: u32) -> rest_feign::Result<Vec<Item>>;
                    }
                }
            )
        );
        check!(err.to_string().contains("does not match any URL placeholder"));

        let_assert!(
            Err(err) = expand(
                quote! {},
                quote! {
                    trait Api {
                        #[post("/items")]
                        async fn create(&self, a: A, b: B) -> rest_feign::Result<()>;
                    }
                }
            )
        );
        check!(err.to_string().contains("multiple unattributed parameters"));

        let_assert!(
            Err(err) = expand(
                quote! {},
                quote! {
                    trait Api {
                        #[put("/items")]
                        async fn replace(&self, #[body] a: A, b: B) -> rest_feign::Result<()>;
                    }
                }
            )
        );
        check!(err.to_string().contains("only one body parameter"));
    }
}
