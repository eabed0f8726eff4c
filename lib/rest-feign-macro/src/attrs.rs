//! Attribute parsing for rest-feign proc-macros.

use proc_macro2::{Span, TokenStream};
use syn::{Ident, Type};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Variant name of `rest_feign::Method`, for code generation.
    #[must_use]
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Put => "Put",
            Self::Delete => "Delete",
            Self::Patch => "Patch",
            Self::Head => "Head",
            Self::Options => "Options",
        }
    }

    /// Parse an HTTP method from a string (case-insensitive).
    #[must_use]
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Maps a method attribute name (`get`, `post`, ...) to its method.
    #[must_use]
    pub(crate) fn from_attr(ident: &Ident) -> Option<Self> {
        let name = ident.to_string();
        if name == "http" {
            return None;
        }
        Self::parse(&name)
    }

    /// Returns true if this HTTP method typically has a request body.
    #[must_use]
    pub(crate) const fn supports_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

/// Verbosity named by `level = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LogLevel {
    None,
    Basic,
    Headers,
    #[default]
    Full,
}

impl LogLevel {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "basic" => Some(Self::Basic),
            "headers" => Some(Self::Headers),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Variant name of `rest_feign::LogLevel`.
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Basic => "Basic",
            Self::Headers => "Headers",
            Self::Full => "Full",
        }
    }
}

/// Arguments of `#[rest_client(...)]`.
#[derive(Debug)]
pub(crate) struct ClientArgs {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) url: String,
    pub(crate) is_secure: bool,
    pub(crate) singleton: bool,
    pub(crate) level: LogLevel,
    pub(crate) interceptors: Vec<syn::Path>,
}

impl Default for ClientArgs {
    fn default() -> Self {
        Self {
            name: String::new(),
            value: String::new(),
            url: String::new(),
            is_secure: false,
            singleton: true,
            level: LogLevel::default(),
            interceptors: Vec::new(),
        }
    }
}

/// Parse the `#[rest_client]` attribute arguments.
///
/// Presence checks (blank url, name resolution) happen when clients are scanned.
pub(crate) fn parse_client_args(attr: TokenStream) -> syn::Result<ClientArgs> {
    let mut args = ClientArgs::default();

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            args.name = meta.value()?.parse::<syn::LitStr>()?.value();
        } else if meta.path.is_ident("value") {
            args.value = meta.value()?.parse::<syn::LitStr>()?.value();
        } else if meta.path.is_ident("url") {
            args.url = meta.value()?.parse::<syn::LitStr>()?.value();
        } else if meta.path.is_ident("is_secure") {
            args.is_secure = meta.value()?.parse::<syn::LitBool>()?.value;
        } else if meta.path.is_ident("singleton") {
            args.singleton = meta.value()?.parse::<syn::LitBool>()?.value;
        } else if meta.path.is_ident("level") {
            let value: syn::LitStr = meta.value()?.parse()?;
            args.level = LogLevel::parse(&value.value()).ok_or_else(|| {
                syn::Error::new_spanned(
                    &value,
                    format!(
                        "unknown level: \"{}\". Expected: \"none\", \"basic\", \"headers\", or \"full\"",
                        value.value()
                    ),
                )
            })?;
        } else if meta.path.is_ident("interceptors") {
            let input = meta.value()?;
            let content;
            syn::bracketed!(content in input);
            let paths = content.parse_terminated(syn::Path::parse_mod_style, syn::Token![,])?;
            args.interceptors = paths.into_iter().collect();
        } else {
            return Err(meta.error("unsupported rest_client attribute"));
        }
        Ok(())
    });

    syn::parse::Parser::parse2(parser, attr)?;
    Ok(args)
}

/// Collection format for serializing `Vec<T>` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CollectionFormat {
    /// Repeated parameters: `?tags=a&tags=b&tags=c` (default)
    #[default]
    Multi,
    /// Comma-separated: `?tags=a,b,c`
    Csv,
    /// Pipe-separated: `?tags=a|b|c`
    Pipes,
}

impl CollectionFormat {
    /// Separator for joined formats, `None` for repeated parameters.
    #[must_use]
    pub(crate) const fn separator(self) -> Option<&'static str> {
        match self {
            Self::Multi => None,
            Self::Csv => Some(","),
            Self::Pipes => Some("|"),
        }
    }
}

/// Query parameter options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct QueryOptions {
    /// Optional alias for the query parameter name.
    pub(crate) alias: Option<String>,
    /// Collection format for Vec<T> parameters.
    pub(crate) format: CollectionFormat,
}

/// Parameter kind for method arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParamKind {
    /// `#[path]` or `#[path("item_id")]`.
    Path(Option<String>),
    /// `#[query]`, `#[query("page_size")]`, `#[query(format = "csv")]`.
    Query(QueryOptions),
    /// `#[header("X-Tenant")]`.
    Header(String),
    /// `#[body]`, encoded with the client's encoder.
    Body,
}

/// A parsed method parameter.
#[derive(Debug)]
pub(crate) struct MethodParam {
    pub(crate) name: Ident,
    pub(crate) ty: Type,
    pub(crate) kind: ParamKind,
}

/// Parameter attribute names, stripped from the generated trait.
pub(crate) const PARAM_ATTRS: &[&str] = &["path", "query", "header", "body"];

/// Parse a parameter attribute and return its kind.
pub(crate) fn parse_param_attr(attr: &syn::Attribute) -> syn::Result<Option<ParamKind>> {
    let path = attr.path();

    if path.is_ident("path") {
        return Ok(Some(ParamKind::Path(parse_optional_string_arg(attr))));
    }

    if path.is_ident("query") {
        return parse_query_options(attr).map(|o| Some(ParamKind::Query(o)));
    }

    if path.is_ident("header") {
        let name = parse_optional_string_arg(attr).ok_or_else(|| {
            syn::Error::new_spanned(attr, "expected header name: #[header(\"X-Name\")]")
        })?;
        return Ok(Some(ParamKind::Header(name)));
    }

    if path.is_ident("body") {
        return Ok(Some(ParamKind::Body));
    }

    Ok(None)
}

/// Parse query parameter options from `#[query]`, `#[query("alias")]` or
/// `#[query(format = "csv")]`.
fn parse_query_options(attr: &syn::Attribute) -> syn::Result<QueryOptions> {
    let mut options = QueryOptions::default();

    if let syn::Meta::List(meta_list) = &attr.meta {
        if let Ok(str_lit) = syn::parse2::<syn::LitStr>(meta_list.tokens.clone()) {
            options.alias = Some(str_lit.value());
            return Ok(options);
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("format") {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.format = parse_collection_format(&value.value())
                    .ok_or_else(|| meta.error("expected format \"multi\", \"csv\" or \"pipes\""))?;
            } else if meta.path.is_ident("name") {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.alias = Some(value.value());
            } else {
                return Err(meta.error("unsupported query option"));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

fn parse_collection_format(s: &str) -> Option<CollectionFormat> {
    match s.to_lowercase().as_str() {
        "multi" => Some(CollectionFormat::Multi),
        "csv" | "comma" => Some(CollectionFormat::Csv),
        "pipes" | "pipe" => Some(CollectionFormat::Pipes),
        _ => None,
    }
}

/// Parse an optional string argument from an attribute.
fn parse_optional_string_arg(attr: &syn::Attribute) -> Option<String> {
    match &attr.meta {
        syn::Meta::List(meta_list) => {
            let str_lit: syn::LitStr = syn::parse2(meta_list.tokens.clone()).ok()?;
            Some(str_lit.value())
        }
        _ => None,
    }
}

/// Parse the string argument of a method attribute (`#[get("/items")]`).
pub(crate) fn parse_attr_path(attr: &syn::Attribute) -> syn::Result<String> {
    match &attr.meta {
        syn::Meta::List(meta_list) => {
            let str_lit: syn::LitStr = syn::parse2(meta_list.tokens.clone())?;
            Ok(str_lit.value())
        }
        _ => Err(syn::Error::new_spanned(attr, "expected string argument")),
    }
}

/// Parse `"VERB /path"` from `#[http(...)]`.
pub(crate) fn parse_custom_http(route: &str, span: Span) -> syn::Result<(HttpMethod, String)> {
    let (method_str, path) = route.split_once(' ').ok_or_else(|| {
        syn::Error::new(
            span,
            "expected format: \"METHOD /path\" (e.g., \"GET /items/{id}\")",
        )
    })?;

    let method = HttpMethod::parse(method_str).ok_or_else(|| {
        syn::Error::new(
            span,
            format!(
                "unsupported HTTP method: {method_str}. Supported: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS"
            ),
        )
    })?;

    Ok((method, path.trim().to_string()))
}

/// Extract placeholder names from a URL path template.
///
/// E.g., `/items/{id}/stock/{warehouse}` returns `["id", "warehouse"]`
#[must_use]
pub(crate) fn extract_path_placeholders(path: &str) -> Vec<String> {
    let mut placeholders = Vec::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        if c == '{' {
            let mut name = String::new();
            for next in chars.by_ref() {
                if next == '}' {
                    break;
                }
                name.push(next);
            }
            if !name.is_empty() {
                placeholders.push(name);
            }
        }
    }
    placeholders
}
