//! Declarations and the type catalog.
//!
//! `#[rest_client]` implements [`Declared`] for what it annotates. The application collects
//! those declarations in a [`TypeCatalog`], which client scanning searches by namespace.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{ClientPipeline, LogLevel, Namespace, TypeRef};

/// Metadata attached by `#[rest_client(...)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMetadata {
    /// Preferred registration name.
    pub name: String,
    /// Fallback registration name.
    pub value: String,
    /// Base URL template, may contain `${...}` placeholders.
    pub url: String,
    /// Force `https` when `true`, `http` otherwise.
    pub is_secure: bool,
    /// Share one proxy per container.
    pub singleton: bool,
    /// Call logging verbosity.
    pub level: LogLevel,
    /// Interceptor types, in application order.
    pub interceptors: Vec<TypeRef>,
}

impl Default for ClientMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            value: String::new(),
            url: String::new(),
            is_secure: false,
            singleton: true,
            level: LogLevel::Full,
            interceptors: Vec::new(),
        }
    }
}

/// Shape of the declared item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DeclarationKind {
    /// A trait; the only kind a client can be built for.
    #[display("trait")]
    Trait,
    /// A struct.
    #[display("struct")]
    Struct,
    /// An enum.
    #[display("enum")]
    Enum,
}

/// Builds a proxy value from an assembled pipeline.
pub type ProxyConstructor = fn(ClientPipeline) -> Arc<dyn Any + Send + Sync>;

/// A type known to the catalog.
#[derive(Clone)]
pub struct TypeDeclaration {
    type_ref: TypeRef,
    kind: DeclarationKind,
    client: Option<ClientMetadata>,
    constructor: Option<ProxyConstructor>,
}

impl fmt::Debug for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDeclaration")
            .field("name", &self.type_ref.name())
            .field("kind", &self.kind)
            .field("client", &self.client)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

impl TypeDeclaration {
    /// Declaration of `T` under the fully qualified `name`.
    #[must_use]
    pub fn new<T: ?Sized + 'static>(name: &'static str, kind: DeclarationKind) -> Self {
        Self {
            type_ref: TypeRef::named::<T>(name),
            kind,
            client: None,
            constructor: None,
        }
    }

    /// Attach client metadata.
    #[must_use]
    pub fn with_client(mut self, metadata: ClientMetadata) -> Self {
        self.client = Some(metadata);
        self
    }

    /// Attach the proxy constructor.
    #[must_use]
    pub fn with_constructor(mut self, constructor: ProxyConstructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Identity and fully qualified name.
    #[must_use]
    pub const fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    /// Fully qualified name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.type_ref.name()
    }

    /// Shape of the declared item.
    #[must_use]
    pub const fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// Client metadata, if any.
    #[must_use]
    pub const fn client(&self) -> Option<&ClientMetadata> {
        self.client.as_ref()
    }

    /// Proxy constructor, if any.
    #[must_use]
    pub const fn constructor(&self) -> Option<ProxyConstructor> {
        self.constructor
    }
}

/// Types describing themselves for client scanning. Implemented by `#[rest_client]`.
pub trait Declared: 'static {
    /// The declaration of `Self`.
    fn declaration() -> TypeDeclaration;
}

/// Proxy generated by `#[rest_client]` for a trait.
pub trait RestClient: Declared + Clone + Send + Sync + 'static {
    /// Wrap an assembled pipeline.
    fn from_pipeline(pipeline: ClientPipeline) -> Self;
}

/// [`ProxyConstructor`] for the proxy type `P`.
#[must_use]
pub fn construct_proxy<P: RestClient>(pipeline: ClientPipeline) -> Arc<dyn Any + Send + Sync> {
    Arc::new(P::from_pipeline(pipeline))
}

/// The set of declarations client scanning can see.
///
/// ```ignore
/// let mut catalog = TypeCatalog::new();
/// catalog.declare::<InventoryApiClient>().declare::<BillingApiClient>();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    declarations: Vec<TypeDeclaration>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the declaration of `T`.
    pub fn declare<T: Declared>(&mut self) -> &mut Self {
        self.insert(T::declaration())
    }

    /// Add a declaration; a declaration of the same type replaces the previous one.
    pub fn insert(&mut self, declaration: TypeDeclaration) -> &mut Self {
        self.declarations
            .retain(|existing| existing.type_ref != declaration.type_ref);
        self.declarations.push(declaration);
        self
    }

    /// Declarations in `namespace` or below, in insertion order.
    pub fn in_namespace<'a>(
        &'a self,
        namespace: &'a Namespace,
    ) -> impl Iterator<Item = &'a TypeDeclaration> + 'a {
        self.declarations
            .iter()
            .filter(move |declaration| namespace.contains(declaration.name()))
    }

    /// All declarations.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.declarations.iter()
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns `true` if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
