use crate::{provider::Provider, token::InjectionToken};

/// A named group of providers, together with the modules it imports
/// and the tokens it exposes to the rest of the application
///
/// The container is flat: every provider of every imported module can be
/// required from the [`crate::DiContainer`], whether it is exported or not.
#[derive(Debug)]
pub struct ModuleDescriptor {
    pub(crate) name: &'static str,
    pub(crate) global: bool,
    pub(crate) imports: Vec<ModuleDescriptor>,
    pub(crate) providers: Vec<Provider>,
    pub(crate) exports: Vec<InjectionToken>,
}

impl ModuleDescriptor {
    pub fn new(name: &'static str) -> Self {
        ModuleDescriptor {
            name,
            global: false,
            imports: Vec::new(),
            providers: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Marks the module's exports as available application wide
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }

    pub fn with_imports(mut self, imports: impl IntoIterator<Item = ModuleDescriptor>) -> Self {
        self.imports.extend(imports);
        self
    }

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Declares the tokens meant for the importer
    ///
    /// Exports describe the module's public surface and are checked when the
    /// module is imported: each one must be provided by the module or exported
    /// by one of its imports. They do not restrict [`crate::DiContainer::require`].
    pub fn with_exports(mut self, exports: impl IntoIterator<Item = InjectionToken>) -> Self {
        self.exports.extend(exports);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn imports(&self) -> &[ModuleDescriptor] {
        &self.imports
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn provider(&self, token: &InjectionToken) -> Option<&Provider> {
        self.providers.iter().find(|provider| provider.token == *token)
    }

    pub fn exports(&self) -> &[InjectionToken] {
        &self.exports
    }

    pub fn exports_token(&self, token: &InjectionToken) -> bool {
        self.exports.contains(token)
    }
}
