//! Contract of the endpoint registry this crate plugs into.
//!
//! The registry itself (routing, HTTP plumbing, request parsing) is
//! the host application's concern; it accepts endpoint descriptors and
//! later invokes their handlers with a string-keyed parameter map,
//! expecting back a response body and an HTTP-style status code.

use std::collections::BTreeMap;

/// Textual parameters as delivered by the registry.
pub type Params = BTreeMap<String, String>;

/// Response body plus HTTP-style status code.
pub type Response = (String, u16);

/// Declared type of an endpoint parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Str,
}

/// One declared endpoint parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub fn required_int(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: ParamKind::Int, required: true }
    }

    /// Optional integer parameter.
    pub fn int(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: ParamKind::Int, required: false }
    }

    pub fn required_str(name: &'static str, description: &'static str) -> Self {
        Self { name, description, kind: ParamKind::Str, required: true }
    }
}

/// Declared response content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Json,
}

/// A registrable endpoint: route, documentation, parameter schema,
/// and the handler the registry will invoke.
pub struct Endpoint {
    pub route: &'static str,
    pub summary: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub response: ResponseKind,
    handler: Box<dyn FnMut(&Params) -> Response>,
}

impl Endpoint {
    pub fn new(
        route: &'static str,
        handler: impl FnMut(&Params) -> Response + 'static,
    ) -> Self {
        Self {
            route,
            summary: "",
            description: "",
            params: Vec::new(),
            response: ResponseKind::Json,
            handler: Box::new(handler),
        }
    }

    pub fn summary(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self
    }

    /// Run the handler. Called by the registry on each request.
    pub fn invoke(&mut self, params: &Params) -> Response {
        (self.handler)(params)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("route", &self.route)
            .field("summary", &self.summary)
            .field("params", &self.params)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

/// The consumed collaborator: anything that can accept endpoint
/// registrations.
pub trait EndpointRegistry {
    fn add_endpoint(&mut self, endpoint: Endpoint);
}

/// Extension point for specialized device drivers that want to expose
/// their own routes next to the builtin ones.
///
/// Together with [`i2c_manager::BusEvents`] this is the capability
/// interface for layering device-specific behavior on top of the
/// generic core.
pub trait CustomEndpoints {
    fn register_custom_endpoints(&mut self, registry: &mut dyn EndpointRegistry) {
        let _ = registry;
    }
}
