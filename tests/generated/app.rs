//! Generated by tagfile from `app.tagschema` - DO NOT EDIT
//!
//! schema-sha256: 1ad308c1b2ca39f7ab4703caee6d80125e5c476f6998bf64858338a3c1c947b2

#[allow(unused_imports)]
use std::sync::OnceLock;

#[allow(unused_imports)]
use tagfile::{Cardinality, FieldRule, LoadContext, ScalarType, TagClass, TagNode, Value, ValueConstraint};

/// Application root.
#[derive(Debug, Clone, PartialEq)]
pub struct App {
    name: String,
    server: Vec<Server>,
    limits: Option<Limits>,
    mode: String,
    debug: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            name: Default::default(),
            server: Default::default(),
            limits: Default::default(),
            mode: "dev".to_string(),
            debug: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, value: impl Into<String>) -> &mut Self {
        self.name = value.into();
        self
    }

    pub fn server(&self) -> &[Server] {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut [Server] {
        &mut self.server
    }

    pub fn set_server(&mut self, values: Vec<Server>) -> &mut Self {
        self.server = values;
        self
    }

    pub fn add_server(&mut self, value: Server) -> &mut Self {
        self.server.push(value);
        self
    }

    pub fn clear_server(&mut self) -> &mut Self {
        self.server.clear();
        self
    }

    pub fn limits(&self) -> Option<&Limits> {
        self.limits.as_ref()
    }

    pub fn limits_mut(&mut self) -> Option<&mut Limits> {
        self.limits.as_mut()
    }

    pub fn set_limits(&mut self, value: Limits) -> &mut Self {
        self.limits = Some(value);
        self
    }

    pub fn clear_limits(&mut self) -> &mut Self {
        self.limits = None;
        self
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn set_mode(&mut self, value: impl Into<String>) -> &mut Self {
        self.mode = value.into();
        self
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, value: bool) -> &mut Self {
        self.debug = value;
        self
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl TagClass for App {
    const TAG: &'static str = "app";

    fn rules() -> &'static [FieldRule] {
        static RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();
        RULES.get_or_init(|| {
            vec![
                FieldRule::scalar("name", ScalarType::String, Cardinality::EXACTLY_ONE),
                FieldRule::nested("server", Cardinality::ONE_OR_MORE),
                FieldRule::nested("limits", Cardinality::OPTIONAL),
                FieldRule::scalar("mode", ScalarType::String, Cardinality::EXACTLY_ONE).with_default().with_constraint(ValueConstraint::one_of(&["dev", "prod"])),
                FieldRule::flag("debug"),
            ]
        })
    }

    fn read_fields(node: &TagNode, cx: &mut LoadContext) -> Self {
        Self {
            name: cx.scalar(node, "name"),
            server: cx.nested_all(node, "server"),
            limits: cx.optional_nested(node, "limits"),
            mode: cx.scalar_or(node, "mode", "dev".to_string()),
            debug: cx.flag(node, "debug"),
        }
    }

    fn write_fields(&self, node: &mut TagNode) {
        node.create_child("name").set_value(Value::scalar(&self.name));
        for value in &self.server {
            node.append_child(value.to_node("server"));
        }
        if let Some(value) = &self.limits {
            node.append_child(value.to_node("limits"));
        }
        node.create_child("mode").set_value(Value::scalar(&self.mode));
        if self.debug {
            node.create_child("debug");
        }
    }
}

/// A listening server.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    host: String,
    port: i64,
    tag: Vec<String>,
    weights: Option<Vec<f64>>,
}

impl Server {
    pub fn new() -> Self {
        Self {
            host: Default::default(),
            port: 8080,
            tag: Default::default(),
            weights: Default::default(),
        }
    }

    /// Host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, value: impl Into<String>) -> &mut Self {
        self.host = value.into();
        self
    }

    pub fn port(&self) -> i64 {
        self.port
    }

    pub fn set_port(&mut self, value: i64) -> &mut Self {
        self.port = value;
        self
    }

    pub fn tag(&self) -> &[String] {
        &self.tag
    }

    pub fn set_tag(&mut self, values: Vec<String>) -> &mut Self {
        self.tag = values;
        self
    }

    pub fn add_tag(&mut self, value: impl Into<String>) -> &mut Self {
        self.tag.push(value.into());
        self
    }

    pub fn clear_tag(&mut self) -> &mut Self {
        self.tag.clear();
        self
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn set_weights(&mut self, value: Vec<f64>) -> &mut Self {
        self.weights = Some(value);
        self
    }

    pub fn clear_weights(&mut self) -> &mut Self {
        self.weights = None;
        self
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl TagClass for Server {
    const TAG: &'static str = "server";

    fn rules() -> &'static [FieldRule] {
        static RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();
        RULES.get_or_init(|| {
            vec![
                FieldRule::scalar("host", ScalarType::String, Cardinality::EXACTLY_ONE),
                FieldRule::scalar("port", ScalarType::Int, Cardinality::EXACTLY_ONE).with_default().with_constraint(ValueConstraint::IntRange { min: Some(1), max: Some(65535) }),
                FieldRule::scalar("tag", ScalarType::String, Cardinality::ZERO_OR_MORE),
                FieldRule::vector("weights", ScalarType::Float, Cardinality::OPTIONAL),
            ]
        })
    }

    fn read_fields(node: &TagNode, cx: &mut LoadContext) -> Self {
        Self {
            host: cx.scalar(node, "host"),
            port: cx.scalar_or(node, "port", 8080),
            tag: cx.scalars(node, "tag"),
            weights: cx.optional_vector(node, "weights"),
        }
    }

    fn write_fields(&self, node: &mut TagNode) {
        node.create_child("host").set_value(Value::scalar(&self.host));
        node.create_child("port").set_value(Value::scalar(&self.port));
        for value in &self.tag {
            node.create_child("tag").set_value(Value::scalar(value));
        }
        if let Some(value) = &self.weights {
            node.create_child("weights").set_value(Value::vector(value));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    max_conn: Option<u64>,
    ratio: f64,
}

impl Limits {
    pub fn new() -> Self {
        Self {
            max_conn: Default::default(),
            ratio: 0.5,
        }
    }

    pub fn max_conn(&self) -> Option<u64> {
        self.max_conn
    }

    pub fn set_max_conn(&mut self, value: u64) -> &mut Self {
        self.max_conn = Some(value);
        self
    }

    pub fn clear_max_conn(&mut self) -> &mut Self {
        self.max_conn = None;
        self
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_ratio(&mut self, value: f64) -> &mut Self {
        self.ratio = value;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}

impl TagClass for Limits {
    const TAG: &'static str = "limits";

    fn rules() -> &'static [FieldRule] {
        static RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();
        RULES.get_or_init(|| {
            vec![
                FieldRule::scalar("max-conn", ScalarType::UInt, Cardinality::OPTIONAL),
                FieldRule::scalar("ratio", ScalarType::Float, Cardinality::EXACTLY_ONE).with_default().with_constraint(ValueConstraint::FloatRange { min: Some(0.0), max: Some(1.0) }),
            ]
        })
    }

    fn read_fields(node: &TagNode, cx: &mut LoadContext) -> Self {
        Self {
            max_conn: cx.optional(node, "max-conn"),
            ratio: cx.scalar_or(node, "ratio", 0.5),
        }
    }

    fn write_fields(&self, node: &mut TagNode) {
        if let Some(value) = &self.max_conn {
            node.create_child("max-conn").set_value(Value::scalar(value));
        }
        node.create_child("ratio").set_value(Value::scalar(&self.ratio));
    }
}
