// MetaClass Printer - value output
//
// Descriptors print as `[object <Meta> for <Name>]` and
// `[interface <Meta> for <Name>]`; instances go through their `toString`
// member, whose root default prints `[object <TypeName>]`.

use crate::error::MetaResult;
use crate::runtime::Runtime;
use crate::types::{InstanceId, InterfaceId, MetaTypeId, TypeId, Value};

/// Print options
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Quote and escape strings
    pub escape: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self { escape: true }
    }
}

impl PrintOptions {
    /// Human-readable output, strings unquoted
    pub fn display() -> Self {
        Self { escape: false }
    }
}

/// Side-effect free printer. Instances print by tag only.
pub struct Printer<'a> {
    runtime: &'a Runtime,
    output: String,
    options: PrintOptions,
}

impl<'a> Printer<'a> {
    pub fn new(runtime: &'a Runtime, options: PrintOptions) -> Self {
        Self {
            runtime,
            output: String::new(),
            options,
        }
    }

    pub fn print(&mut self, value: &Value) -> &str {
        self.print_value(value);
        &self.output
    }

    fn print_value(&mut self, value: &Value) {
        match value {
            Value::Nil => self.output.push_str("nil"),
            Value::Bool(b) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Integer(n) => self.output.push_str(&n.to_string()),
            Value::BigInt(n) => self.output.push_str(&n.to_string()),
            Value::Float(f) => {
                if f.is_nan() {
                    self.output.push_str("NaN");
                } else if f.is_infinite() {
                    self.output
                        .push_str(if f.is_sign_positive() { "Infinity" } else { "-Infinity" });
                } else {
                    self.output.push_str(&f.to_string());
                }
            }
            Value::String(s) => {
                if self.options.escape {
                    self.output.push('"');
                    for c in s.chars() {
                        if c == '"' || c == '\\' {
                            self.output.push('\\');
                        }
                        self.output.push(c);
                    }
                    self.output.push('"');
                } else {
                    self.output.push_str(s);
                }
            }
            Value::Function(f) => match f.context() {
                Some(ctx) => {
                    let name = self.runtime.symbols().name(ctx.name).to_string();
                    self.output.push_str(&format!("[function {}]", name));
                }
                None => self.output.push_str("[function]"),
            },
            Value::Type(id) => {
                let text = self.runtime.type_to_string(*id);
                self.output.push_str(&text);
            }
            Value::Interface(id) => {
                let text = self.runtime.interface_to_string(*id);
                self.output.push_str(&text);
            }
            Value::Instance(id) => {
                let text = self.runtime.instance_tag(*id);
                self.output.push_str(&text);
            }
        }
    }
}

impl Runtime {
    /// `[object <Meta> for <Name>]`
    pub fn type_to_string(&self, ty: TypeId) -> String {
        match self.get_type(ty) {
            Some(d) => format!("[object {} for {}]", self.meta_name(d.meta()), d.name()),
            None => format!("#<type {}>", ty.0),
        }
    }

    /// `[interface <Meta> for <Name>]`
    pub fn interface_to_string(&self, iface: InterfaceId) -> String {
        match self.get_interface(iface) {
            Some(d) => format!("[interface {} for {}]", self.meta_name(d.meta()), d.name()),
            None => format!("#<interface {}>", iface.0),
        }
    }

    /// `[object <TypeName>]`
    pub fn instance_tag(&self, instance: InstanceId) -> String {
        match self.get_instance(instance).and_then(|i| self.get_type(i.ty())) {
            Some(d) => format!("[object {}]", d.name()),
            None => format!("#<instance {}>", instance.0),
        }
    }

    fn meta_name(&self, meta: MetaTypeId) -> &str {
        self.get_meta_type(meta).map(|m| m.name()).unwrap_or("?")
    }

    /// Print a value for display. Instances are asked for their `toString`.
    pub fn print_to_string(&mut self, value: &Value) -> MetaResult<String> {
        if value.as_instance().is_some() {
            let text = self.call_method(value, "toString", &[])?;
            return Ok(match text {
                Value::String(s) => s,
                other => Printer::new(self, PrintOptions::display()).print(&other).to_string(),
            });
        }
        Ok(Printer::new(self, PrintOptions::display()).print(value).to_string())
    }
}

/// Readable form of a value without running any member code.
pub fn prin1_to_string(runtime: &Runtime, value: &Value) -> String {
    Printer::new(runtime, PrintOptions::default()).print(value).to_string()
}
