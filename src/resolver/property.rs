//! Bean property tables.
//!
//! A [`PropertyTable`] lists the properties of one type, derived from its public accessor
//! methods the same way bean introspection does it:
//!
//! - `getFoo()` with a return type, or `isFoo()` returning `boolean`, reads property `foo`
//! - `setFoo(value)` without a return type writes property `foo`; a setter whose parameter
//!   type differs from the getter's return type is ignored
//! - names are decapitalised unless their first two characters are both upper case (`URL`)
//!
//! Each accessor is stored as a [`MethodHandle`], so the accessibility fallback for accessors
//! declared on non-public types happens once, while the table is built. An accessor that is
//! not publicly reachable is treated as absent.

use std::collections::BTreeMap;

use tracing::debug;

use crate::metadata::{
    method::{MethodHandle, MethodRc},
    token::Token,
    typesystem::{PrimitiveKind, TypeRc, TypeScope},
};

/// Read and write accessors of one property
#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    name: String,
    property_type: TypeRc,
    read: Option<MethodHandle>,
    write: Option<MethodHandle>,
}

impl PropertyDescriptor {
    /// Property name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type
    #[must_use]
    pub fn property_type(&self) -> &TypeRc {
        &self.property_type
    }

    /// The read accessor, if readable
    #[must_use]
    pub fn read_method(&self) -> Option<&MethodHandle> {
        self.read.as_ref()
    }

    /// The write accessor, if writable
    #[must_use]
    pub fn write_method(&self) -> Option<&MethodHandle> {
        self.write.as_ref()
    }

    /// A property is read-only iff it has no write accessor
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.write.is_none()
    }
}

/// Design-time description of a property, as listed by
/// [`crate::Resolver::feature_descriptors`]
#[derive(Clone, Debug)]
pub struct FeatureDescriptor {
    /// Property name
    pub name: String,
    /// Display name, identical to the property name
    pub display_name: String,
    /// Declared value type
    pub property_type: TypeRc,
    /// Whether the property can be resolved without an instance; always `true`
    pub resolvable_at_design_time: bool,
}

/// All properties of one type
#[derive(Debug)]
pub struct PropertyTable {
    owner: Token,
    owner_name: String,
    scope: TypeScope,
    properties: BTreeMap<String, PropertyDescriptor>,
}

enum Accessor {
    Read(String),
    Write(String),
}

impl PropertyTable {
    /// Introspect `ty` and build its property table.
    ///
    /// The result depends only on the declared shape of `ty`; building twice yields equal
    /// tables.
    #[must_use]
    pub fn build(ty: &TypeRc) -> Self {
        let mut readers: BTreeMap<String, MethodRc> = BTreeMap::new();
        let mut writers: BTreeMap<String, MethodRc> = BTreeMap::new();

        for method in ty.public_methods() {
            match Self::classify(&method) {
                Some(Accessor::Read(name)) => {
                    readers.entry(name).or_insert(method);
                }
                Some(Accessor::Write(name)) => {
                    writers.entry(name).or_insert(method);
                }
                None => {}
            }
        }

        let mut properties = BTreeMap::new();
        for (name, reader) in &readers {
            let Some(property_type) = reader.returns.clone() else {
                continue;
            };
            let write = writers
                .get(name)
                .filter(|writer| writer.params[0].token == property_type.token)
                .and_then(MethodHandle::resolve);
            properties.insert(
                name.clone(),
                PropertyDescriptor {
                    name: name.clone(),
                    property_type,
                    read: MethodHandle::resolve(reader),
                    write,
                },
            );
        }
        for (name, writer) in writers {
            if properties.contains_key(&name) {
                continue;
            }
            properties.insert(
                name.clone(),
                PropertyDescriptor {
                    name,
                    property_type: writer.params[0].clone(),
                    read: None,
                    write: MethodHandle::resolve(&writer),
                },
            );
        }

        debug!(ty = %ty.name, properties = properties.len(), "built property table");
        PropertyTable {
            owner: ty.token,
            owner_name: ty.name.clone(),
            scope: ty.scope,
            properties,
        }
    }

    fn classify(method: &MethodRc) -> Option<Accessor> {
        let name = method.name.as_str();
        match (method.params.len(), &method.returns) {
            (0, Some(returns)) => {
                if let Some(rest) = name.strip_prefix("get") {
                    decapitalize(rest).map(Accessor::Read)
                } else if let Some(rest) = name.strip_prefix("is") {
                    if returns.primitive() == Some(PrimitiveKind::Boolean) {
                        decapitalize(rest).map(Accessor::Read)
                    } else {
                        None
                    }
                } else {
                    None
                }
            }
            (1, None) => name
                .strip_prefix("set")
                .and_then(decapitalize)
                .map(Accessor::Write),
            _ => None,
        }
    }

    /// Token of the introspected type
    #[must_use]
    pub fn owner(&self) -> Token {
        self.owner
    }

    /// Name of the introspected type
    #[must_use]
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Loading scope of the introspected type
    #[must_use]
    pub fn scope(&self) -> TypeScope {
        self.scope
    }

    /// Look up a property
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    /// All properties, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values()
    }

    /// Number of properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the type has no properties
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// `FooBar` becomes `fooBar`, `URL` stays `URL`, the empty string is not a property name
fn decapitalize(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    let second = chars.next();
    if first.is_uppercase() && second.is_some_and(char::is_uppercase) {
        return Some(name.to_string());
    }
    Some(first.to_lowercase().chain(name[first.len_utf8()..].chars()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            typesystem::{BuiltinType, MethodSpec, TypeRegistry},
            value::Value,
        },
        Result,
    };

    #[test]
    fn test_decapitalize() {
        assert_eq!(decapitalize("ReadOnly").as_deref(), Some("readOnly"));
        assert_eq!(decapitalize("URL").as_deref(), Some("URL"));
        assert_eq!(decapitalize("X").as_deref(), Some("x"));
        assert_eq!(decapitalize(""), None);
    }

    #[test]
    fn test_introspection() -> Result<()> {
        let registry = TypeRegistry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let boolean = registry.primitive(PrimitiveKind::Boolean);
        let string = registry.builtin(BuiltinType::String);

        let bean = registry
            .class("Bean")
            .property("readWrite", &int)
            .getter("readOnly", &int, |_| Ok(Value::Int(123)))
            .with(
                MethodSpec::new("setReadOnly")
                    .param(&int)
                    .non_public()
                    .body(|_, _| Ok(Value::Null)),
            )
            .with(
                MethodSpec::new("getWriteOnly")
                    .returns(&int)
                    .non_public()
                    .body(|_, _| Ok(Value::Int(789))),
            )
            .setter("writeOnly", &int, |_, _| Ok(()))
            .with(
                MethodSpec::new("isActive")
                    .returns(&boolean)
                    .body(|_, _| Ok(Value::Boolean(true))),
            )
            .with(
                MethodSpec::new("isNamed")
                    .returns(&string)
                    .body(|_, _| Ok(Value::Null)),
            )
            .setter("mismatched", &string, |_, _| Ok(()))
            .getter("mismatched", &int, |_| Ok(Value::Int(0)))
            .build()?;

        let table = PropertyTable::build(&bean);
        let names: Vec<&str> = table.iter().map(PropertyDescriptor::name).collect();
        assert_eq!(
            names,
            vec!["active", "class", "mismatched", "readOnly", "readWrite", "writeOnly"]
        );

        let read_only = table.get("readOnly").expect("readOnly");
        assert!(read_only.is_read_only());
        assert!(read_only.read_method().is_some());

        let write_only = table.get("writeOnly").expect("writeOnly");
        assert!(write_only.read_method().is_none());
        assert!(!write_only.is_read_only());
        assert_eq!(write_only.property_type().token, int.token);

        assert!(table.get("mismatched").is_some_and(|p| p.is_read_only()));
        assert!(table.get("named").is_none());
        assert_eq!(
            table.get("class").map(|p| p.property_type().token),
            Some(BuiltinType::Class.token())
        );
        assert_eq!(table.owner(), bean.token);
        Ok(())
    }

    #[test]
    fn test_accessor_through_public_interface() -> Result<()> {
        let registry = TypeRegistry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let iface = registry
            .interface("Answer")
            .with(MethodSpec::new("getFortyTwo").returns(&int))
            .build()?;
        let hidden = registry
            .class("Hidden")
            .non_public()
            .implements(&iface)
            .getter("fortyTwo", &int, |_| Ok(Value::Int(42)))
            .build()?;

        let table = PropertyTable::build(&hidden);
        let read = table
            .get("fortyTwo")
            .and_then(PropertyDescriptor::read_method)
            .expect("reachable through Answer");
        assert_eq!(
            read.declaration().declaring_type().map(|t| t.token),
            Some(iface.token)
        );
        Ok(())
    }
}
