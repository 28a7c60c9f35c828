//! Integration tests for method invocation and overload resolution.
//!
//! Each test registers a small class whose overloads return a string naming the overload that
//! ran, then checks which one the resolver picked for a given argument list.

use elresolve::{prelude::*, Result};
use std::sync::Arc;

/// The commonly used types of a fresh registry
struct Types {
    registry: Arc<TypeRegistry>,
    object: TypeRc,
    number: TypeRc,
    integer: TypeRc,
    long_ref: TypeRc,
    string: TypeRc,
    int: TypeRc,
    long: TypeRc,
    double: TypeRc,
}

impl Types {
    fn new() -> Self {
        let registry = Arc::new(TypeRegistry::new());
        Types {
            object: registry.builtin(BuiltinType::Object),
            number: registry.builtin(BuiltinType::Number),
            integer: registry.builtin(BuiltinType::Integer),
            long_ref: registry.builtin(BuiltinType::Long),
            string: registry.builtin(BuiltinType::String),
            int: registry.primitive(PrimitiveKind::Int),
            long: registry.primitive(PrimitiveKind::Long),
            double: registry.primitive(PrimitiveKind::Double),
            registry,
        }
    }

    fn array(&self, element: &TypeRc) -> TypeRc {
        self.registry.array_of(element).expect("array type")
    }

    fn values(&self, element: &TypeRc, items: Vec<Value>) -> Value {
        Value::array(&self.registry, element, items).expect("array value")
    }

    fn resolver(&self) -> BeanResolver {
        BeanResolver::new(self.registry.clone(), false)
    }
}

/// An overload returning `label` followed by its arguments
fn overload(name: &str, label: &'static str, params: &[TypeRc], string: &TypeRc) -> MethodSpec {
    MethodSpec::new(name)
        .params(params)
        .returns(string)
        .body(move |_, args| {
            let args: Vec<String> = args.iter().map(Value::to_string).collect();
            Ok(Value::from(format!("{label}({})", args.join(","))))
        })
}

fn invoke(resolver: &BeanResolver, base: &Value, name: &str, args: &[Value]) -> Result<Value> {
    resolver.invoke_method(&mut EvalContext::new(), base, &Value::from(name), None, Some(args))
}

fn sum(args: &[Value]) -> i64 {
    let first = args[0].as_i64().unwrap_or_default();
    let rest = args[1].as_array().map(|a| a.to_vec()).unwrap_or_default();
    first + rest.iter().filter_map(Value::as_i64).sum::<i64>()
}

/// Registers `TestBean` with `add(int, int...)`, `cat(String...)`, a `readWrite` property
/// and a non-public `secret()`.
fn test_bean(types: &Types) -> Result<TypeRc> {
    let ints = types.array(&types.int);
    let strings = types.array(&types.string);

    types
        .registry
        .class("TestBean")
        .property("readWrite", &types.int)
        .with(
            MethodSpec::new("add")
                .param(&types.int)
                .param(&ints)
                .varargs()
                .returns(&types.int)
                .body(|_, args| Ok(Value::Int(sum(args) as i32))),
        )
        .with(
            MethodSpec::new("cat")
                .param(&strings)
                .varargs()
                .returns(&types.string)
                .body(|_, args| {
                    let parts = args[0].as_array().map(|a| a.to_vec()).unwrap_or_default();
                    Ok(Value::from(parts.iter().map(Value::to_string).collect::<String>()))
                }),
        )
        .with(
            MethodSpec::new("secret")
                .non_public()
                .body(|_, _| Ok(Value::Null)),
        )
        .build()
}

/// Varargs are packed from loose arguments, passed through as arrays and coerced.
#[test]
fn test_invoke_varargs() -> Result<()> {
    let types = Types::new();
    let bean = Value::object(&test_bean(&types)?);
    let resolver = types.resolver();

    let add = |args: &[Value]| invoke(&resolver, &bean, "add", args);
    assert_eq!(add(&[Value::Int(1)])?, Value::Int(1));
    assert_eq!(add(&[Value::Int(1), Value::Int(2), Value::Int(3)])?, Value::Int(6));
    assert_eq!(
        add(&[Value::from("1"), Value::from("2"), Value::from("3")])?,
        Value::Int(6)
    );
    assert_eq!(
        add(&[Value::Int(1), types.values(&types.int, vec![Value::Int(2), Value::Int(3)])])?,
        Value::Int(6)
    );
    let doubles = types.registry.builtin(BuiltinType::Double);
    assert_eq!(
        add(&[Value::Int(1), types.values(&doubles, vec![Value::Double(2.0), Value::Double(3.0)])])?,
        Value::Int(6)
    );

    let cat = |args: &[Value]| invoke(&resolver, &bean, "cat", args);
    assert_eq!(cat(&[])?, Value::from(""));
    assert_eq!(
        resolver.invoke_method(&mut EvalContext::new(), &bean, &Value::from("cat"), None, None)?,
        Value::from("")
    );
    assert_eq!(cat(&[Value::Int(123)])?, Value::from("123"));
    assert_eq!(cat(&[Value::Int(1), Value::Int(2), Value::Int(3)])?, Value::from("123"));
    let strings = types.values(
        &types.string,
        vec![Value::from("1"), Value::from("2"), Value::from("3")],
    );
    assert_eq!(cat(&[strings])?, Value::from("123"));

    Ok(())
}

/// A null argument for a primitive parameter binds as zero.
#[test]
fn test_invoke_setter() -> Result<()> {
    let types = Types::new();
    let bean = Value::object(&test_bean(&types)?);
    let resolver = types.resolver();
    let read_write = Value::from("readWrite");
    let mut ctx = EvalContext::new();

    resolver.write_property(&mut ctx, &bean, &read_write, Value::Int(1))?;

    assert_eq!(invoke(&resolver, &bean, "setReadWrite", &[Value::Null])?, Value::Null);
    assert_eq!(resolver.read_property(&mut ctx, &bean, &read_write)?, Value::Int(0));

    assert_eq!(invoke(&resolver, &bean, "setReadWrite", &[Value::Int(5)])?, Value::Null);
    assert_eq!(resolver.read_property(&mut ctx, &bean, &read_write)?, Value::Int(5));

    Ok(())
}

/// Non-public methods are invisible; successful calls mark the context resolved.
#[test]
fn test_invoke_resolved_flag() -> Result<()> {
    let types = Types::new();
    let bean = Value::object(&test_bean(&types)?);
    let resolver = types.resolver();

    let mut ctx = EvalContext::new();
    let result = resolver.invoke_method(&mut ctx, &bean, &Value::from("secret"), None, None);
    assert!(matches!(result, Err(Error::MethodNotFound { .. })));
    assert!(!ctx.is_property_resolved());

    let mut ctx = EvalContext::new();
    let args = [Value::Int(2)];
    resolver.invoke_method(&mut ctx, &bean, &Value::from("add"), None, Some(&args))?;
    assert!(ctx.is_property_resolved());

    Ok(())
}

/// Phase 1: subtyping alone, `null` matching any reference parameter.
#[test]
fn test_phase_subtyping() -> Result<()> {
    let t = Types::new();
    let numbers = t.array(&t.number);
    let class = t
        .registry
        .class("Phase1")
        .with(overload("m", "Integer", &[t.integer.clone()], &t.string))
        .with(overload("m", "Object,Number", &[t.object.clone(), t.number.clone()], &t.string))
        .with(overload("m", "Object,Object", &[t.object.clone(), t.object.clone()], &t.string))
        .with(overload("m", "Object,long", &[t.object.clone(), t.long.clone()], &t.string))
        .with(overload("m", "Object,Number[]", &[t.object.clone(), numbers], &t.string))
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();

    assert_eq!(invoke(&resolver, &bean, "m", &[Value::Null])?, Value::from("Integer(null)"));
    assert_eq!(
        invoke(&resolver, &bean, "m", &[Value::Null, Value::Int(3)])?,
        Value::from("Object,Number(null,3)")
    );
    let integers = t.values(&t.integer, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(
        invoke(&resolver, &bean, "m", &[Value::Null, integers])?,
        Value::from("Object,Number[](null,[1, 2, 3])")
    );

    Ok(())
}

/// Phase 2: boxing and widening conversion, fixed arity preferred over varargs.
#[test]
fn test_phase_conversion() -> Result<()> {
    let t = Types::new();
    let strings = t.array(&t.string);
    let class = t
        .registry
        .class("Phase2")
        .with(overload("m", "Object,long", &[t.object.clone(), t.long.clone()], &t.string))
        .with(overload("m", "Object,double", &[t.object.clone(), t.double.clone()], &t.string))
        .with(overload("m", "Object,Long", &[t.object.clone(), t.long_ref.clone()], &t.string))
        .with(overload("m1", "String", &[t.string.clone()], &t.string))
        .with(overload("m1", "String...", &[strings], &t.string).varargs())
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();

    assert_eq!(
        invoke(&resolver, &bean, "m", &[Value::Null, Value::Long(3)])?,
        Value::from("Object,Long(null,3)")
    );
    assert_eq!(
        invoke(&resolver, &bean, "m", &[Value::Null, Value::Int(2)])?,
        Value::from("Object,long(null,2)")
    );
    assert_eq!(
        invoke(&resolver, &bean, "m1", &[Value::from("abc")])?,
        Value::from("String(abc)")
    );

    Ok(())
}

/// Phase 2*: fixed arity through the coercion policy, arrays element by element.
#[test]
fn test_phase_coercion() -> Result<()> {
    let t = Types::new();
    let integers = t.array(&t.integer);
    let longs = t.array(&t.long_ref);
    let long_matrix = t.array(&longs);
    let class = t
        .registry
        .class("Phase2Star")
        .with(overload("m", "Integer", &[t.integer.clone()], &t.string))
        .with(overload("m2", "String", &[t.string.clone()], &t.string))
        .with(overload("m3", "Integer[]", &[integers.clone()], &t.string))
        .with(overload("m4", "Integer,Integer", &[t.integer.clone(), t.integer.clone()], &t.string))
        .with(overload("m5", "Long[][]", &[long_matrix.clone()], &t.string))
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();

    assert_eq!(invoke(&resolver, &bean, "m", &[Value::Long(3)])?, Value::from("Integer(3)"));
    assert_eq!(
        invoke(&resolver, &bean, "m2", &[Value::Double(1.5)])?,
        Value::from("String(1.5)")
    );

    let mixed = t.values(&t.object, vec![Value::Int(1), Value::from("12")]);
    assert_eq!(
        invoke(&resolver, &bean, "m3", &[mixed])?,
        Value::from("Integer[]([1, 12])")
    );
    let ints = t.values(&t.int, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let result = invoke(&resolver, &bean, "m3", &[ints])?;
    assert_eq!(result, Value::from("Integer[]([1, 2, 3])"));

    assert_eq!(
        invoke(&resolver, &bean, "m4", &[Value::from("12"), Value::Null])?,
        Value::from("Integer,Integer(12,null)")
    );

    let objects = t.array(&t.object);
    let matrix = t.values(
        &objects,
        vec![
            t.values(&t.object, vec![Value::from("123"), Value::Long(1)]),
            t.values(&t.object, vec![Value::Int(1), Value::from("12")]),
        ],
    );
    assert_eq!(
        invoke(&resolver, &bean, "m5", &[matrix])?,
        Value::from("Long[][]([[123, 1], [1, 12]])")
    );

    Ok(())
}

/// Phase 3: variadic candidates by conversion, loose or pre-packed trailing arguments.
#[test]
fn test_phase_varargs_conversion() -> Result<()> {
    let t = Types::new();
    let integers = t.array(&t.integer);
    let ints = t.array(&t.int);
    let longs = t.array(&t.long);
    let class = t
        .registry
        .class("Phase3")
        .with(overload("m", "Integer...", &[integers], &t.string).varargs())
        .with(overload("m2", "long...", &[longs], &t.string).varargs())
        .with(overload("m2", "int...", &[ints], &t.string).varargs())
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();

    let empty = resolver.invoke_method(&mut EvalContext::new(), &bean, &Value::from("m"), None, None)?;
    assert_eq!(empty, Value::from("Integer...([])"));

    let packed = t.values(&t.integer, vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(
        invoke(&resolver, &bean, "m", &[packed])?,
        Value::from("Integer...([1, 2])")
    );
    assert_eq!(
        invoke(&resolver, &bean, "m", &[Value::Int(1), Value::Int(2)])?,
        Value::from("Integer...([1, 2])")
    );

    let int_packed = t.values(&t.int, vec![Value::Int(4)]);
    assert_eq!(
        invoke(&resolver, &bean, "m2", &[int_packed])?,
        Value::from("int...([4])")
    );

    Ok(())
}

/// Phase 3*: variadic candidates through the coercion policy.
#[test]
fn test_phase_varargs_coercion() -> Result<()> {
    let t = Types::new();
    let integers = t.array(&t.integer);
    let class = t
        .registry
        .class("Phase3Star")
        .with(overload("m", "Integer...", &[integers.clone()], &t.string).varargs())
        .with(
            overload("m2", "Integer,Integer...", &[t.integer.clone(), integers], &t.string)
                .varargs(),
        )
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();

    assert_eq!(
        invoke(&resolver, &bean, "m", &[Value::from("1"), Value::from("2")])?,
        Value::from("Integer...([1, 2])")
    );

    let packed = t.values(&t.object, vec![Value::Int(3), Value::from("1"), Value::Long(123)]);
    assert_eq!(
        invoke(&resolver, &bean, "m2", &[Value::from("1"), packed])?,
        Value::from("Integer,Integer...(1,[3, 1, 123])")
    );
    assert_eq!(
        invoke(
            &resolver,
            &bean,
            "m2",
            &[Value::from("1"), Value::Int(3), Value::from("1"), Value::Int(123)]
        )?,
        Value::from("Integer,Integer...(1,[3, 1, 123])")
    );

    Ok(())
}

/// Calls without an applicable or a single most specific candidate fail.
#[test]
fn test_resolution_failures() -> Result<()> {
    let t = Types::new();
    let integers = t.array(&t.integer);
    let int_matrix = t.array(&integers);
    let strings = t.array(&t.string);
    let class = t
        .registry
        .class("Unresolvable")
        .with(overload("m", "Integer[]", &[integers.clone()], &t.string))
        .with(overload("m2", "Integer", &[t.integer.clone()], &t.string))
        .with(overload("m2", "String", &[t.string.clone()], &t.string))
        .with(overload("m3", "Integer...", &[integers], &t.string).varargs())
        .with(overload("m4", "long...", &[t.array(&t.long)], &t.string).varargs())
        .with(overload("m4", "int...", &[t.array(&t.int)], &t.string).varargs())
        .with(
            overload("m5", "String,String...", &[t.string.clone(), strings.clone()], &t.string)
                .varargs(),
        )
        .with(overload("m5", "String...", &[strings], &t.string).varargs())
        .with(overload("m6", "Integer[][]", &[int_matrix], &t.string))
        .with(overload("m7", "long...", &[t.array(&t.long)], &t.string).varargs())
        .with(overload("m7", "Object...", &[t.array(&t.object)], &t.string).varargs())
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();
    let mixed = || t.values(&t.object, vec![Value::Int(1), Value::from("abc")]);

    let unresolved = |name: &str, args: &[Value]| {
        invoke(&resolver, &bean, name, args).expect_err("call must not resolve")
    };

    // Object[] elements that do not coerce to Integer
    let err = unresolved("m", &[mixed()]);
    assert!(err.is_not_found() && !err.is_ambiguous());
    assert!(!unresolved("m", &[Value::Long(2)]).is_ambiguous());
    assert!(unresolved("noSuchMethod", &[]).is_not_found());
    assert!(unresolved("m2", &[Value::Long(2)]).is_ambiguous());
    assert!(!unresolved("m3", &[Value::from("abc"), Value::Int(3)]).is_ambiguous());
    assert!(unresolved("m4", &[Value::Int(3)]).is_ambiguous());
    assert!(unresolved("m5", &[Value::from("abc")]).is_ambiguous());
    assert!(unresolved("m7", &[Value::Int(3)]).is_ambiguous());

    let ints = t.values(&t.int, vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
    let nested = t.values(&t.object, vec![ints, mixed()]);
    assert!(unresolved("m6", &[nested]).is_not_found());

    Ok(())
}

/// The failure reports the receiver, the name and the argument types.
#[test]
fn test_not_found_message() -> Result<()> {
    let t = Types::new();
    let bean = Value::object(&test_bean(&t)?);
    let resolver = t.resolver();

    match invoke(&resolver, &bean, "noSuchMethod", &[Value::Null, Value::Int(1)]) {
        Err(Error::MethodNotFound {
            type_name,
            method,
            arg_types,
            reason,
        }) => {
            assert_eq!(type_name, "TestBean");
            assert_eq!(method, "noSuchMethod");
            assert_eq!(arg_types, vec!["null".to_string(), "Integer".to_string()]);
            assert_eq!(reason, NotFoundReason::NoApplicableMethod);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    Ok(())
}

/// Rejects every conversion
struct Refusing;

impl CoercionPolicy for Refusing {
    fn coerce(&self, value: &Value, target: &TypeRc) -> std::result::Result<Value, CoercionError> {
        Err(CoercionError::new(value.to_string(), target.name.clone()))
    }
}

/// Coercing phases consult the context's policy; rejections only rule candidates out.
#[test]
fn test_policy_from_context() -> Result<()> {
    let t = Types::new();
    let strings = t.array(&t.string);
    let other = t.registry.class("Other").build()?;
    let class = t
        .registry
        .class("StarPhases")
        .with(overload("m", "String", &[t.string.clone()], &t.string))
        .with(overload("n", "String...", &[strings], &t.string).varargs())
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();

    let refusing = || EvalContext::new().with_coercion_policy(Arc::new(Refusing));
    let call = |name: &str, args: &[Value]| {
        resolver.invoke_method(&mut refusing(), &bean, &Value::from(name), None, Some(args))
    };

    assert!(matches!(
        call("m", &[Value::object(&other)]),
        Err(Error::MethodNotFound { .. })
    ));
    assert!(matches!(
        call("n", &[Value::from("a"), Value::Int(1)]),
        Err(Error::MethodNotFound { .. })
    ));

    // the standard policy resolves the same calls
    assert_eq!(
        invoke(&resolver, &bean, "n", &[Value::from("a"), Value::Int(1)])?,
        Value::from("String...([a, 1])")
    );
    // null skips the policy when bound to a reference parameter
    assert_eq!(call("m", &[Value::Null])?, Value::from("String(null)"));

    Ok(())
}

/// Explicit parameter types select by signature and skip overload resolution.
#[test]
fn test_explicit_signature() -> Result<()> {
    let t = Types::new();
    let class = t
        .registry
        .class("Explicit")
        .with(overload("m", "Integer", &[t.integer.clone()], &t.string))
        .with(overload("m", "String", &[t.string.clone()], &t.string))
        .build()?;
    let bean = Value::object(&class);
    let resolver = t.resolver();
    let name = Value::from("m");

    let args = [Value::from("7")];
    let mut ctx = EvalContext::new();
    let result = resolver.invoke_method(
        &mut ctx,
        &bean,
        &name,
        Some(&[t.integer.clone()][..]),
        Some(&args),
    )?;
    assert_eq!(result, Value::from("Integer(7)"));
    assert!(ctx.is_property_resolved());

    let missing = resolver.invoke_method(
        &mut EvalContext::new(),
        &bean,
        &name,
        Some(&[t.long_ref.clone()][..]),
        Some(&args),
    );
    assert!(matches!(
        missing,
        Err(Error::MethodNotFound {
            reason: NotFoundReason::NoSuchSignature,
            ..
        })
    ));

    // arguments that cannot be bound to the chosen signature are an evaluation error
    let unbindable = [Value::from("seven")];
    let err = resolver
        .invoke_method(
            &mut EvalContext::new(),
            &bean,
            &name,
            Some(&[t.integer.clone()][..]),
            Some(&unbindable),
        )
        .expect_err("not an Integer");
    assert!(err.is_invocation_failure());
    assert!(std::error::Error::source(&err).is_some());

    Ok(())
}
