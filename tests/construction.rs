use metaclass::{DeclKind, InterfaceSpec, Member, MetaError, Runtime, TypeSpec, Value};

#[test]
fn declared_type_keeps_identity_and_reaches_root() {
    let mut rt = Runtime::new();
    let a = rt.declare_type(TypeSpec::new("Animal")).unwrap();
    let b = rt.declare_type(TypeSpec::new("Dog").extends(a)).unwrap();

    let dog = rt.get_type(b).unwrap();
    assert_eq!(dog.name(), "Dog");
    assert_eq!(dog.ancestor(), Some(a));
    assert_eq!(dog.lineage().last(), Some(&rt.root()));
    assert_eq!(rt.find_type("Dog"), Some(b));

    let mut hops = 0;
    let mut current = Some(b);
    while let Some(ty) = current {
        current = rt.get_type(ty).unwrap().ancestor();
        hops += 1;
    }
    assert_eq!(hops, 3);
}

#[test]
fn missing_identity_is_a_naming_error_without_side_effects() {
    let mut rt = Runtime::new();
    let before = rt.get_type(rt.root()).unwrap().members().len();
    let err = rt.declare_type(TypeSpec::anonymous().value("x", 1)).unwrap_err();
    assert!(matches!(err, MetaError::Naming(DeclKind::Type)));
    assert_eq!(rt.get_type(rt.root()).unwrap().members().len(), before);
    assert!(rt.get_type(metaclass::TypeId(1)).is_none());
}

#[test]
fn anonymous_interface_is_a_naming_error() {
    let mut rt = Runtime::new();
    let err = rt
        .declare_interface(InterfaceSpec::anonymous().abstract_member("run"))
        .unwrap_err();
    assert!(matches!(err, MetaError::Naming(DeclKind::Interface)));
    assert!(rt.get_interface(metaclass::InterfaceId(0)).is_none());

    let err = rt.declare_interface(InterfaceSpec::new("")).unwrap_err();
    assert!(matches!(err, MetaError::Naming(DeclKind::Interface)));
    assert!(rt.find_interface("").is_none());
}

#[test]
fn abstract_types_never_instantiate() {
    let mut rt = Runtime::new();
    let shape = rt
        .declare_type(TypeSpec::new("Shape").abstract_type())
        .unwrap();
    let square = rt.declare_type(TypeSpec::new("Square").extends(shape)).unwrap();

    for args in [vec![], vec![Value::Integer(1)], vec![Value::Nil, Value::Nil]] {
        let err = rt.instantiate(shape, &args).unwrap_err();
        assert!(matches!(err, MetaError::AbstractInstantiation { .. }));
        assert!(rt.instantiate(square, &args).is_ok());
    }
}

#[test]
fn last_declaration_wins_and_stays_wrapped() {
    let mut rt = Runtime::new();
    let ty = rt
        .declare_type(
            TypeSpec::new("Twice")
                .method("m", |_, _, _| Ok(Value::Integer(1)))
                .method("m", |_, _, _| Ok(Value::Integer(2))),
        )
        .unwrap();
    let m = rt.symbols().find("m").unwrap();
    let member = rt.get_type(ty).unwrap().members().get(m).unwrap();
    let function = member.as_function().unwrap();
    let context = function.context().unwrap();
    assert_eq!(context.owner, ty);
    assert_eq!(context.name, m);

    let obj = rt.instantiate(ty, &[]).unwrap();
    assert_eq!(rt.call_method(&obj, "m", &[]).unwrap(), Value::Integer(2));
}

#[test]
fn non_function_members_are_stored_as_is() {
    let mut rt = Runtime::new();
    let ty = rt
        .declare_type(TypeSpec::new("Config").value("limit", 10).value("label", "x"))
        .unwrap();
    let limit = rt.symbols().find("limit").unwrap();
    assert_eq!(
        rt.get_type(ty).unwrap().members().get(limit),
        Some(&Member::Value(Value::Integer(10)))
    );
}

#[test]
fn default_to_string_and_implements_are_inherited() {
    let mut rt = Runtime::new();
    let ty = rt.declare_type(TypeSpec::new("Plain")).unwrap();
    let obj = rt.instantiate(ty, &[]).unwrap();
    assert_eq!(
        rt.call_method(&obj, "toString", &[]).unwrap(),
        Value::from("[object Plain]")
    );
    assert_eq!(
        rt.call_method(&obj, "implements", &[Value::Nil]).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(rt.type_to_string(ty), "[object Class for Plain]");
}
