use metaclass::{CallKind, Config, DispatchError, Function, MetaError, Runtime, TypeId, TypeSpec, Value};

fn parent_and_child(rt: &mut Runtime) -> (TypeId, TypeId) {
    let parent = rt
        .declare_type(TypeSpec::new("P").method("m", |_, _, _| Ok(Value::Integer(1))))
        .unwrap();
    let child = rt
        .declare_type(TypeSpec::new("C").extends(parent).method("m", |rt, this, args| {
            if args.first().map_or(false, Value::truthy) {
                let inner = rt.call_method(this, "m", &[])?;
                assert_eq!(inner, Value::Integer(2));
            }
            let base = rt.call_super(this, &[])?;
            Ok(Value::Integer(base.as_integer().unwrap_or(0) + 1))
        }))
        .unwrap();
    (parent, child)
}

#[test]
fn super_call_reaches_the_ancestor() {
    let mut rt = Runtime::new();
    let (_, child) = parent_and_child(&mut rt);
    let c = rt.instantiate(child, &[]).unwrap();
    assert_eq!(rt.call_method(&c, "m", &[]).unwrap(), Value::Integer(2));
    assert_eq!(rt.dispatch_context(&c), None);
}

#[test]
fn super_call_after_recursion_still_reaches_the_ancestor() {
    let mut rt = Runtime::new();
    let (_, child) = parent_and_child(&mut rt);
    let c = rt.instantiate(child, &[]).unwrap();
    assert_eq!(
        rt.call_method(&c, "m", &[Value::Bool(true)]).unwrap(),
        Value::Integer(2)
    );
}

#[test]
fn three_level_chain_accumulates() {
    let mut rt = Runtime::new();
    let (_, child) = parent_and_child(&mut rt);
    let grandchild = rt
        .declare_type(TypeSpec::new("G").extends(child).method("m", |rt, this, _| {
            let base = rt.call_super(this, &[])?;
            Ok(Value::Integer(base.as_integer().unwrap_or(0) * 10))
        }))
        .unwrap();
    let g = rt.instantiate(grandchild, &[]).unwrap();
    assert_eq!(rt.call_method(&g, "m", &[]).unwrap(), Value::Integer(20));
}

#[test]
fn super_call_without_ancestor_member_fails() {
    let mut rt = Runtime::new();
    let lone = rt
        .declare_type(TypeSpec::new("Lone").method("solo", |rt, this, _| rt.call_super(this, &[])))
        .unwrap();
    let obj = rt.instantiate(lone, &[]).unwrap();
    let err = rt.call_method(&obj, "solo", &[]).unwrap_err();
    assert_eq!(
        err.as_dispatch(),
        Some(&DispatchError::MissingAncestorMember {
            method: "solo".to_string(),
            ancestor: "Object".to_string(),
        })
    );
}

#[test]
fn super_call_outside_a_method_fails() {
    let mut rt = Runtime::new();
    let (_, child) = parent_and_child(&mut rt);
    let c = rt.instantiate(child, &[]).unwrap();
    let err = rt.call_super(&c, &[]).unwrap_err();
    assert_eq!(err.as_dispatch(), Some(&DispatchError::NoActiveContext));
}

#[test]
fn super_call_forwards_arguments() {
    let mut rt = Runtime::new();
    let base = rt
        .declare_type(TypeSpec::new("Adder").method("add", |_, _, args| {
            let sum = args.iter().filter_map(Value::as_integer).sum::<i64>();
            Ok(Value::Integer(sum))
        }))
        .unwrap();
    let derived = rt
        .declare_type(TypeSpec::new("Doubler").extends(base).method("add", |rt, this, args| {
            let sum = rt.call_super(this, args)?;
            Ok(Value::Integer(sum.as_integer().unwrap_or(0) * 2))
        }))
        .unwrap();
    let obj = rt.instantiate(derived, &[]).unwrap();
    let args = [Value::Integer(2), Value::Integer(3)];
    assert_eq!(rt.call_method(&obj, "add", &args).unwrap(), Value::Integer(10));
}

#[test]
fn accessor_super_dispatch_uses_the_same_kind() {
    let mut rt = Runtime::new();
    let base = rt
        .declare_type(TypeSpec::new("Cell").accessor(
            "value",
            Some(Function::new(|_, _, _| Ok(Value::Integer(5)))),
            Some(Function::new(|rt, this, args| {
                rt.set(this, "stored", args[0].clone())?;
                Ok(Value::Nil)
            })),
        ))
        .unwrap();
    let derived = rt
        .declare_type(TypeSpec::new("LoggedCell").extends(base).accessor(
            "value",
            Some(Function::new(|rt, this, _| {
                assert_eq!(rt.dispatch_context(this).map(|c| c.kind), Some(CallKind::Getter));
                let v = rt.call_super(this, &[])?;
                Ok(Value::Integer(v.as_integer().unwrap_or(0) + 100))
            })),
            Some(Function::new(|rt, this, args| rt.call_super(this, args))),
        ))
        .unwrap();
    let obj = rt.instantiate(derived, &[]).unwrap();
    assert_eq!(rt.get(&obj, "value").unwrap(), Value::Integer(105));
    rt.set(&obj, "value", Value::Integer(9)).unwrap();
    assert_eq!(rt.get(&obj, "stored").unwrap(), Value::Integer(9));
}

#[test]
fn read_only_accessor_rejects_writes() {
    let mut rt = Runtime::new();
    let ty = rt
        .declare_type(TypeSpec::new("Const").accessor(
            "answer",
            Some(Function::new(|_, _, _| Ok(Value::Integer(42)))),
            None,
        ))
        .unwrap();
    let obj = rt.instantiate(ty, &[]).unwrap();
    let err = rt.set(&obj, "answer", Value::Integer(1)).unwrap_err();
    assert!(matches!(err.as_dispatch(), Some(DispatchError::ReadOnly { .. })));
    assert_eq!(rt.get(&obj, "answer").unwrap(), Value::Integer(42));
}

#[test]
fn fields_shadow_member_values() {
    let mut rt = Runtime::new();
    let ty = rt
        .declare_type(TypeSpec::new("Counter").value("count", 0))
        .unwrap();
    let obj = rt.instantiate(ty, &[]).unwrap();
    assert_eq!(rt.get(&obj, "count").unwrap(), Value::Integer(0));
    rt.set(&obj, "count", Value::Integer(3)).unwrap();
    assert_eq!(rt.get(&obj, "count").unwrap(), Value::Integer(3));

    let err = rt.call_method(&obj, "count", &[]).unwrap_err();
    assert!(matches!(err.as_dispatch(), Some(DispatchError::NotCallable { .. })));
    let err = rt.get(&obj, "missing").unwrap_err();
    assert!(matches!(err.as_dispatch(), Some(DispatchError::NoSuchMember { .. })));
}

#[test]
fn body_errors_propagate_unchanged() {
    let mut rt = Runtime::new();
    let ty = rt
        .declare_type(
            TypeSpec::new("Thrower").method("fail", |_, _, _| Err(MetaError::raised("nope"))),
        )
        .unwrap();
    let obj = rt.instantiate(ty, &[]).unwrap();
    let err = rt.call_method(&obj, "fail", &[]).unwrap_err();
    assert_eq!(err.to_string(), "nope");
}

#[test]
fn unbounded_recursion_stops_at_the_default_limit() {
    let mut rt = Runtime::new();
    let ty = rt
        .declare_type(
            TypeSpec::new("Loop").method("spin", |rt, this, _| rt.call_method(this, "spin", &[])),
        )
        .unwrap();
    let obj = rt.instantiate(ty, &[]).unwrap();
    let err = rt.call_method(&obj, "spin", &[]).unwrap_err();
    assert_eq!(
        err.as_dispatch(),
        Some(&DispatchError::CallDepthExceeded {
            limit: Config::default().max_call_depth,
        })
    );
    assert_eq!(rt.dispatch_context(&obj), None);

    // The runtime stays usable after unwinding.
    assert_eq!(
        rt.call_method(&obj, "toString", &[]).unwrap(),
        Value::from("[object Loop]")
    );
}
