//! Golden-file tests for the module serializer
//!
//! Each test builds a module programmatically and compares the serialized
//! form byte-for-byte against the `.ll` golden committed next to the test.

use std::rc::Rc;

use lyra_ir::enums::{CastOp, IPred, Linkage, SelectionKind, UnnamedAddr};
use lyra_ir::inst::{Clause, Incoming, Inst, InstLandingPad};
use lyra_ir::{
    Alias, AttrGroupDef, Block, Case, ComdatDef, ConstExpr, Constant, FuncAttr, Function, Global,
    LocalIdent, MdAttachment, MdDef, MdField, MdNode, MdRef, Module, NamedMd, Param, Type, Value,
};

fn named(name: &str) -> Rc<LocalIdent> {
    Rc::new(LocalIdent::named(name))
}

#[test]
fn test_hello_module_matches_golden() {
    let mut module = Module::new();
    module.source_filename = Some("hello.c".to_string());

    let mut msg = Global::new(
        "msg",
        Type::array(14, Type::i8()),
        Constant::char_array(b"hello, world\n\x00".to_vec()),
    );
    msg.linkage = Some(Linkage::Private);
    msg.unnamed_addr = Some(UnnamedAddr::UnnamedAddr);
    msg.immutable = true;
    msg.align = Some(1);
    let msg_value = msg.value();
    module.add_global(msg);

    let puts = module.declare_func("puts", Type::i32(), vec![Type::ptr(Type::i8())], false);

    let mut main = Function::new("main", Type::i32(), vec![]);
    let entry = main.new_block("entry");
    let gep = entry.new_gep(
        Type::array(14, Type::i8()),
        msg_value,
        vec![
            Value::from(Constant::i64(0)),
            Value::from(Constant::i64(0)),
        ],
    );
    gep.in_bounds = true;
    let cursor = gep.result();
    entry.new_call(puts, vec![cursor.into()]);
    entry.new_ret(Some(Value::from(Constant::i32(0))));
    module.add_func(main);

    assert_eq!(module.to_string(), include_str!("goldens/hello.ll"));
}

#[test]
fn test_loop_with_phi_backedge_matches_golden() {
    let mut sum = Function::new("sum", Type::i32(), vec![Param::new("n", Type::i32())]);
    let n = sum.params[0].value();

    let mut entry = Block::new("entry");
    let mut body = Block::new("loop");
    let mut exit = Block::new("exit");
    let entry_label = entry.label();
    let body_label = body.label();
    let exit_label = exit.label();

    entry.new_br(body_label.clone());

    let zero = Value::from(Constant::i32(0));
    let i = {
        let phi = body.new_phi(vec![Incoming::new(zero.clone(), entry_label.clone())]);
        phi.ident = named("i");
        phi.result()
    };
    let acc = {
        let phi = body.new_phi(vec![Incoming::new(zero, entry_label)]);
        phi.ident = named("acc");
        phi.result()
    };
    let next = {
        let add = body.new_add(i.clone(), Value::from(Constant::i32(1)));
        add.ident = named("next");
        add.nuw = true;
        add.result()
    };
    let total = {
        let add = body.new_add(acc, i);
        add.ident = named("total");
        add.result()
    };
    let done = {
        let cmp = body.new_icmp(IPred::Eq, next.clone(), n);
        cmp.ident = named("done");
        cmp.result()
    };
    body.new_cond_br(done, exit_label, body_label.clone());

    // Close the loop: the phis take their second incoming through the
    // backedge from the body itself.
    if let Inst::Phi(phi) = &mut body.insts[0] {
        phi.incs.push(Incoming::new(next, body_label.clone()));
    }
    if let Inst::Phi(phi) = &mut body.insts[1] {
        phi.incs.push(Incoming::new(total.clone(), body_label));
    }

    exit.new_ret(Some(total));

    sum.push_block(entry);
    sum.push_block(body);
    sum.push_block(exit);

    let mut module = Module::new();
    module.add_func(sum);
    assert_eq!(module.to_string(), include_str!("goldens/loop.ll"));
}

#[test]
fn test_feature_module_matches_golden() {
    let mut module = Module::new();
    module.data_layout = Some("e-m:e-i64:64-f80:128-n8:16:32:64-S128".to_string());
    module.target_triple = Some("x86_64-unknown-linux-gnu".to_string());

    let node = module.new_named_type("struct.node");
    node.set_body(
        vec![Type::i32(), Type::ptr(Type::Struct(node.clone()))],
        false,
    );
    module.new_named_type("struct.handle");

    module.comdats.push(ComdatDef::new("group", SelectionKind::Any));

    let node_ty = Type::Struct(node.clone());
    let list = Global::new(
        "list",
        node_ty.clone(),
        Constant::named_struct(
            node,
            vec![
                Constant::i32(0),
                Constant::null(Type::ptr(node_ty.clone())),
            ],
        ),
    );
    let list_ref = list.const_ref();
    module.add_global(list);

    let mut version = Global::new(
        "version",
        Type::array(6, Type::i8()),
        Constant::char_array(b"1.0.0\x00".to_vec()),
    );
    version.linkage = Some(Linkage::Private);
    version.unnamed_addr = Some(UnnamedAddr::UnnamedAddr);
    version.immutable = true;
    version.align = Some(1);
    module.add_global(version);

    module.aliases.push(Alias::new("head", node_ty, list_ref));

    let mut classify = Function::new("classify", Type::i32(), vec![Param::new("x", Type::i32())]);
    classify.func_attrs = vec![FuncAttr::Group(0)];
    classify.comdat = Some("group".to_string());
    classify.metadata = vec![MdAttachment::new("dbg", MdRef(2))];
    let x = classify.params[0].value();

    let mut entry = Block::new("entry");
    let mut zero = Block::new("zero");
    let mut one = Block::new("one");
    let mut other = Block::new("other");

    entry.new_switch(
        x.clone(),
        other.label(),
        vec![
            Case::new(Constant::i32(0), zero.label()),
            Case::new(Constant::i32(1), one.label()),
        ],
    );
    zero.new_ret(Some(Value::from(Constant::i32(10))));
    one.new_ret(Some(Value::from(Constant::i32(20))));

    let neg = {
        let cmp = other.new_icmp(IPred::Slt, x, Value::from(Constant::i32(0)));
        cmp.ident = named("neg");
        cmp.result()
    };
    let r = {
        let select = other.new_select(
            neg,
            Value::from(Constant::i32(-1)),
            Value::from(Constant::i32(1)),
        );
        select.ident = named("r");
        select.result()
    };
    other.new_ret(Some(r));

    classify.push_block(entry);
    classify.push_block(zero);
    classify.push_block(one);
    classify.push_block(other);
    module.add_func(classify);

    module.attr_groups.push(AttrGroupDef::new(
        0,
        vec![FuncAttr::NoUnwind, FuncAttr::ReadNone],
    ));

    module
        .named_md
        .push(NamedMd::new("llvm.module.flags", vec![MdRef(0)]));
    module.named_md.push(NamedMd::new("llvm.ident", vec![MdRef(1)]));
    module.md_defs.push(MdDef::new(
        0,
        MdNode::Tuple(vec![
            MdField::Const(Constant::i32(1)),
            MdField::Str("wchar_size".to_string()),
            MdField::Const(Constant::i32(4)),
        ]),
    ));
    module.md_defs.push(MdDef::new(
        1,
        MdNode::Tuple(vec![MdField::Str("lyra".to_string())]),
    ));
    module.md_defs.push(MdDef::new(
        2,
        MdNode::Specialized {
            name: "DIFile".to_string(),
            fields: vec![
                ("filename".to_string(), "\"demo.c\"".to_string()),
                ("directory".to_string(), "\"/src\"".to_string()),
            ],
        },
    ));

    assert_eq!(module.to_string(), include_str!("goldens/features.ll"));
    assert!(module.check_types().is_ok());
}

#[test]
fn test_exception_module_matches_golden() {
    let mut module = Module::new();
    let personality_fn =
        module.declare_func("__gxx_personality_v0", Type::i32(), vec![], true);
    let may_throw = module.declare_func("may_throw", Type::Void, vec![], false);

    let personality = Constant::expr(ConstExpr::Cast {
        op: CastOp::BitCast,
        from: match &personality_fn {
            Value::Global { ident, ty } => Constant::global_ref(ident.clone(), ty.clone()),
            _ => unreachable!(),
        },
        to: Type::ptr(Type::i8()),
    });

    let mut guarded = Function::new("guarded", Type::Void, vec![]);
    guarded.personality = Some(personality);

    let mut entry = Block::new("entry");
    let mut cont = Block::new("cont");
    let mut lpad = Block::new("lpad");

    entry.new_invoke(may_throw, vec![], cont.label(), lpad.label());
    cont.new_ret(None);

    let lp_ty = Type::struct_of(vec![Type::ptr(Type::i8()), Type::i32()], false);
    let lp = {
        let pad = lpad.new_landingpad(lp_ty, vec![]);
        pad.ident = named("lp");
        pad.cleanup = true;
        pad.result()
    };
    lpad.new_resume(lp);

    guarded.push_block(entry);
    guarded.push_block(cont);
    guarded.push_block(lpad);
    module.add_func(guarded);

    assert_eq!(module.to_string(), include_str!("goldens/eh.ll"));
}

#[test]
fn test_serialization_is_deterministic() {
    let mut module = Module::new();
    let mut f = Function::new("f", Type::i32(), vec![Param::unnamed(Type::i32())]);
    let x = f.params[0].value();
    let entry = f.new_block("entry");
    let widened = entry.new_zext(x, Type::i64()).result();
    let narrowed = entry.new_trunc(widened, Type::i32()).result();
    entry.new_ret(Some(narrowed));
    module.add_func(f);

    let first = module.to_string();
    let second = module.to_string();
    assert_eq!(first, second);
    assert!(first.contains("%1 = zext i32 %0 to i64"));
    assert!(first.contains("%2 = trunc i64 %1 to i32"));
}

#[test]
fn test_landingpad_clause_forms() {
    let type_info = Global::declaration("typeinfo", Type::i8());
    let mut pad = InstLandingPad::new(
        Type::struct_of(vec![Type::ptr(Type::i8()), Type::i32()], false),
        vec![
            Clause::catch(type_info.value()),
            Clause::filter(Value::from(Constant::array(
                Type::ptr(Type::i8()),
                vec![Constant::null(Type::ptr(Type::i8()))],
            ))),
        ],
    );
    pad.ident = named("lp");
    assert_eq!(
        pad.to_string(),
        "%lp = landingpad { i8*, i32 }\n\t\tcatch i8* @typeinfo\n\t\tfilter [1 x i8*] [i8* null]"
    );
}

#[test]
fn test_blockaddress_round_trip_shape() {
    let mut module = Module::new();
    let mut f = Function::new("dispatch", Type::Void, vec![]);
    let mut entry = Block::new("entry");
    let target = Block::new("target");
    let target_label = target.label();

    let addr = Value::from(Constant::block_address(f.ident.clone(), target_label.clone()));
    entry.new_indirect_br(addr, vec![target_label]);

    let mut target = target;
    target.new_ret(None);
    f.push_block(entry);
    f.push_block(target);
    module.add_func(f);

    let printed = module.to_string();
    assert!(printed.contains("indirectbr i8* blockaddress(@dispatch, %target), [label %target]"));
}
