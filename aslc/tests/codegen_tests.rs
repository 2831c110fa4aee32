use aslc::compile_source;
use tcode::{BinOp, Code, Instruction, IoType, UnOp, ValueType};

fn generate(source: &str) -> Code {
    let compilation = compile_source(source).expect("the frontend should accept this source");
    assert!(
        compilation.errors.is_empty(),
        "unexpected semantic errors: {:?}",
        compilation.errors
    );
    compilation.code.expect("no code was generated")
}

fn instructions(code: &Code, name: &str) -> Vec<Instruction> {
    code.get_subroutine(name)
        .unwrap_or_else(|| panic!("no subroutine '{name}'"))
        .instructions
        .iter()
        .cloned()
        .collect()
}

fn iload(dst: &str, value: &str) -> Instruction {
    Instruction::LoadInt {
        dst: dst.into(),
        value: value.into(),
    }
}

fn load(dst: &str, src: &str) -> Instruction {
    Instruction::Load {
        dst: dst.into(),
        src: src.into(),
    }
}

fn binary(op: BinOp, dst: &str, lhs: &str, rhs: &str) -> Instruction {
    Instruction::Binary {
        op,
        dst: dst.into(),
        lhs: lhs.into(),
        rhs: rhs.into(),
    }
}

fn unary(op: UnOp, dst: &str, src: &str) -> Instruction {
    Instruction::Unary {
        op,
        dst: dst.into(),
        src: src.into(),
    }
}

fn label(name: &str) -> Instruction {
    Instruction::Label(name.into())
}

fn fjump(cond: &str, target: &str) -> Instruction {
    Instruction::JumpIfFalse {
        cond: cond.into(),
        label: target.into(),
    }
}

#[test]
fn integer_addition() {
    let code = generate(
        "func main()
           var a, b, c : int
           a = 1; b = 2; c = a + b;
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            iload("%t1", "1"),
            load("a", "%t1"),
            iload("%t2", "2"),
            load("b", "%t2"),
            binary(BinOp::Add, "%t3", "a", "b"),
            load("c", "%t3"),
            Instruction::Return,
        ]
    );
}

#[test]
fn int_to_float_promotion() {
    let code = generate(
        "func main()
           var x : float
           var i : int
           x = 1; i = 2; x = x + i;
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            // x = 1 promotes the literal
            iload("%t1", "1"),
            unary(UnOp::Float, "%t2", "%t1"),
            load("x", "%t2"),
            // i = 2 does not
            iload("%t3", "2"),
            load("i", "%t3"),
            // x + i promotes i before the float add
            unary(UnOp::Float, "%t5", "i"),
            binary(BinOp::Fadd, "%t4", "x", "%t5"),
            load("x", "%t4"),
            Instruction::Return,
        ]
    );
}

#[test]
fn array_copy_is_an_element_loop() {
    let code = generate(
        "func main()
           var a, b : array[3] of int
           a = b;
         endfunc",
    );
    let main = instructions(&code, "main");
    assert_eq!(
        main,
        vec![
            iload("%t1", "0"),
            iload("%t2", "3"),
            iload("%t4", "1"),
            label("while1"),
            binary(BinOp::Lt, "%t5", "%t1", "%t2"),
            fjump("%t5", "endwhile1"),
            Instruction::LoadIndexed {
                dst: "%t3".into(),
                base: "b".into(),
                index: "%t1".into(),
            },
            Instruction::StoreIndexed {
                base: "a".into(),
                index: "%t1".into(),
                src: "%t3".into(),
            },
            binary(BinOp::Add, "%t1", "%t1", "%t4"),
            Instruction::Jump("while1".into()),
            label("endwhile1"),
            Instruction::Return,
        ]
    );
    // exactly one indexed read/write pair, loop bound is the array size
    let pairs = main
        .iter()
        .filter(|i| matches!(i, Instruction::LoadIndexed { .. }))
        .count();
    assert_eq!(pairs, 1);
    assert!(main.contains(&iload("%t2", "3")));
}

#[test]
fn locals_and_parameters_are_recorded() {
    let code = generate(
        "func f(v : array[10] of int, x : float) : int
           return v[3];
         endfunc
         func main()
           var a : array[10] of int
           var s : int
           s = f(a, 2.0);
         endfunc",
    );
    let f = code.get_subroutine("f").unwrap();
    // synthetic result slot first, then the real parameters; the array is
    // by reference with its element type
    assert_eq!(f.params.len(), 3);
    assert_eq!(f.params[0].name, "_result");
    assert_eq!(f.params[0].ty, ValueType::Int);
    assert!(!f.params[0].by_reference);
    assert_eq!(f.params[1].name, "v");
    assert_eq!(f.params[1].ty, ValueType::Int);
    assert!(f.params[1].by_reference);
    assert_eq!(f.params[2].name, "x");
    assert_eq!(f.params[2].ty, ValueType::Float);
    assert!(!f.params[2].by_reference);

    let main = code.get_subroutine("main").unwrap();
    assert_eq!(main.vars.len(), 2);
    assert_eq!(main.vars[0].name, "a");
    assert_eq!(main.vars[0].size, 10);
    assert_eq!(main.vars[0].ty, ValueType::Int);
    assert_eq!(main.vars[1].name, "s");
    assert_eq!(main.vars[1].size, 1);
}

#[test]
fn array_parameters_are_dereferenced_and_locals_passed_by_address() {
    let code = generate(
        "func f(v : array[10] of int) : int
           return v[3];
         endfunc
         func main()
           var a : array[10] of int
           var s : int
           s = f(a);
         endfunc",
    );
    // inside f the parameter is an address: load through it
    assert_eq!(
        instructions(&code, "f"),
        vec![
            load("%t1", "v"),
            iload("%t2", "3"),
            Instruction::LoadIndexed {
                dst: "%t3".into(),
                base: "%t1".into(),
                index: "%t2".into(),
            },
            load("_result", "%t3"),
            Instruction::Return,
        ]
    );
    // at the call site the local array's address is taken
    assert_eq!(
        instructions(&code, "main"),
        vec![
            Instruction::Push(None),
            Instruction::LoadAddress {
                dst: "%t1".into(),
                name: "a".into(),
            },
            Instruction::Push(Some("%t1".into())),
            Instruction::Call("f".into()),
            Instruction::Pop(None),
            Instruction::Pop(Some("%t2".into())),
            load("s", "%t2"),
            Instruction::Return,
        ]
    );
}

#[test]
fn array_parameter_forwarded_to_another_function_is_not_reloaded() {
    let code = generate(
        "func g(v : array[5] of int) endfunc
         func f(w : array[5] of int)
           g(w);
         endfunc
         func main() endfunc",
    );
    // w already holds the address, so it is dereferenced once by the
    // identifier and pushed as-is, with no ALOAD
    assert_eq!(
        instructions(&code, "f"),
        vec![
            load("%t1", "w"),
            Instruction::Push(Some("%t1".into())),
            Instruction::Call("g".into()),
            Instruction::Pop(None),
            Instruction::Return,
        ]
    );
}

#[test]
fn if_without_else() {
    let code = generate(
        "func main()
           var b : bool
           if b then write 1; endif
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            fjump("b", "endif1"),
            iload("%t1", "1"),
            Instruction::Write {
                ty: IoType::Int,
                src: "%t1".into(),
            },
            label("endif1"),
            Instruction::Return,
        ]
    );
}

#[test]
fn if_with_else() {
    let code = generate(
        "func main()
           var b : bool
           if b then write 1; else write 2; endif
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            fjump("b", "else1"),
            iload("%t1", "1"),
            Instruction::Write {
                ty: IoType::Int,
                src: "%t1".into(),
            },
            Instruction::Jump("endif1".into()),
            label("else1"),
            iload("%t2", "2"),
            Instruction::Write {
                ty: IoType::Int,
                src: "%t2".into(),
            },
            label("endif1"),
            Instruction::Return,
        ]
    );
}

#[test]
fn while_loop() {
    let code = generate(
        "func main()
           var i : int
           while i < 3 do i = i + 1; endwhile
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            label("beginwhile1"),
            iload("%t1", "3"),
            binary(BinOp::Lt, "%t2", "i", "%t1"),
            fjump("%t2", "endwhile1"),
            iload("%t3", "1"),
            binary(BinOp::Add, "%t4", "i", "%t3"),
            load("i", "%t4"),
            Instruction::Jump("beginwhile1".into()),
            label("endwhile1"),
            Instruction::Return,
        ]
    );
}

#[test]
fn nested_ifs_get_their_own_labels() {
    let code = generate(
        "func main()
           var b : bool
           if b then
             if b then write 1; endif
           endif
         endfunc",
    );
    let main = instructions(&code, "main");
    // the inner construct is lowered first and takes the first suffix
    let labels: Vec<&Instruction> = main
        .iter()
        .filter(|i| matches!(i, Instruction::Label(_)))
        .collect();
    assert_eq!(labels, vec![&label("endif1"), &label("endif2")]);
}

#[test]
fn calls_balance_the_stack() {
    let code = generate(
        "func p() endfunc
         func q() : int return 3; endfunc
         func two(a : int, b : int) : int return a; endfunc
         func main()
           var r : int
           p();
           q();
           r = two(1, 2);
         endfunc",
    );
    let main = instructions(&code, "main");
    let pushes = main
        .iter()
        .filter(|i| matches!(i, Instruction::Push(_)))
        .count();
    let pops = main
        .iter()
        .filter(|i| matches!(i, Instruction::Pop(_)))
        .count();
    assert_eq!(pushes, pops);

    // void procedure: no return slot at all
    assert_eq!(main[0], Instruction::Call("p".into()));
    // valued procedure called as a statement still reserves and discards
    // the slot
    assert_eq!(
        main[1..4],
        [
            Instruction::Push(None),
            Instruction::Call("q".into()),
            Instruction::Pop(None),
        ]
    );
}

#[test]
fn procedure_call_pushes_arguments_in_order() {
    let code = generate(
        "func two(a : int, b : int) endfunc
         func main()
           two(1, 2);
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            iload("%t1", "1"),
            Instruction::Push(Some("%t1".into())),
            iload("%t2", "2"),
            Instruction::Push(Some("%t2".into())),
            Instruction::Call("two".into()),
            Instruction::Pop(None),
            Instruction::Pop(None),
            Instruction::Return,
        ]
    );
}

#[test]
fn int_argument_promotes_to_float_parameter() {
    let code = generate(
        "func f(x : float) endfunc
         func main()
           f(1);
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            iload("%t1", "1"),
            unary(UnOp::Float, "%t2", "%t1"),
            Instruction::Push(Some("%t2".into())),
            Instruction::Call("f".into()),
            Instruction::Pop(None),
            Instruction::Return,
        ]
    );
}

#[test]
fn read_into_an_array_element() {
    let code = generate(
        "func main()
           var a : array[5] of int
           read a[2];
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            iload("%t1", "2"),
            Instruction::Read {
                ty: IoType::Int,
                dst: "%t2".into(),
            },
            Instruction::StoreIndexed {
                base: "a".into(),
                index: "%t1".into(),
                src: "%t2".into(),
            },
            Instruction::Return,
        ]
    );
}

#[test]
fn booleans_read_and_write_on_the_integer_channel() {
    let code = generate(
        "func main()
           var b : bool
           read b;
           write b;
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            Instruction::Read {
                ty: IoType::Int,
                dst: "%t1".into(),
            },
            load("b", "%t1"),
            Instruction::Write {
                ty: IoType::Int,
                src: "b".into(),
            },
            Instruction::Return,
        ]
    );
}

#[test]
fn string_and_char_writes() {
    let code = generate(
        "func main()
           write \"hi\\n\";
           write 'x';
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            Instruction::WriteString("\"hi\\n\"".into()),
            Instruction::LoadChar {
                dst: "%t1".into(),
                value: "x".into(),
            },
            Instruction::Write {
                ty: IoType::Char,
                src: "%t1".into(),
            },
            Instruction::Return,
        ]
    );
}

#[test]
fn modulo_is_expanded() {
    let code = generate(
        "func main()
           var c, a, b : int
           c = a % b;
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            binary(BinOp::Div, "%t2", "a", "b"),
            binary(BinOp::Mul, "%t3", "%t2", "b"),
            binary(BinOp::Sub, "%t1", "a", "%t3"),
            load("c", "%t1"),
            Instruction::Return,
        ]
    );
}

#[test]
fn relational_lowering() {
    let code = generate(
        "func main()
           var b : bool
           var i, j : int
           b = i > j;
           b = i != j;
           b = i <= j;
         endfunc",
    );
    let main = instructions(&code, "main");
    // > is LT with swapped operands
    assert_eq!(main[0], binary(BinOp::Lt, "%t1", "j", "i"));
    // != is EQ then NOT
    assert_eq!(main[2], binary(BinOp::Eq, "%t2", "i", "j"));
    assert_eq!(main[3], unary(UnOp::Not, "%t2", "%t2"));
    // <= maps straight to LE
    assert_eq!(main[5], binary(BinOp::Le, "%t3", "i", "j"));
}

#[test]
fn float_comparison_promotes_the_int_side() {
    let code = generate(
        "func main()
           var b : bool
           var x : float
           b = 1 < x;
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            iload("%t1", "1"),
            unary(UnOp::Float, "%t3", "%t1"),
            binary(BinOp::Flt, "%t2", "%t3", "x"),
            load("b", "%t2"),
            Instruction::Return,
        ]
    );
}

#[test]
fn unary_lowering() {
    let code = generate(
        "func main()
           var i : int
           var x : float
           var b : bool
           i = -i;
           x = -x;
           i = +i;
           b = not b;
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            unary(UnOp::Neg, "%t1", "i"),
            load("i", "%t1"),
            unary(UnOp::Fneg, "%t2", "x"),
            load("x", "%t2"),
            load("i", "i"),
            unary(UnOp::Not, "%t3", "b"),
            load("b", "%t3"),
            Instruction::Return,
        ]
    );
}

#[test]
fn swap_exchanges_through_temporaries() {
    let code = generate(
        "func main()
           var a, b : int
           swap a, b;
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            load("%t1", "a"),
            load("%t2", "b"),
            load("a", "%t2"),
            load("b", "%t1"),
            Instruction::Return,
        ]
    );
}

#[test]
fn swap_of_array_elements_uses_indexed_moves() {
    let code = generate(
        "func main()
           var v : array[3] of int
           swap v[0], v[1];
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            iload("%t1", "0"),
            iload("%t2", "1"),
            Instruction::LoadIndexed {
                dst: "%t3".into(),
                base: "v".into(),
                index: "%t1".into(),
            },
            Instruction::LoadIndexed {
                dst: "%t4".into(),
                base: "v".into(),
                index: "%t2".into(),
            },
            Instruction::StoreIndexed {
                base: "v".into(),
                index: "%t1".into(),
                src: "%t4".into(),
            },
            Instruction::StoreIndexed {
                base: "v".into(),
                index: "%t2".into(),
                src: "%t3".into(),
            },
            Instruction::Return,
        ]
    );
}

#[test]
fn switch_compares_and_exits_per_case() {
    let code = generate(
        "func main()
           var i : int
           switch i
           case 1 : write 1;
           default : write 0;
           endswitch
         endfunc",
    );
    assert_eq!(
        instructions(&code, "main"),
        vec![
            iload("%t1", "1"),
            binary(BinOp::Eq, "%t2", "i", "%t1"),
            fjump("%t2", "case2"),
            iload("%t3", "1"),
            Instruction::Write {
                ty: IoType::Int,
                src: "%t3".into(),
            },
            Instruction::Jump("endswitch1".into()),
            label("case2"),
            iload("%t4", "0"),
            Instruction::Write {
                ty: IoType::Int,
                src: "%t4".into(),
            },
            label("endswitch1"),
            Instruction::Return,
        ]
    );
}

#[test]
fn return_loads_the_result_slot() {
    let code = generate(
        "func f() : int
           return 3;
         endfunc
         func main() endfunc",
    );
    assert_eq!(
        instructions(&code, "f"),
        vec![
            iload("%t1", "3"),
            load("_result", "%t1"),
            Instruction::Return,
        ]
    );
    // void functions get the implicit trailing return
    assert_eq!(instructions(&code, "main"), vec![Instruction::Return]);
}

#[test]
fn counters_reset_per_subroutine() {
    let code = generate(
        "func f() : int return 1 + 2; endfunc
         func main()
           var i : int
           i = 3 + 4;
         endfunc",
    );
    // both subroutines start naming from %t1
    let f = instructions(&code, "f");
    let main = instructions(&code, "main");
    assert!(f.contains(&iload("%t1", "1")));
    assert!(main.contains(&iload("%t1", "3")));
}

#[test]
fn jump_targets_resolve_within_the_subroutine() {
    let code = generate(
        "func main()
           var b : bool
           var i : int
           while b do
             if b then i = 1; else i = 2; endif
           endwhile
           switch i
           case 1 : write 1;
           endswitch
         endfunc",
    );
    let main = instructions(&code, "main");
    let labels: Vec<&String> = main
        .iter()
        .filter_map(|i| match i {
            Instruction::Label(l) => Some(l),
            _ => None,
        })
        .collect();
    // every label is unique
    let mut deduped = labels.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(labels.len(), deduped.len());
    // every jump lands on an emitted label
    for instruction in &main {
        let target = match instruction {
            Instruction::Jump(target) => target,
            Instruction::JumpIfFalse { label, .. } => label,
            _ => continue,
        };
        assert!(labels.contains(&target), "dangling jump target {target}");
    }
}
