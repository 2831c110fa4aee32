use aslc::compile_source;
use aslc::semantics::ErrorKind;

fn errors(source: &str) -> Vec<ErrorKind> {
    compile_source(source)
        .expect("the frontend should accept this source")
        .errors
        .iter()
        .map(|e| e.kind.clone())
        .collect()
}

fn assert_clean(source: &str) {
    let found = errors(source);
    assert!(found.is_empty(), "unexpected errors: {found:?}");
}

#[test]
fn well_typed_program_has_no_errors() {
    assert_clean(
        "func main()
           var a, b, c : int
           a = 1; b = 2; c = a + b;
         endfunc",
    );
}

#[test]
fn undeclared_identifier_reports_once() {
    // the error type on 'x' suppresses any follow-up from the assignment
    assert_eq!(
        errors("func main() x = 1; endfunc"),
        vec![ErrorKind::UndeclaredIdent("x".into())]
    );
}

#[test]
fn condition_must_be_boolean() {
    assert_eq!(
        errors("func main() var i : int if i then endif endfunc"),
        vec![ErrorKind::BooleanRequired]
    );
    assert_eq!(
        errors("func main() var i : int while i do endwhile endfunc"),
        vec![ErrorKind::BooleanRequired]
    );
}

#[test]
fn missing_main_is_reported() {
    assert_eq!(
        errors("func foo() endfunc"),
        vec![ErrorKind::NoMainProperlyDeclared]
    );
    // a 'main' with parameters or a return type does not count
    assert_eq!(
        errors("func main(i : int) endfunc"),
        vec![ErrorKind::NoMainProperlyDeclared]
    );
    assert_eq!(
        errors("func main() : int return 1; endfunc"),
        vec![ErrorKind::NoMainProperlyDeclared]
    );
}

#[test]
fn local_redeclaration() {
    assert_eq!(
        errors(
            "func main()
               var a : int
               var a : float
             endfunc"
        ),
        vec![ErrorKind::DeclaredIdent("a".into())]
    );
}

#[test]
fn parameter_redeclaration() {
    assert_eq!(
        errors("func f(a : int, a : float) endfunc func main() endfunc"),
        vec![ErrorKind::DeclaredIdent("a".into())]
    );
}

#[test]
fn function_redeclaration() {
    assert_eq!(
        errors("func f() endfunc func f() : int return 1; endfunc func main() endfunc"),
        vec![ErrorKind::DeclaredIdent("f".into())]
    );
}

#[test]
fn assignment_allows_only_the_int_to_float_promotion() {
    assert_clean("func main() var x : float x = 1; endfunc");
    assert_eq!(
        errors("func main() var i : int i = 1.0; endfunc"),
        vec![ErrorKind::IncompatibleAssignment]
    );
    assert_eq!(
        errors("func main() var b : bool b = 1; endfunc"),
        vec![ErrorKind::IncompatibleAssignment]
    );
}

#[test]
fn equal_arrays_are_assignable_different_arrays_are_not() {
    assert_clean(
        "func main()
           var a, b : array[3] of int
           a = b;
         endfunc",
    );
    assert_eq!(
        errors(
            "func main()
               var a : array[3] of int
               var b : array[4] of int
               a = b;
             endfunc"
        ),
        vec![ErrorKind::IncompatibleAssignment]
    );
}

#[test]
fn assignment_to_a_function_name() {
    assert_eq!(
        errors("func f() : int return 1; endfunc func main() f = 1; endfunc"),
        vec![
            ErrorKind::NonReferenceableLeftExpr,
            ErrorKind::IncompatibleAssignment,
        ]
    );
}

#[test]
fn call_checks() {
    assert_eq!(
        errors("func f(x : int) endfunc func main() f(); endfunc"),
        vec![ErrorKind::NumberOfParameters("f".into())]
    );
    assert_eq!(
        errors("func f(x : int) endfunc func main() f(1, 2); endfunc"),
        vec![ErrorKind::NumberOfParameters("f".into())]
    );
    assert_eq!(
        errors("func f(x : int) endfunc func main() f(true); endfunc"),
        vec![ErrorKind::IncompatibleParameter(1, "f".into())]
    );
    // int arguments promote to float parameters
    assert_clean("func f(x : float) endfunc func main() f(1); endfunc");
    assert_eq!(
        errors("func main() var i : int i(); endfunc"),
        vec![ErrorKind::IsNotCallable("i".into())]
    );
}

#[test]
fn second_of_two_incompatible_arguments_is_also_reported() {
    assert_eq!(
        errors("func f(x : int, y : int) endfunc func main() f(true, 1.0); endfunc"),
        vec![
            ErrorKind::IncompatibleParameter(1, "f".into()),
            ErrorKind::IncompatibleParameter(2, "f".into()),
        ]
    );
}

#[test]
fn void_call_used_as_a_value() {
    assert_eq!(
        errors("func p() endfunc func main() var i : int i = p(); endfunc"),
        vec![ErrorKind::IsNotFunction("p".into())]
    );
}

#[test]
fn procedure_statement_may_be_void_or_valued() {
    assert_clean(
        "func p() endfunc
         func q() : int return 1; endfunc
         func main() p(); q(); endfunc",
    );
}

#[test]
fn indexing_a_scalar() {
    assert_eq!(
        errors("func main() var i, j : int i = j[0]; endfunc"),
        vec![ErrorKind::NonArrayInArrayAccess]
    );
}

#[test]
fn non_integer_index_still_yields_the_element_type() {
    // only the index error is reported, the access types as int
    assert_eq!(
        errors(
            "func main()
               var i : int
               var a : array[3] of int
               i = a[true];
             endfunc"
        ),
        vec![ErrorKind::NonIntegerIndexInArrayAccess]
    );
}

#[test]
fn indexed_element_is_writable() {
    assert_clean(
        "func main()
           var a : array[3] of int
           a[0] = 1;
           read a[1];
         endfunc",
    );
}

#[test]
fn return_type_compatibility() {
    assert_eq!(
        errors("func f() : int return true; endfunc func main() endfunc"),
        vec![ErrorKind::IncompatibleReturn]
    );
    assert_clean("func g() : float return 1; endfunc func main() endfunc");
    assert_eq!(
        errors("func h() return 1; endfunc func main() endfunc"),
        vec![ErrorKind::IncompatibleReturn]
    );
}

#[test]
fn read_and_write_require_basic_referenceable_operands() {
    assert_eq!(
        errors("func f() : int return 1; endfunc func main() read f; endfunc"),
        vec![ErrorKind::NonReferenceableExpression]
    );
    assert_eq!(
        errors("func main() var a : array[3] of int write a; endfunc"),
        vec![ErrorKind::ReadWriteRequireBasic]
    );
    assert_eq!(
        errors("func main() var a : array[3] of int read a; endfunc"),
        vec![ErrorKind::ReadWriteRequireBasic]
    );
}

#[test]
fn operator_operand_rules() {
    assert_eq!(
        errors("func main() var i : int i = true + 1; endfunc"),
        vec![ErrorKind::IncompatibleOperator("+".into())]
    );
    assert_eq!(
        errors("func main() var x : float x = x % 2.0; endfunc"),
        vec![ErrorKind::IncompatibleOperator("%".into())]
    );
    assert_eq!(
        errors("func main() var b : bool b = not 1; endfunc"),
        vec![ErrorKind::IncompatibleOperator("not".into())]
    );
    assert_eq!(
        errors("func main() var b : bool b = 1 and true; endfunc"),
        vec![ErrorKind::IncompatibleOperator("and".into())]
    );
    assert_eq!(
        errors("func main() var b : bool b = true < false; endfunc"),
        vec![ErrorKind::IncompatibleOperator("<".into())]
    );
    assert_eq!(
        errors("func main() var b : bool var i : int b = -b == i; endfunc"),
        vec![ErrorKind::IncompatibleOperator("-".into())]
    );
}

#[test]
fn comparisons_that_are_fine() {
    assert_clean(
        "func main()
           var b : bool
           b = 1 < 2;
           b = 1 == 1.5;
           b = 'a' == 'b';
           b = b == true;
           b = b and not b or false;
         endfunc",
    );
}

#[test]
fn arithmetic_mixes_int_and_float() {
    assert_clean(
        "func main()
           var x : float
           var i : int
           x = x * i;
           x = i / 2 + x;
           i = i % 3;
         endfunc",
    );
}

#[test]
fn swap_requires_equal_basic_types() {
    assert_clean(
        "func main()
           var a, b : int
           var v : array[3] of int
           swap a, b;
           swap v[0], v[1];
         endfunc",
    );
    assert_eq!(
        errors("func main() var i : int var x : float swap i, x; endfunc"),
        vec![ErrorKind::IncompatibleArgumentsInSwap]
    );
    assert_eq!(
        errors(
            "func main()
               var a, b : array[3] of int
               swap a, b;
             endfunc"
        ),
        vec![ErrorKind::IncompatibleArgumentsInSwap]
    );
}

#[test]
fn switch_case_values_must_be_comparable() {
    assert_clean(
        "func main()
           var i : int
           switch i
           case 1 : write 1;
           case 2 : write 2;
           default : write 0;
           endswitch
         endfunc",
    );
    assert_eq!(
        errors(
            "func main()
               var i : int
               switch i
               case true : write 1;
               endswitch
             endfunc"
        ),
        vec![ErrorKind::IncompatibleValueInSwitch]
    );
}

#[test]
fn error_positions_point_at_the_offending_token() {
    let compilation = compile_source("func main()\n  x = 1;\nendfunc").unwrap();
    let error = compilation.errors.iter().next().unwrap();
    assert_eq!((error.loc.line, error.loc.col), (2, 3));
}
